//! Entity metadata consulted by classification and query derivation.
//!
//! An [`EntityModel`] describes the shape of an entity as the storage layer
//! sees it: the collection name, the identifier field, and the declared kind
//! of every queryable property. Query derivation validates each parsed
//! property segment against this model, and the result adapter uses the
//! declared kinds to drive field-level value conversion.
//!
//! The model is typically produced once by an external metadata provider
//! (hand-written or generated at build time) and handed to the
//! [`RepositoryInvoker`](crate::dispatch::RepositoryInvoker) at construction.

use std::collections::HashMap;

use crate::error::{RepositoryError, RepositoryResult};

/// The declared kind of a queryable entity property.
///
/// Conversion targets are expressed in these terms rather than Rust types so
/// the registry stays independent of any concrete entity struct.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// Boolean property.
    Bool,
    /// 32-bit integer property.
    Int32,
    /// 64-bit integer property.
    Int64,
    /// Double-precision floating point property.
    Double,
    /// UTF-8 string property.
    Str,
    /// UUID property.
    Uuid,
    /// Timestamp property.
    DateTime,
    /// Enumerated property with the declared constant names, in declaration order.
    Enum(Vec<String>),
}

/// Metadata describing one entity type.
///
/// # Example
///
/// ```ignore
/// use repolayer::metadata::{EntityModel, PropertyKind};
///
/// let model = EntityModel::builder("users")
///     .with_id_field("id")
///     .with_property("name", PropertyKind::Str)
///     .with_property("active", PropertyKind::Bool)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct EntityModel {
    name: String,
    id_field: String,
    properties: HashMap<String, PropertyKind>,
}

impl EntityModel {
    /// Creates a builder for the entity with the given collection name.
    pub fn builder(name: impl Into<String>) -> EntityModelBuilder {
        EntityModelBuilder {
            name: name.into(),
            id_field: None,
            properties: HashMap::new(),
        }
    }

    /// Returns the collection name of this entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the identifier field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Looks up the declared kind of a property, if it is known.
    pub fn property(&self, field: &str) -> Option<&PropertyKind> {
        self.properties.get(field)
    }

    /// Looks up a property, failing with [`RepositoryError::UnknownProperty`]
    /// if the field is not declared on this entity.
    pub fn require_property(&self, field: &str) -> RepositoryResult<&PropertyKind> {
        self.properties
            .get(field)
            .ok_or_else(|| {
                RepositoryError::UnknownProperty(field.to_string(), self.name.clone())
            })
    }

    /// Iterates over all declared properties and their kinds.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyKind)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Builder for constructing [`EntityModel`] instances.
#[derive(Debug)]
pub struct EntityModelBuilder {
    name: String,
    id_field: Option<String>,
    properties: HashMap<String, PropertyKind>,
}

impl EntityModelBuilder {
    /// Sets the identifier field name. Defaults to `"id"` when not set.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Declares a queryable property and its kind.
    pub fn with_property(mut self, field: impl Into<String>, kind: PropertyKind) -> Self {
        self.properties.insert(field.into(), kind);
        self
    }

    /// Builds the final model.
    ///
    /// The identifier field is always registered as a queryable property,
    /// defaulting to [`PropertyKind::Uuid`] when not declared explicitly.
    pub fn build(self) -> EntityModel {
        let id_field = self.id_field.unwrap_or_else(|| "id".to_string());
        let mut properties = self.properties;
        properties
            .entry(id_field.clone())
            .or_insert(PropertyKind::Uuid);

        EntityModel {
            name: self.name,
            id_field,
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_model_with_implicit_id_property() {
        let model = EntityModel::builder("users")
            .with_property("name", PropertyKind::Str)
            .build();

        assert_eq!(model.name(), "users");
        assert_eq!(model.id_field(), "id");
        assert_eq!(model.property("id"), Some(&PropertyKind::Uuid));
        assert_eq!(model.property("name"), Some(&PropertyKind::Str));
    }

    #[test]
    fn require_property_reports_unknown_fields() {
        let model = EntityModel::builder("users").build();

        let err = model
            .require_property("nickname")
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownProperty(field, entity)
            if field == "nickname" && entity == "users"));
    }
}
