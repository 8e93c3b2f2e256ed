//! Method classification: deciding which execution strategy a method takes.
//!
//! Given a [`MethodSignature`], the classifier returns one of three
//! [`MethodKind`] variants:
//!
//! - [`MethodKind::DirectQuery`] when the method carries a literal query
//! - [`MethodKind::DerivedQuery`] when the method name follows a recognized
//!   derivation convention (`find_by_…`, `count_by_…`, `exists_by_…`,
//!   `delete_by_…`)
//! - [`MethodKind::DefaultMethod`] for the built-in repository operations
//!   with fixed semantics (`save`, `find_by_id`, `find_all`, …)
//!
//! Classification is lazy (performed at call time, not registration time),
//! idempotent, and cached per method name: a method's shape never changes
//! between calls. Derived property segments are validated against the
//! [`EntityModel`] during classification, so an unknown property fails here
//! rather than at dispatch.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use crate::{
    error::{RepositoryError, RepositoryResult},
    metadata::EntityModel,
    query::FieldOp,
    signature::MethodSignature,
};

/// Comparison operators a derived-query segment can encode.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl ComparisonOp {
    /// Maps this comparison to its filter-expression operator.
    pub fn field_op(&self) -> FieldOp {
        match self {
            ComparisonOp::Eq => FieldOp::Eq,
            ComparisonOp::Ne => FieldOp::Ne,
            ComparisonOp::Gt => FieldOp::Gt,
            ComparisonOp::Gte => FieldOp::Gte,
            ComparisonOp::Lt => FieldOp::Lt,
            ComparisonOp::Lte => FieldOp::Lte,
            ComparisonOp::Contains => FieldOp::Contains,
            ComparisonOp::StartsWith => FieldOp::StartsWith,
            ComparisonOp::EndsWith => FieldOp::EndsWith,
            ComparisonOp::In => FieldOp::In,
        }
    }
}

/// One parsed property comparison from a derived method name.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The target property name.
    pub property: String,
    /// The comparison operator the name segment encodes.
    pub op: ComparisonOp,
}

/// The operation family a derived method name encodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedAction {
    Find,
    Count,
    Exists,
    Delete,
}

/// The built-in repository methods with fixed, non-derived semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultMethod {
    /// Persist one entity, keyed by its identifier field.
    Save,
    /// Look up one entity by identifier.
    FindById,
    /// Return every entity in the collection.
    FindAll,
    /// Delete one entity by identifier.
    DeleteById,
    /// Count every entity in the collection.
    Count,
    /// Check whether an entity with the given identifier exists.
    ExistsById,
}

impl DefaultMethod {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "save" => Some(DefaultMethod::Save),
            "find_by_id" => Some(DefaultMethod::FindById),
            "find_all" => Some(DefaultMethod::FindAll),
            "delete_by_id" => Some(DefaultMethod::DeleteById),
            "count" => Some(DefaultMethod::Count),
            "exists_by_id" => Some(DefaultMethod::ExistsById),
            _ => None,
        }
    }
}

/// The classified execution strategy for one repository method.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodKind {
    /// The method carries an attached literal query, taken verbatim.
    DirectQuery {
        /// The literal query string.
        query: String,
    },
    /// The method name encodes an operation and property comparisons.
    DerivedQuery {
        /// The operation family.
        action: DerivedAction,
        /// The parsed conditions, in name order.
        conditions: Vec<Condition>,
    },
    /// A built-in repository method.
    DefaultMethod(DefaultMethod),
}

// Operator suffixes, longest first so "_gte" wins over "_gt".
const OP_SUFFIXES: &[(&str, ComparisonOp)] = &[
    ("_starts_with", ComparisonOp::StartsWith),
    ("_ends_with", ComparisonOp::EndsWith),
    ("_contains", ComparisonOp::Contains),
    ("_gte", ComparisonOp::Gte),
    ("_lte", ComparisonOp::Lte),
    ("_gt", ComparisonOp::Gt),
    ("_lt", ComparisonOp::Lt),
    ("_ne", ComparisonOp::Ne),
    ("_in", ComparisonOp::In),
];

const ACTION_PREFIXES: &[(&str, DerivedAction)] = &[
    ("find_by_", DerivedAction::Find),
    ("count_by_", DerivedAction::Count),
    ("exists_by_", DerivedAction::Exists),
    ("delete_by_", DerivedAction::Delete),
];

/// Classifies repository methods against one entity model.
///
/// The classifier is read-mostly: the cache fills on first use of each method
/// and is safe for unsynchronized concurrent reads thereafter. Only
/// successful classifications are cached; failures re-raise on every call.
#[derive(Debug)]
pub struct MethodClassifier {
    model: EntityModel,
    cache: RwLock<HashMap<String, MethodKind>>,
}

impl MethodClassifier {
    /// Creates a classifier for the given entity model.
    pub fn new(model: EntityModel) -> Self {
        Self { model, cache: RwLock::new(HashMap::new()) }
    }

    /// Classifies a method signature, consulting the per-method cache first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnsupportedMethodKind`] when the method
    /// matches no strategy, or [`RepositoryError::UnknownProperty`] when a
    /// derived segment names a property the entity model does not declare.
    pub fn classify(&self, signature: &MethodSignature) -> RepositoryResult<MethodKind> {
        if let Some(kind) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(signature.name())
        {
            return Ok(kind.clone());
        }

        let kind = self.classify_uncached(signature)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature.name().to_string(), kind.clone());

        Ok(kind)
    }

    fn classify_uncached(&self, signature: &MethodSignature) -> RepositoryResult<MethodKind> {
        if let Some(query) = signature.literal_query() {
            return Ok(MethodKind::DirectQuery { query: query.to_string() });
        }

        // Defaults take precedence: "find_by_id" is fixed semantics on the
        // identifier field, not a name-derived query.
        if let Some(default) = DefaultMethod::from_name(signature.name()) {
            return Ok(MethodKind::DefaultMethod(default));
        }

        for (prefix, action) in ACTION_PREFIXES {
            if let Some(rest) = signature.name().strip_prefix(prefix) {
                let conditions = self.parse_conditions(rest)?;
                return Ok(MethodKind::DerivedQuery { action: *action, conditions });
            }
        }

        Err(RepositoryError::UnsupportedMethodKind(
            signature.name().to_string(),
        ))
    }

    fn parse_conditions(&self, encoded: &str) -> RepositoryResult<Vec<Condition>> {
        let mut conditions = Vec::new();

        for segment in encoded.split("_and_") {
            let (property, op) = split_operator(segment);
            self.model.require_property(property)?;
            conditions.push(Condition { property: property.to_string(), op });
        }

        Ok(conditions)
    }
}

fn split_operator(segment: &str) -> (&str, ComparisonOp) {
    for (suffix, op) in OP_SUFFIXES {
        if let Some(property) = segment.strip_suffix(suffix) {
            if !property.is_empty() {
                return (property, op.clone());
            }
        }
    }

    (segment, ComparisonOp::Eq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::PropertyKind,
        signature::{ParamSpec, ReturnShape},
    };

    fn user_model() -> EntityModel {
        EntityModel::builder("users")
            .with_property("name", PropertyKind::Str)
            .with_property("active", PropertyKind::Bool)
            .with_property("age", PropertyKind::Int64)
            .build()
    }

    fn signature(name: &str) -> MethodSignature {
        MethodSignature::builder(name)
            .with_return_shape(ReturnShape::Collection)
            .build()
    }

    #[test]
    fn literal_query_classifies_as_direct() {
        let classifier = MethodClassifier::new(user_model());
        let sig = MethodSignature::builder("custom")
            .with_param(ParamSpec::value("name"))
            .with_literal_query("select * from users where name = @name")
            .build();

        let kind = classifier.classify(&sig).unwrap();
        assert!(matches!(kind, MethodKind::DirectQuery { .. }));
    }

    #[test]
    fn derived_name_parses_properties_and_operators() {
        let classifier = MethodClassifier::new(user_model());
        let kind = classifier
            .classify(&signature("find_by_name_and_age_gte"))
            .unwrap();

        match kind {
            MethodKind::DerivedQuery { action, conditions } => {
                assert_eq!(action, DerivedAction::Find);
                assert_eq!(
                    conditions,
                    vec![
                        Condition { property: "name".to_string(), op: ComparisonOp::Eq },
                        Condition { property: "age".to_string(), op: ComparisonOp::Gte },
                    ]
                );
            }
            other => panic!("expected derived query, got {other:?}"),
        }
    }

    #[test]
    fn default_names_win_over_derivation() {
        let classifier = MethodClassifier::new(user_model());
        let kind = classifier.classify(&signature("find_by_id")).unwrap();
        assert_eq!(kind, MethodKind::DefaultMethod(DefaultMethod::FindById));
    }

    #[test]
    fn unknown_property_segment_is_rejected() {
        let classifier = MethodClassifier::new(user_model());
        let err = classifier
            .classify(&signature("find_by_nickname"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownProperty(..)));
    }

    #[test]
    fn unrecognized_name_is_unsupported() {
        let classifier = MethodClassifier::new(user_model());
        let err = classifier
            .classify(&signature("frobnicate"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnsupportedMethodKind(..)));
    }

    #[test]
    fn classification_is_idempotent_and_cached() {
        let classifier = MethodClassifier::new(user_model());
        let sig = signature("count_by_active");

        let first = classifier.classify(&sig).unwrap();
        let second = classifier.classify(&sig).unwrap();
        assert_eq!(first, second);
        assert!(
            classifier
                .cache
                .read()
                .unwrap()
                .contains_key("count_by_active")
        );
    }
}
