//! Core traits for entity representation and serialization.
//!
//! This module provides the trait that caller-declared entity types must
//! implement, plus utilities for converting entities between storage formats
//! (BSON, JSON). The invocation engine itself works on raw BSON records; this
//! trait is the seam where adapted results become the caller's declared types.

use bson::{Bson, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::RepositoryResult;

/// Trait implemented by every entity type a repository interface works with.
///
/// An entity must carry a unique identifier and name the collection it belongs to.
///
/// # Example
///
/// ```ignore
/// use repolayer::entity::Entity;
/// use bson::Uuid;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: Uuid,
///     pub name: String,
///     pub active: bool,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> &Uuid {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns a reference to this entity's unique identifier.
    fn id(&self) -> &Uuid;

    /// Returns the name of the collection this entity belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users", "orders").
    fn collection_name() -> &'static str;
}

/// Extension trait providing serialization/deserialization utilities for entities.
///
/// This trait is automatically implemented for all types that implement [`Entity`].
pub trait EntityExt: Entity {
    /// Converts this entity to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_bson(&self) -> RepositoryResult<Bson>;

    /// Creates an entity from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> RepositoryResult<Self>;

    /// Converts this entity to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> RepositoryResult<Value>;

    /// Creates an entity from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> RepositoryResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_bson(&self) -> RepositoryResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> RepositoryResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> RepositoryResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> RepositoryResult<Self> {
        Ok(from_value(value)?)
    }
}
