//! Error types and result types for repository invocation.
//!
//! This module provides error handling for every stage of the invocation
//! pipeline: classification, query derivation, dispatch, value conversion,
//! and result adaptation. Use [`RepositoryResult<T>`] as the return type for
//! fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while invoking a repository method.
///
/// Classification and derivation errors represent caller programming errors and
/// always surface synchronously, even for callback-shaped methods. Backend errors
/// propagate unchanged from the storage manager.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The method name matches no derivation convention, carries no literal query,
    /// and is not a recognized default repository method.
    #[error("Unsupported method kind: {0}")]
    UnsupportedMethodKind(String),
    /// A literal query placeholder has no same-named parameter among the
    /// method's declared parameters.
    #[error("No parameter bound for query placeholder @{0}")]
    MissingParameterBinding(String),
    /// A derived query encodes a different number of conditions than the
    /// method supplies bindable arguments.
    /// Arguments are the method name, the expected count, and the actual count.
    #[error("Method {0} encodes {1} conditions but received {2} bindable arguments")]
    ParameterArityMismatch(String, usize, usize),
    /// A derived-query segment does not match a known property of the entity.
    /// The first argument is the property name, the second is the entity name.
    #[error("Unknown property {0} on entity {1}")]
    UnknownProperty(String, String),
    /// A narrowing numeric conversion would truncate the stored value.
    #[error("Lossy conversion of {0} to {1}")]
    LossyConversion(String, String),
    /// A stored string could not be parsed as a numeric value.
    #[error("Malformed numeric literal: {0}")]
    MalformedNumericLiteral(String),
    /// A stored name does not match any declared enumerant (exact,
    /// case-sensitive comparison).
    #[error("Unknown enumerant {0}, expected one of {1}")]
    UnknownEnumerant(String, String),
    /// A single, non-optional return shape received zero records.
    #[error("No result found for method {0}")]
    NoResultFound(String),
    /// A single or optional return shape received more than one record.
    /// The second argument is the number of records returned.
    #[error("Non-unique result for method {0}: {1} records")]
    NonUniqueResult(String, usize),
    /// An entity document is structurally unusable (for example, it is not a
    /// document at all or lacks its identifier field).
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),
    /// An error reported by the underlying storage manager.
    #[error("Backend error: {0}")]
    Backend(String),
    /// Serialization/deserialization error when converting between entity
    /// representations (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for repository invocation.
///
/// This type alias is used throughout the crate to indicate operations that may
/// fail with a [`RepositoryError`].
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<BsonError> for RepositoryError {
    fn from(err: BsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for RepositoryError {
    fn from(err: SerdeJsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
