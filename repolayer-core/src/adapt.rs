//! Result adaptation: reshaping raw records into the declared return shape.
//!
//! The adapter runs after the dispatcher reaches its terminal state. It first
//! coerces each record's field values through the conversion registry (a
//! conversion error aborts the whole pass — partial results are never
//! returned), then reshapes the record sequence according to the method's
//! [`ReturnShape`]. The dynamic result is an [`OutcomeValue`]; typed callers
//! deserialize it into their entity type via [`OutcomeValue::into_entity`]
//! and friends.

use bson::Bson;

use crate::{
    convert::ConverterRegistry,
    entity::{Entity, EntityExt},
    error::{RepositoryError, RepositoryResult},
    metadata::EntityModel,
    signature::ReturnShape,
};

/// The adapted, shape-correct result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeValue {
    /// No value.
    Unit,
    /// Exactly one record.
    Entity(Bson),
    /// Zero or one record.
    Optional(Option<Bson>),
    /// Any number of records, in storage-manager return order.
    Collection(Vec<Bson>),
    /// A numeric count.
    Count(u64),
    /// An existence check.
    Exists(bool),
}

impl OutcomeValue {
    /// Deserializes a single-record outcome into the entity type.
    ///
    /// # Errors
    ///
    /// Fails when the outcome is not a present single record, or when
    /// deserialization fails.
    pub fn into_entity<E: Entity>(self) -> RepositoryResult<E> {
        match self {
            OutcomeValue::Entity(record) | OutcomeValue::Optional(Some(record)) => {
                E::from_bson(record)
            }
            other => Err(RepositoryError::Serialization(format!(
                "expected a single entity outcome, got {other:?}"
            ))),
        }
    }

    /// Deserializes an optional outcome into `Option<E>`.
    pub fn into_optional<E: Entity>(self) -> RepositoryResult<Option<E>> {
        match self {
            OutcomeValue::Optional(None) => Ok(None),
            OutcomeValue::Optional(Some(record)) | OutcomeValue::Entity(record) => {
                Ok(Some(E::from_bson(record)?))
            }
            other => Err(RepositoryError::Serialization(format!(
                "expected an optional outcome, got {other:?}"
            ))),
        }
    }

    /// Deserializes a collection outcome into `Vec<E>`, preserving order.
    pub fn into_entities<E: Entity>(self) -> RepositoryResult<Vec<E>> {
        match self {
            OutcomeValue::Collection(records) => records
                .into_iter()
                .map(E::from_bson)
                .collect(),
            other => Err(RepositoryError::Serialization(format!(
                "expected a collection outcome, got {other:?}"
            ))),
        }
    }

    /// Returns the count for count-shaped outcomes.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            OutcomeValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// Returns the flag for existence-shaped outcomes.
    pub fn as_exists(&self) -> Option<bool> {
        match self {
            OutcomeValue::Exists(exists) => Some(*exists),
            _ => None,
        }
    }
}

/// Reshapes raw results into the caller's declared return shape.
pub struct ResultAdapter<'a> {
    model: &'a EntityModel,
    registry: &'a ConverterRegistry,
}

impl<'a> ResultAdapter<'a> {
    /// Creates an adapter for the given entity model and converter registry.
    pub fn new(model: &'a EntityModel, registry: &'a ConverterRegistry) -> Self {
        Self { model, registry }
    }

    /// Adapts a raw record sequence from the query channel.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NoResultFound`] for an empty single shape,
    /// [`RepositoryError::NonUniqueResult`] for an over-full single/optional
    /// shape, and any field conversion error (which aborts the whole pass).
    pub fn adapt_records(
        &self,
        method: &str,
        shape: &ReturnShape,
        records: Vec<Bson>,
    ) -> RepositoryResult<OutcomeValue> {
        match shape {
            ReturnShape::Unit => Ok(OutcomeValue::Unit),
            ReturnShape::Count => Ok(OutcomeValue::Count(records.len() as u64)),
            ReturnShape::Exists => Ok(OutcomeValue::Exists(!records.is_empty())),
            ReturnShape::Collection => {
                let coerced = records
                    .into_iter()
                    .map(|record| self.coerce(record))
                    .collect::<RepositoryResult<Vec<_>>>()?;
                Ok(OutcomeValue::Collection(coerced))
            }
            ReturnShape::Single => match records.len() {
                1 => {
                    let record = records
                        .into_iter()
                        .next()
                        .map(|record| self.coerce(record))
                        .transpose()?;
                    Ok(OutcomeValue::Entity(record.unwrap_or(Bson::Null)))
                }
                0 => Err(RepositoryError::NoResultFound(method.to_string())),
                count => Err(RepositoryError::NonUniqueResult(method.to_string(), count)),
            },
            ReturnShape::Optional => match records.len() {
                0 => Ok(OutcomeValue::Optional(None)),
                1 => {
                    let record = records
                        .into_iter()
                        .next()
                        .map(|record| self.coerce(record))
                        .transpose()?;
                    Ok(OutcomeValue::Optional(record))
                }
                count => Err(RepositoryError::NonUniqueResult(method.to_string(), count)),
            },
        }
    }

    /// Adapts an affected-row count from the update channel.
    ///
    /// Update operations produce no records, so entity-bearing shapes
    /// collapse to [`OutcomeValue::Unit`].
    pub fn adapt_affected(&self, shape: &ReturnShape, affected: u64) -> OutcomeValue {
        match shape {
            ReturnShape::Count => OutcomeValue::Count(affected),
            ReturnShape::Exists => OutcomeValue::Exists(affected > 0),
            _ => OutcomeValue::Unit,
        }
    }

    /// Coerces every declared field of a record through the registry.
    ///
    /// Fields without a matching converter pass through unchanged; fields the
    /// entity model does not declare are left untouched.
    fn coerce(&self, record: Bson) -> RepositoryResult<Bson> {
        let Bson::Document(mut document) = record else {
            return Ok(record);
        };

        for (field, kind) in self.model.properties() {
            let Some(raw) = document.get(field) else {
                continue;
            };

            if let Some(converted) = self.registry.convert(raw, kind)? {
                document.insert(field.to_string(), converted);
            }
        }

        Ok(Bson::Document(document))
    }
}
