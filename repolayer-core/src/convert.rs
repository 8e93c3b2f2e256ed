//! Value conversion between storage-native representations and declared
//! property kinds.
//!
//! Storage managers return loosely typed BSON values; the declared entity
//! properties are stricter. The [`ConverterRegistry`] holds an ordered list
//! of [`ValueConverter`] entries; for each field value the first entry whose
//! predicate accepts the target kind performs the conversion. A value whose
//! target kind no entry accepts passes through unchanged — whether that is
//! acceptable is the result adapter's decision, not the registry's.
//!
//! The registry is process-wide: populate it once at startup via
//! [`ConverterRegistry::install`] (or rely on the default set), after which
//! reads are lock-free and safe for unsynchronized concurrent use.
//!
//! # Narrowing policy
//!
//! Numeric narrowing is strict: a conversion that would drop a non-zero
//! fractional remainder or overflow the target fails with
//! [`RepositoryError::LossyConversion`] rather than rounding.

use std::sync::OnceLock;

use bson::Bson;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{RepositoryError, RepositoryResult},
    metadata::PropertyKind,
};

/// A bidirectional-capable converter entry: a target-kind predicate plus a
/// conversion function.
pub trait ValueConverter: Send + Sync {
    /// Whether this entry handles the given target kind.
    fn can_convert(&self, target: &PropertyKind) -> bool;

    /// Converts a raw stored value into the target kind's canonical BSON
    /// representation.
    ///
    /// # Errors
    ///
    /// Conversion failures are reported per value; see the crate's narrowing
    /// and enumerant policies.
    fn convert(&self, raw: &Bson, target: &PropertyKind) -> RepositoryResult<Bson>;
}

/// Converter for the numeric property kinds.
///
/// Widening and narrowing both use exact-value semantics, and stored strings
/// are parsed as numeric literals (so `"10"` converts to `10`, while `"ten"`
/// fails with [`RepositoryError::MalformedNumericLiteral`]).
pub struct NumericConverter;

impl NumericConverter {
    fn to_i64(raw: &Bson) -> RepositoryResult<Option<i64>> {
        match raw {
            Bson::Int32(v) => Ok(Some(*v as i64)),
            Bson::Int64(v) => Ok(Some(*v)),
            Bson::Double(v) => exact_integral(*v).map(Some),
            Bson::String(text) => parse_integral(text).map(Some),
            _ => Ok(None),
        }
    }

    fn to_f64(raw: &Bson) -> RepositoryResult<Option<f64>> {
        match raw {
            Bson::Int32(v) => Ok(Some(*v as f64)),
            Bson::Int64(v) => {
                let wide = *v as f64;
                if wide as i64 != *v {
                    return Err(RepositoryError::LossyConversion(
                        v.to_string(),
                        "Double".to_string(),
                    ));
                }
                Ok(Some(wide))
            }
            Bson::Double(v) => Ok(Some(*v)),
            Bson::String(text) => text
                .parse::<f64>()
                .map(Some)
                .map_err(|_| RepositoryError::MalformedNumericLiteral(text.clone())),
            _ => Ok(None),
        }
    }
}

impl ValueConverter for NumericConverter {
    fn can_convert(&self, target: &PropertyKind) -> bool {
        matches!(
            target,
            PropertyKind::Int32 | PropertyKind::Int64 | PropertyKind::Double
        )
    }

    fn convert(&self, raw: &Bson, target: &PropertyKind) -> RepositoryResult<Bson> {
        match target {
            PropertyKind::Int64 => match Self::to_i64(raw)? {
                Some(value) => Ok(Bson::Int64(value)),
                None => Ok(raw.clone()),
            },
            PropertyKind::Int32 => match Self::to_i64(raw)? {
                Some(value) => {
                    let narrowed = i32::try_from(value).map_err(|_| {
                        RepositoryError::LossyConversion(
                            value.to_string(),
                            "Int32".to_string(),
                        )
                    })?;
                    Ok(Bson::Int32(narrowed))
                }
                None => Ok(raw.clone()),
            },
            PropertyKind::Double => match Self::to_f64(raw)? {
                Some(value) => Ok(Bson::Double(value)),
                None => Ok(raw.clone()),
            },
            _ => Ok(raw.clone()),
        }
    }
}

/// Converter for enumerated property kinds.
///
/// Stored names map to declared enumerants by exact, case-sensitive
/// comparison; anything else fails with
/// [`RepositoryError::UnknownEnumerant`]. The canonical stored form is the
/// enumerant name itself, so a successful conversion is value-preserving.
pub struct EnumerantConverter;

impl ValueConverter for EnumerantConverter {
    fn can_convert(&self, target: &PropertyKind) -> bool {
        matches!(target, PropertyKind::Enum(_))
    }

    fn convert(&self, raw: &Bson, target: &PropertyKind) -> RepositoryResult<Bson> {
        let PropertyKind::Enum(constants) = target else {
            return Ok(raw.clone());
        };

        let name = match raw {
            Bson::String(name) => name.clone(),
            other => other.to_string(),
        };

        if constants.iter().any(|constant| constant == &name) {
            Ok(Bson::String(name))
        } else {
            Err(RepositoryError::UnknownEnumerant(
                name,
                constants.join(", "),
            ))
        }
    }
}

fn exact_integral(value: f64) -> RepositoryResult<i64> {
    if value.fract() != 0.0 {
        return Err(RepositoryError::LossyConversion(
            value.to_string(),
            "integral".to_string(),
        ));
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(RepositoryError::LossyConversion(
            value.to_string(),
            "integral".to_string(),
        ));
    }
    Ok(value as i64)
}

fn parse_integral(text: &str) -> RepositoryResult<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    let wide = text
        .parse::<f64>()
        .map_err(|_| RepositoryError::MalformedNumericLiteral(text.to_string()))?;
    exact_integral(wide)
}

/// Writes an enumerated value to its stored name string.
///
/// This is the symmetric write direction of [`EnumerantConverter`]: the
/// stored representation of an enumerant is its declared name, obtained from
/// the value's serde serialization.
///
/// # Errors
///
/// Fails with a serialization error when the value does not serialize to a
/// plain name string (e.g. an enum variant carrying data).
pub fn write_enumerant<T: Serialize>(value: &T) -> RepositoryResult<String> {
    match serde_json::to_value(value)? {
        Value::String(name) => Ok(name),
        other => Err(RepositoryError::Serialization(format!(
            "enumerant did not serialize to a name string: {other}"
        ))),
    }
}

/// An ordered, append-until-installed set of value converters.
///
/// Entries are consulted in registration order; the first entry whose
/// predicate matches the target kind wins.
pub struct ConverterRegistry {
    entries: Vec<Box<dyn ValueConverter>>,
}

static GLOBAL: OnceLock<ConverterRegistry> = OnceLock::new();

impl ConverterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Creates a registry populated with the built-in converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NumericConverter));
        registry.register(Box::new(EnumerantConverter));
        registry
    }

    /// Appends a converter entry. Earlier entries take priority.
    pub fn register(&mut self, converter: Box<dyn ValueConverter>) {
        self.entries.push(converter);
    }

    /// Whether any registered entry handles the target kind.
    pub fn can_convert(&self, target: &PropertyKind) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.can_convert(target))
    }

    /// Converts a raw value for the target kind through the first matching
    /// entry.
    ///
    /// Returns `Ok(None)` when no entry matches — an unconverted passthrough,
    /// which is not an error at the registry level.
    pub fn convert(&self, raw: &Bson, target: &PropertyKind) -> RepositoryResult<Option<Bson>> {
        for entry in &self.entries {
            if entry.can_convert(target) {
                return entry.convert(raw, target).map(Some);
            }
        }

        Ok(None)
    }

    /// Installs this registry as the process-wide instance.
    ///
    /// Must happen before the first dispatch that consults the registry;
    /// returns `false` when a registry was already installed (the earlier
    /// instance stays in effect, per the init-once contract).
    pub fn install(self) -> bool {
        GLOBAL.set(self).is_ok()
    }

    /// Returns the process-wide registry, installing the default set on first
    /// use when none was installed explicitly.
    pub fn global() -> &'static ConverterRegistry {
        GLOBAL.get_or_init(ConverterRegistry::with_defaults)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Status {
        A,
        B,
        C,
    }

    fn status_kind() -> PropertyKind {
        PropertyKind::Enum(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    }

    #[test]
    fn numeric_converter_compatibility() {
        let converter = NumericConverter;
        assert!(converter.can_convert(&PropertyKind::Int32));
        assert!(converter.can_convert(&PropertyKind::Int64));
        assert!(converter.can_convert(&PropertyKind::Double));
        assert!(!converter.can_convert(&PropertyKind::Bool));
        assert!(!converter.can_convert(&status_kind()));
    }

    #[test]
    fn exact_narrowing_succeeds_on_whole_values() {
        let converter = NumericConverter;
        assert_eq!(
            converter
                .convert(&Bson::Double(10.0), &PropertyKind::Int64)
                .unwrap(),
            Bson::Int64(10)
        );
        assert_eq!(
            converter
                .convert(&Bson::String("10".to_string()), &PropertyKind::Int64)
                .unwrap(),
            Bson::Int64(10)
        );
        assert_eq!(
            converter
                .convert(&Bson::Int32(10), &PropertyKind::Double)
                .unwrap(),
            Bson::Double(10.0)
        );
    }

    #[test]
    fn fractional_narrowing_is_lossy() {
        let converter = NumericConverter;
        let err = converter
            .convert(&Bson::Double(10.5), &PropertyKind::Int64)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::LossyConversion(..)));
    }

    #[test]
    fn out_of_range_narrowing_is_lossy() {
        let converter = NumericConverter;
        let err = converter
            .convert(&Bson::Int64(i64::from(i32::MAX) + 1), &PropertyKind::Int32)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::LossyConversion(..)));
    }

    #[test]
    fn non_numeric_text_is_malformed() {
        let converter = NumericConverter;
        let err = converter
            .convert(&Bson::String("ten".to_string()), &PropertyKind::Int64)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::MalformedNumericLiteral(text)
            if text == "ten"));
    }

    #[test]
    fn enumerant_matches_by_exact_name() {
        let converter = EnumerantConverter;
        assert_eq!(
            converter
                .convert(&Bson::String("B".to_string()), &status_kind())
                .unwrap(),
            Bson::String("B".to_string())
        );

        let err = converter
            .convert(&Bson::String("UNKNOWN_X".to_string()), &status_kind())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownEnumerant(name, _)
            if name == "UNKNOWN_X"));

        // Case matters.
        let err = converter
            .convert(&Bson::String("b".to_string()), &status_kind())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownEnumerant(..)));
    }

    #[test]
    fn enumerant_round_trips_through_writer() {
        let written = write_enumerant(&Status::C).unwrap();
        assert_eq!(written, "C");

        let registry = ConverterRegistry::with_defaults();
        let stored = registry
            .convert(&Bson::String(written.clone()), &status_kind())
            .unwrap()
            .unwrap();
        assert_eq!(stored, Bson::String(written));
    }

    #[test]
    fn numeric_round_trip_preserves_value() {
        let registry = ConverterRegistry::with_defaults();
        let widened = registry
            .convert(&Bson::Int64(10), &PropertyKind::Double)
            .unwrap()
            .unwrap();
        let narrowed = registry
            .convert(&widened, &PropertyKind::Int64)
            .unwrap()
            .unwrap();
        assert_eq!(narrowed, Bson::Int64(10));
    }

    #[test]
    fn unmatched_target_is_a_passthrough() {
        let registry = ConverterRegistry::with_defaults();
        assert!(!registry.can_convert(&PropertyKind::Bool));
        assert_eq!(
            registry
                .convert(&Bson::from(true), &PropertyKind::Bool)
                .unwrap(),
            None
        );
    }

    #[test]
    fn registration_order_decides_priority() {
        struct Pinning;

        impl ValueConverter for Pinning {
            fn can_convert(&self, target: &PropertyKind) -> bool {
                matches!(target, PropertyKind::Int64)
            }

            fn convert(&self, _raw: &Bson, _target: &PropertyKind) -> RepositoryResult<Bson> {
                Ok(Bson::Int64(0))
            }
        }

        let mut registry = ConverterRegistry::new();
        registry.register(Box::new(Pinning));
        registry.register(Box::new(NumericConverter));

        assert_eq!(
            registry
                .convert(&Bson::Int64(99), &PropertyKind::Int64)
                .unwrap(),
            Some(Bson::Int64(0))
        );
    }
}
