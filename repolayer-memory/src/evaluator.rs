//! Filter expression evaluation against in-memory BSON records.

use bson::{Binary, Bson, datetime::DateTime};
use std::cmp::Ordering;

use repolayer_core::{
    error::{RepositoryError, RepositoryResult},
    query::{Expr, FieldOp, QueryVisitor},
};

/// Comparable view of a BSON value.
///
/// Numeric variants are normalized to f64 so comparisons work across the
/// integer and floating point BSON types.
#[derive(Debug)]
pub(crate) enum CompareValue<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Binary(&'a Binary),
    Array(Vec<CompareValue<'a>>),
}

impl<'a> From<&'a Bson> for CompareValue<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => CompareValue::Bool(*value),
            Bson::Int32(value) => CompareValue::Number(*value as f64),
            Bson::Int64(value) => CompareValue::Number(*value as f64),
            Bson::Double(value) => CompareValue::Number(*value),
            Bson::DateTime(value) => CompareValue::DateTime(*value),
            Bson::String(value) => CompareValue::String(value),
            // Covers UUID identifiers, which BSON stores as binary.
            Bson::Binary(value) => CompareValue::Binary(value),
            Bson::Array(values) => CompareValue::Array(
                values
                    .iter()
                    .map(CompareValue::from)
                    .collect(),
            ),
            // Remaining types (including nested documents) do not take part
            // in comparisons.
            _ => CompareValue::Null,
        }
    }
}

impl PartialEq for CompareValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CompareValue::Null, CompareValue::Null) => true,
            (CompareValue::Bool(a), CompareValue::Bool(b)) => a == b,
            (CompareValue::Number(a), CompareValue::Number(b)) => a == b,
            (CompareValue::DateTime(a), CompareValue::DateTime(b)) => a == b,
            (CompareValue::String(a), CompareValue::String(b)) => a == b,
            (CompareValue::Binary(a), CompareValue::Binary(b)) => a == b,
            (CompareValue::Array(a), CompareValue::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for CompareValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (CompareValue::Bool(a), CompareValue::Bool(b)) => a.partial_cmp(b),
            (CompareValue::Number(a), CompareValue::Number(b)) => a.partial_cmp(b),
            (CompareValue::DateTime(a), CompareValue::DateTime(b)) => a.partial_cmp(b),
            (CompareValue::String(a), CompareValue::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two records on one field, for sorting.
///
/// Records without the field (or non-document records) sort as null.
pub fn compare_records(a: &Bson, b: &Bson, field: &str) -> Ordering {
    let left = field_value(a, field)
        .map(CompareValue::from)
        .unwrap_or(CompareValue::Null);
    let right = field_value(b, field)
        .map(CompareValue::from)
        .unwrap_or(CompareValue::Null);

    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

fn field_value<'a>(record: &'a Bson, field: &str) -> Option<&'a Bson> {
    record.as_document().and_then(|doc| doc.get(field))
}

/// Evaluates one filter expression against one record.
pub struct RecordMatcher<'a> {
    record: &'a Bson,
}

impl<'a> RecordMatcher<'a> {
    pub fn new(record: &'a Bson) -> Self {
        Self { record }
    }

    pub fn matches(&mut self, expr: &Expr) -> RepositoryResult<bool> {
        self.visit_expr(expr)
    }

    /// Filters records through the expression, in input order.
    pub fn filter_records(
        records: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> Vec<Bson> {
        records
            .into_iter()
            .filter(|record| {
                RecordMatcher::new(record)
                    .matches(expr)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

impl QueryVisitor for RecordMatcher<'_> {
    type Output = bool;
    type Error = RepositoryError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let Some(stored) = field_value(self.record, field) else {
            return Ok(false);
        };

        let left = CompareValue::from(stored);
        let right = CompareValue::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match left.partial_cmp(&right) {
                    Some(ordering) => match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        FieldOp::Lte => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
            FieldOp::Contains => match (&left, &right) {
                (CompareValue::Array(items), single) => {
                    items.iter().any(|item| item == single)
                }
                (CompareValue::String(haystack), CompareValue::String(needle)) => {
                    haystack.contains(needle)
                }
                _ => false,
            },
            FieldOp::StartsWith => match (&left, &right) {
                (CompareValue::String(text), CompareValue::String(prefix)) => {
                    text.starts_with(prefix)
                }
                _ => false,
            },
            FieldOp::EndsWith => match (&left, &right) {
                (CompareValue::String(text), CompareValue::String(suffix)) => {
                    text.ends_with(suffix)
                }
                _ => false,
            },
            FieldOp::In => match &right {
                CompareValue::Array(values) => values.iter().any(|item| item == &left),
                single => single == &left,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use repolayer_core::query::Filter;

    fn user(name: &str, age: i64, tags: Vec<&str>) -> Bson {
        Bson::Document(doc! {
            "name": name,
            "age": age,
            "tags": tags.iter().map(|t| Bson::from(*t)).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn equality_and_ordering() {
        let record = user("Ada", 36, vec![]);

        let mut matcher = RecordMatcher::new(&record);
        assert!(matcher.matches(&Filter::eq("name", "Ada")).unwrap());
        assert!(matcher.matches(&Filter::gt("age", 18i64)).unwrap());
        assert!(matcher.matches(&Filter::lte("age", 36i64)).unwrap());
        assert!(!matcher.matches(&Filter::ne("age", 36i64)).unwrap());
    }

    #[test]
    fn integers_compare_against_doubles() {
        let record = user("Ada", 36, vec![]);
        let mut matcher = RecordMatcher::new(&record);
        assert!(matcher.matches(&Filter::eq("age", 36.0)).unwrap());
    }

    #[test]
    fn string_and_array_containment() {
        let record = user("Ada Lovelace", 36, vec!["math", "engines"]);
        let mut matcher = RecordMatcher::new(&record);

        assert!(matcher.matches(&Filter::contains("name", "Love")).unwrap());
        assert!(matcher.matches(&Filter::contains("tags", "math")).unwrap());
        assert!(matcher.matches(&Filter::starts_with("name", "Ada")).unwrap());
        assert!(matcher.matches(&Filter::ends_with("name", "lace")).unwrap());
        assert!(
            !matcher
                .matches(&Filter::contains("tags", "poetry"))
                .unwrap()
        );
    }

    #[test]
    fn membership_against_value_list() {
        let record = user("Ada", 36, vec![]);
        let mut matcher = RecordMatcher::new(&record);

        let list = Bson::Array(vec![Bson::from("Ada"), Bson::from("Grace")]);
        assert!(matcher.matches(&Filter::within("name", list)).unwrap());
    }

    #[test]
    fn missing_fields_never_match() {
        let record = user("Ada", 36, vec![]);
        let mut matcher = RecordMatcher::new(&record);
        assert!(!matcher.matches(&Filter::eq("nickname", "A")).unwrap());
    }

    #[test]
    fn filter_records_preserves_input_order() {
        let records = vec![
            user("Ada", 36, vec![]),
            user("Grace", 40, vec![]),
            user("Edsger", 30, vec![]),
        ];

        let filtered = RecordMatcher::filter_records(records.iter(), &Filter::gte("age", 36i64));
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered[0].as_document().unwrap().get("name"),
            Some(&Bson::from("Ada"))
        );
        assert_eq!(
            filtered[1].as_document().unwrap().get("name"),
            Some(&Bson::from("Grace"))
        );
    }
}
