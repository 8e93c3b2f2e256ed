//! Backend-neutral filter expressions and selection parameters.
//!
//! Query derivation compiles a method's parsed conditions into an [`Expr`]
//! tree; storage managers walk that tree through the [`QueryVisitor`] to
//! translate it into their native query form. [`Selection`] carries the
//! non-filter parts of a query (sorting and pagination).
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static constructors for the supported
//! comparisons:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`
//! - Membership: `within`
//! - Logical: `and`, `or`
//!
//! ```ignore
//! use repolayer::query::Filter;
//!
//! let expr = Filter::eq("name", "Ada").and(Filter::eq("active", true));
//! ```

use bson::Bson;

use crate::error::RepositoryError;

/// Sort direction for query results.
#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators supported by derived queries.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String or array contains value.
    Contains,
    /// String starts with value.
    StartsWith,
    /// String ends with value.
    EndsWith,
    /// Field value is one of the supplied values.
    In,
}

/// A filter expression matching stored records.
///
/// Expressions combine through logical operators (`And`, `Or`, `Not`) into
/// arbitrarily nested predicates. Derived queries produce a flat `And` of
/// field comparisons; literal queries bypass this representation entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression.
    Not(Box<Expr>),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Helper struct for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Creates an equality filter expression.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Creates a not-equal filter expression.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Creates a greater-than filter expression.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Creates a greater-than-or-equal filter expression.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Creates a less-than filter expression.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Creates a less-than-or-equal filter expression.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Creates a contains filter expression (string or array containment).
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// Creates a string prefix filter expression.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// Creates a string suffix filter expression.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Creates a membership filter expression (field value is one of the values).
    pub fn within(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::In, value.into())
    }

    /// Creates a logical AND filter expression.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Creates a logical OR filter expression.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// Sorting and pagination parameters attached to a query plan.
///
/// Derived queries currently populate only the filter side of a plan;
/// `Selection` keeps ordering and windowing expressible for default methods
/// and storage managers that need them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Optional filter expression to match records.
    pub filter: Option<Expr>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Number of records to skip.
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl Selection {
    /// Creates an empty selection with no filter, limits, or ordering.
    pub fn new() -> Self {
        Selection::default()
    }

    /// Creates a selection containing only the given filter.
    pub fn filtered(filter: Expr) -> Self {
        Selection { filter: Some(filter), ..Selection::default() }
    }

    /// Creates a selection builder for fluent construction.
    pub fn builder() -> SelectionBuilder {
        SelectionBuilder::new()
    }
}

/// Builder for [`Selection`] values.
#[derive(Debug, Clone)]
pub struct SelectionBuilder {
    selection: Selection,
}

impl SelectionBuilder {
    /// Creates a new selection builder.
    pub fn new() -> Self {
        SelectionBuilder { selection: Selection::default() }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.selection.filter = Some(filter);
        self
    }

    /// Sets the maximum number of records to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.selection.limit = Some(limit);
        self
    }

    /// Sets the number of records to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.selection.offset = Some(offset);
        self
    }

    /// Sets the sort specification.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.selection.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final selection.
    pub fn build(self) -> Selection {
        self.selection
    }
}

impl Default for SelectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Visitor over filter expression trees.
///
/// Storage managers implement this to translate an [`Expr`] into their native
/// representation (an in-memory predicate, a backend query document, etc.).
pub trait QueryVisitor {
    type Output;
    type Error: Into<RepositoryError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
