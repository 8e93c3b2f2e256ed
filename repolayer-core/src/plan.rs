//! Query plans and their derivation from classified methods.
//!
//! A [`QueryPlan`] is the backend-neutral description of one storage
//! operation: what kind of operation, against which collection, with which
//! bound parameter values, and either a derived filter expression or a
//! verbatim literal query. The [`Planner`] builds exactly one plan per
//! invocation; the dispatcher consumes it exactly once.

use std::collections::HashMap;

use bson::Bson;

use crate::{
    classify::{Condition, DerivedAction, DefaultMethod, MethodKind},
    error::{RepositoryError, RepositoryResult},
    metadata::EntityModel,
    query::{Expr, Filter, Selection},
    signature::{MethodSignature, ReturnShape},
};

/// The kind of storage operation a plan describes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryKind {
    /// Retrieve matching records.
    Find,
    /// Count matching records.
    Count,
    /// Check whether any record matches.
    Exists,
    /// Delete matching records.
    Delete,
    /// Persist the plan's documents.
    Save,
    /// A literal query with update semantics.
    Update,
}

/// A backend-neutral description of one storage operation.
///
/// Built by the [`Planner`], consumed once by the dispatcher, never retained.
/// Storage managers receive the plan whole: filter-based plans populate
/// `selection`, literal plans populate `literal` plus `bindings`, and save
/// plans populate `documents`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// The operation kind.
    pub kind: QueryKind,
    /// The target collection.
    pub collection: String,
    /// Derived filter, sorting, and windowing.
    pub selection: Selection,
    /// Verbatim literal query for direct-query methods.
    pub literal: Option<String>,
    /// Named parameter bindings. Insertion order is irrelevant.
    pub bindings: HashMap<String, Bson>,
    /// (identifier value, record) pairs for save plans.
    pub documents: Vec<(Bson, Bson)>,
}

impl QueryPlan {
    fn new(kind: QueryKind, collection: &str) -> Self {
        QueryPlan {
            kind,
            collection: collection.to_string(),
            selection: Selection::new(),
            literal: None,
            bindings: HashMap::new(),
            documents: Vec::new(),
        }
    }

    /// Whether this plan goes through the storage manager's update channel
    /// rather than its query channel.
    pub fn is_update(&self) -> bool {
        matches!(self.kind, QueryKind::Delete | QueryKind::Save | QueryKind::Update)
    }
}

/// Derives query plans from classified methods and their call arguments.
pub struct Planner<'a> {
    model: &'a EntityModel,
}

impl<'a> Planner<'a> {
    /// Creates a planner for the given entity model.
    pub fn new(model: &'a EntityModel) -> Self {
        Self { model }
    }

    /// Transforms a classified method plus its argument values into a plan.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MissingParameterBinding`] when a literal
    /// query placeholder has no matching argument,
    /// [`RepositoryError::ParameterArityMismatch`] when a derived or default
    /// method receives the wrong number of bindable arguments, and
    /// [`RepositoryError::InvalidEntity`] when a save argument is not a
    /// usable entity document.
    pub fn plan(
        &self,
        kind: &MethodKind,
        signature: &MethodSignature,
        args: &[Bson],
    ) -> RepositoryResult<QueryPlan> {
        let args = bindable_args(signature, args);

        match kind {
            MethodKind::DirectQuery { query } => self.plan_direct(query, signature, args),
            MethodKind::DerivedQuery { action, conditions } => {
                self.plan_derived(*action, conditions, signature, args)
            }
            MethodKind::DefaultMethod(method) => self.plan_default(*method, signature, args),
        }
    }

    fn plan_direct(
        &self,
        query: &str,
        signature: &MethodSignature,
        args: &[Bson],
    ) -> RepositoryResult<QueryPlan> {
        let kind = match signature.return_shape() {
            ReturnShape::Count => QueryKind::Count,
            ReturnShape::Exists => QueryKind::Exists,
            ReturnShape::Unit => QueryKind::Update,
            _ => QueryKind::Find,
        };

        let mut plan = QueryPlan::new(kind, self.model.name());
        plan.literal = Some(query.to_string());

        for placeholder in scan_placeholders(query) {
            let position = signature
                .bindable_params()
                .iter()
                .position(|param| param.name() == placeholder);

            let value = position
                .and_then(|index| args.get(index))
                .ok_or_else(|| {
                    RepositoryError::MissingParameterBinding(placeholder.clone())
                })?;

            plan.bindings.insert(placeholder, value.clone());
        }

        Ok(plan)
    }

    fn plan_derived(
        &self,
        action: DerivedAction,
        conditions: &[Condition],
        signature: &MethodSignature,
        args: &[Bson],
    ) -> RepositoryResult<QueryPlan> {
        if args.len() != conditions.len() {
            return Err(RepositoryError::ParameterArityMismatch(
                signature.name().to_string(),
                conditions.len(),
                args.len(),
            ));
        }

        let kind = match action {
            DerivedAction::Find => QueryKind::Find,
            DerivedAction::Count => QueryKind::Count,
            DerivedAction::Exists => QueryKind::Exists,
            DerivedAction::Delete => QueryKind::Delete,
        };

        let mut plan = QueryPlan::new(kind, self.model.name());
        let mut exprs = Vec::with_capacity(conditions.len());

        for (condition, value) in conditions.iter().zip(args) {
            plan.bindings
                .insert(condition.property.clone(), value.clone());
            exprs.push(Expr::field(
                condition.property.clone(),
                condition.op.field_op(),
                value.clone(),
            ));
        }

        plan.selection.filter = match exprs.len() {
            0 => None,
            1 => exprs.pop(),
            _ => Some(Expr::And(exprs)),
        };

        Ok(plan)
    }

    fn plan_default(
        &self,
        method: DefaultMethod,
        signature: &MethodSignature,
        args: &[Bson],
    ) -> RepositoryResult<QueryPlan> {
        let expected = match method {
            DefaultMethod::FindAll | DefaultMethod::Count => 0,
            _ => 1,
        };
        if args.len() != expected {
            return Err(RepositoryError::ParameterArityMismatch(
                signature.name().to_string(),
                expected,
                args.len(),
            ));
        }

        match method {
            DefaultMethod::Save => {
                let record = args[0].clone();
                let document = record
                    .as_document()
                    .ok_or_else(|| {
                        RepositoryError::InvalidEntity(
                            "save argument is not a document".to_string(),
                        )
                    })?;
                let id = document
                    .get(self.model.id_field())
                    .cloned()
                    .ok_or_else(|| {
                        RepositoryError::InvalidEntity(format!(
                            "entity document lacks identifier field {}",
                            self.model.id_field()
                        ))
                    })?;

                let mut plan = QueryPlan::new(QueryKind::Save, self.model.name());
                plan.documents.push((id, record));
                Ok(plan)
            }
            DefaultMethod::FindAll => Ok(QueryPlan::new(QueryKind::Find, self.model.name())),
            DefaultMethod::Count => Ok(QueryPlan::new(QueryKind::Count, self.model.name())),
            DefaultMethod::FindById => Ok(self.by_identifier(QueryKind::Find, &args[0])),
            DefaultMethod::DeleteById => Ok(self.by_identifier(QueryKind::Delete, &args[0])),
            DefaultMethod::ExistsById => Ok(self.by_identifier(QueryKind::Exists, &args[0])),
        }
    }

    fn by_identifier(&self, kind: QueryKind, id: &Bson) -> QueryPlan {
        let mut plan = QueryPlan::new(kind, self.model.name());
        plan.bindings
            .insert(self.model.id_field().to_string(), id.clone());
        plan.selection = Selection::filtered(Filter::eq(self.model.id_field(), id.clone()));
        plan
    }
}

/// Strips a trailing callback argument so it never binds and never counts
/// toward arity. Callers that pass only the value arguments are left as-is.
fn bindable_args<'b>(signature: &MethodSignature, args: &'b [Bson]) -> &'b [Bson] {
    if signature.has_trailing_callback() && args.len() == signature.params().len() {
        &args[..args.len() - 1]
    } else {
        args
    }
}

/// Scans a literal query for `@name` placeholders, preserving first-seen order.
fn scan_placeholders(query: &str) -> Vec<String> {
    let mut placeholders: Vec<String> = Vec::new();
    let mut chars = query.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '@' {
            continue;
        }

        let mut name = String::new();
        while let Some((_, next)) = chars.peek() {
            if next.is_alphanumeric() || *next == '_' {
                name.push(*next);
                chars.next();
            } else {
                break;
            }
        }

        if !name.is_empty() && !placeholders.contains(&name) {
            placeholders.push(name);
        }
    }

    placeholders
}
