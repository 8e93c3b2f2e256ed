//! Convenient re-exports of commonly used types from repolayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use repolayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Entity traits and metadata
//! - Method signatures and return shapes
//! - The repository invoker and its outcome type
//! - Storage manager abstraction
//! - Query construction and filtering
//! - Value converters and the registry
//! - Error types

pub use repolayer_core::{
    adapt::{OutcomeValue, ResultAdapter},
    classify::{MethodClassifier, MethodKind},
    convert::{ConverterRegistry, ValueConverter, write_enumerant},
    dispatch::{CompletionCallback, RepositoryInvoker},
    entity::{Entity, EntityExt},
    error::{RepositoryError, RepositoryResult},
    manager::StorageManager,
    metadata::{EntityModel, PropertyKind},
    plan::{Planner, QueryKind, QueryPlan},
    query::{Expr, FieldOp, Filter, QueryVisitor, Selection, Sort, SortDirection},
    signature::{MethodSignature, ParamSpec, ReturnShape},
};
