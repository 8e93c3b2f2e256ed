//! Main repolayer crate providing a unified interface for dynamic repositories.
//!
//! This crate is the primary entry point for users of the repolayer framework.
//! It re-exports the core types and functionality from various sub-crates and
//! provides convenient access to storage managers.
//!
//! A repository here is not a hand-written data-access layer: callers describe
//! their methods as [`signature::MethodSignature`] descriptors and hand each
//! call to a [`dispatch::RepositoryInvoker`]. The invoker classifies the
//! method by name (default CRUD method, derived `find_by_...` query, or
//! annotated literal query), derives a backend-neutral plan, executes it
//! against the supplied storage manager, converts stored field values through
//! the converter registry, and reshapes the results into the declared return
//! shape.
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{prelude::*, memory::InMemoryManager};
//! use bson::{Bson, Uuid};
//! use serde::{Serialize, Deserialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Uuid,
//!     pub name: String,
//!     pub active: bool,
//! }
//!
//! impl Entity for User {
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = EntityModel::builder("users")
//!         .with_property("name", PropertyKind::Str)
//!         .with_property("active", PropertyKind::Bool)
//!         .build();
//!
//!     let invoker = RepositoryInvoker::new(Arc::new(InMemoryManager::new()), model);
//!
//!     // Persist through the default save method.
//!     let save = MethodSignature::builder("save")
//!         .with_param(ParamSpec::value("entity"))
//!         .build();
//!     let user = User { id: Uuid::new(), name: "Alice".to_string(), active: true };
//!     invoker.invoke(&save, vec![user.to_bson()?]).await?;
//!
//!     // Query through a derived method, by name alone.
//!     let find_active = MethodSignature::builder("find_by_active")
//!         .with_param(ParamSpec::value("active"))
//!         .with_return_shape(ReturnShape::Collection)
//!         .build();
//!     let users: Vec<User> = invoker
//!         .invoke(&find_active, vec![Bson::from(true)])
//!         .await?
//!         .into_entities()?;
//!
//!     println!("Active users: {users:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Asynchronous Invocation
//!
//! Methods declared with a trailing callback parameter run through
//! [`dispatch::RepositoryInvoker::invoke_with_callback`]: classification and
//! plan derivation happen synchronously (so malformed methods fail fast), the
//! storage call runs on a spawned task, and the completion callback fires
//! exactly once with the adapted outcome.
//!
//! # Storage Managers
//!
//! - [`memory`] - Fast in-memory manager for development and testing
//!
//! Any backend can participate by implementing
//! [`manager::StorageManager`](repolayer_core::manager::StorageManager).

pub mod prelude;

pub use repolayer_core::{
    adapt, classify, convert, dispatch, entity, error, manager, metadata, plan, query, signature,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage manager implementations.
pub mod memory {
    pub use repolayer_memory::InMemoryManager;
}
