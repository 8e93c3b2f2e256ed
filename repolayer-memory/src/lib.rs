//! In-memory storage manager for repolayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StorageManager` trait. It uses async-aware read-write locks for
//! concurrent access and is ideal for development, testing, and small-scale
//! deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Type-erased storage** - Stores records as BSON for flexibility
//! - **Full selection support** - Supports filtering, sorting, and pagination
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{dispatch::RepositoryInvoker, memory::InMemoryManager};
//! use repolayer::metadata::{EntityModel, PropertyKind};
//! use repolayer::signature::{MethodSignature, ParamSpec, ReturnShape};
//! use bson::Bson;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = EntityModel::builder("users")
//!         .with_property("name", PropertyKind::Str)
//!         .build();
//!     let invoker = RepositoryInvoker::new(Arc::new(InMemoryManager::new()), model);
//!
//!     let find_by_name = MethodSignature::builder("find_by_name")
//!         .with_param(ParamSpec::value("name"))
//!         .with_return_shape(ReturnShape::Collection)
//!         .build();
//!
//!     let outcome = invoker
//!         .invoke(&find_by_name, vec![Bson::from("Alice")])
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_memory;

pub mod evaluator;
pub mod store;

pub use store::InMemoryManager;
