//! The dynamic repository invocation engine.
//!
//! This crate is the core of the repolayer project and provides:
//!
//! - **Method signatures** ([`signature`]) - Descriptors of repository interface methods
//! - **Method classification** ([`classify`]) - Strategy selection with a per-method cache
//! - **Query plans** ([`plan`]) - Backend-neutral query derivation and parameter binding
//! - **Invocation dispatch** ([`dispatch`]) - The sync/async execution state machine
//! - **Value conversion** ([`convert`]) - The pluggable converter registry
//! - **Result adaptation** ([`adapt`]) - Reshaping raw records into declared return shapes
//! - **Filter expressions** ([`query`]) - Backend-neutral filters and the visitor seam
//! - **Entity traits** ([`entity`]) - Serde-backed entity definition and conversion
//! - **Entity metadata** ([`metadata`]) - Property kinds consulted by derivation
//! - **Storage abstraction** ([`manager`]) - The capability set backends implement
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use repolayer::{dispatch::RepositoryInvoker, metadata::{EntityModel, PropertyKind}};
//! use repolayer::signature::{MethodSignature, ParamSpec, ReturnShape};
//! use bson::Bson;
//!
//! let model = EntityModel::builder("users")
//!     .with_property("name", PropertyKind::Str)
//!     .with_property("active", PropertyKind::Bool)
//!     .build();
//!
//! let invoker = RepositoryInvoker::new(manager, model);
//!
//! let signature = MethodSignature::builder("find_by_name_and_active")
//!     .with_param(ParamSpec::value("name"))
//!     .with_param(ParamSpec::value("active"))
//!     .with_return_shape(ReturnShape::Collection)
//!     .build();
//!
//! let outcome = invoker
//!     .invoke(&signature, vec![Bson::from("Ada"), Bson::from(true)])
//!     .await?;
//! ```

pub mod adapt;
pub mod classify;
pub mod convert;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod plan;
pub mod query;
pub mod signature;
