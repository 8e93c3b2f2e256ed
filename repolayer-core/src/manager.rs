//! Storage manager abstraction — the capability set the dispatcher consumes.
//!
//! A [`StorageManager`] is the externally-owned handle to a concrete backend
//! (document, column, key-value, graph). The core never manages its
//! lifecycle: it is supplied at invoker construction and invoked through two
//! capabilities only, a query channel returning raw records and an update
//! channel returning an affected count.
//!
//! Implementations must be safe for concurrent use by multiple in-flight
//! calls, must report errors through [`RepositoryError`], and must return an
//! empty record vector — never an error — for a query that matches nothing.

use async_trait::async_trait;
use bson::Bson;
use std::{fmt::Debug, sync::Arc};

use crate::{error::RepositoryResult, plan::QueryPlan};

/// Abstract interface to a concrete storage backend.
#[async_trait]
pub trait StorageManager: Send + Sync + Debug {
    /// Executes a read plan and returns the matching raw records.
    ///
    /// An empty result is an empty vector, never an error.
    async fn execute_query(&self, plan: QueryPlan) -> RepositoryResult<Vec<Bson>>;

    /// Executes a mutating plan and returns the number of affected records.
    async fn execute_update(&self, plan: QueryPlan) -> RepositoryResult<u64>;
}

#[async_trait]
impl<M> StorageManager for &M
where
    M: StorageManager,
{
    async fn execute_query(&self, plan: QueryPlan) -> RepositoryResult<Vec<Bson>> {
        (*self).execute_query(plan).await
    }

    async fn execute_update(&self, plan: QueryPlan) -> RepositoryResult<u64> {
        (*self).execute_update(plan).await
    }
}

#[async_trait]
impl<M> StorageManager for Arc<M>
where
    M: StorageManager,
{
    async fn execute_query(&self, plan: QueryPlan) -> RepositoryResult<Vec<Bson>> {
        self.as_ref().execute_query(plan).await
    }

    async fn execute_update(&self, plan: QueryPlan) -> RepositoryResult<u64> {
        self.as_ref().execute_update(plan).await
    }
}
