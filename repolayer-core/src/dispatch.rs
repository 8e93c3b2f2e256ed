//! The invocation dispatcher — the central state machine of the engine.
//!
//! A call moves through `Classified → Derived → Executing → Completed |
//! Failed`. Classification and derivation failures are terminal and always
//! surface synchronously, even for callback-shaped methods: they are caller
//! programming errors, not runtime backend failures, and are never deferred
//! to a background task. Execution failures propagate unchanged — to the
//! caller on the synchronous path, to the completion callback on the
//! asynchronous path. The dispatcher performs no retries; retry policy, if
//! any, belongs to the storage manager.
//!
//! Asynchronous calls are handed to the ambient tokio runtime and return
//! control immediately; completion is observed only through the supplied
//! callback, which fires exactly once, never before a terminal state.
//! Cancellation is not supported: once scheduled, an operation runs to
//! completion or failure.

use std::sync::Arc;

use bson::Bson;
use tracing::debug;

use crate::{
    adapt::{OutcomeValue, ResultAdapter},
    classify::MethodClassifier,
    convert::ConverterRegistry,
    error::RepositoryResult,
    manager::StorageManager,
    metadata::EntityModel,
    plan::{Planner, QueryPlan},
    signature::{MethodSignature, ReturnShape},
};

/// A caller-supplied completion callback for asynchronous invocations.
///
/// Consumed exactly once with the adapted outcome or the propagated error.
pub type CompletionCallback = Box<dyn FnOnce(RepositoryResult<OutcomeValue>) + Send + 'static>;

/// The repository invocation entrypoint.
///
/// One invoker serves one repository interface: it holds the entity model,
/// the per-method classification cache, and a handle to the externally-owned
/// storage manager. This is the sole public surface of the core — whatever
/// mechanism supplies the runtime implementation of a declared interface
/// (hand-written stubs, build-time generation) routes every call through
/// [`invoke`](RepositoryInvoker::invoke) or
/// [`invoke_with_callback`](RepositoryInvoker::invoke_with_callback).
///
/// # Example
///
/// ```ignore
/// use repolayer::dispatch::RepositoryInvoker;
///
/// let invoker = RepositoryInvoker::new(manager, model);
/// let outcome = invoker.invoke(&signature, vec![Bson::from(42i64)]).await?;
/// let user: User = outcome.into_entity()?;
/// ```
#[derive(Debug)]
pub struct RepositoryInvoker<M: StorageManager + 'static> {
    manager: Arc<M>,
    model: EntityModel,
    classifier: MethodClassifier,
}

impl<M: StorageManager + 'static> RepositoryInvoker<M> {
    /// Creates an invoker for one repository interface.
    pub fn new(manager: Arc<M>, model: EntityModel) -> Self {
        let classifier = MethodClassifier::new(model.clone());
        Self { manager, model, classifier }
    }

    /// Returns the entity model this invoker serves.
    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    /// Invokes a repository method synchronously on the caller's task.
    ///
    /// The call blocks (at the await point) until the storage manager
    /// produces a result or an error.
    ///
    /// # Errors
    ///
    /// Classification, derivation, backend, conversion, and shaping errors
    /// all surface here directly.
    pub async fn invoke(
        &self,
        signature: &MethodSignature,
        args: Vec<Bson>,
    ) -> RepositoryResult<OutcomeValue> {
        let plan = self.prepare(signature, &args)?;
        execute_plan(
            self.manager.as_ref(),
            &self.model,
            signature.name(),
            signature.return_shape(),
            plan,
        )
        .await
    }

    /// Invokes a repository method asynchronously.
    ///
    /// Classification and derivation failures are returned synchronously
    /// from this call. On success the execution is scheduled on the ambient
    /// tokio runtime and this call returns immediately; the callback fires
    /// exactly once with the adapted outcome or the propagated error. A
    /// missing callback is tolerated — execution proceeds and the result is
    /// discarded.
    pub fn invoke_with_callback(
        &self,
        signature: &MethodSignature,
        args: Vec<Bson>,
        callback: Option<CompletionCallback>,
    ) -> RepositoryResult<()> {
        let plan = self.prepare(signature, &args)?;

        let manager = Arc::clone(&self.manager);
        let model = self.model.clone();
        let method = signature.name().to_string();
        let shape = signature.return_shape().clone();

        tokio::spawn(async move {
            let outcome = execute_plan(manager.as_ref(), &model, &method, &shape, plan).await;
            match &outcome {
                Ok(_) => debug!(method = %method, "async invocation completed"),
                Err(err) => debug!(method = %method, error = %err, "async invocation failed"),
            }
            if let Some(callback) = callback {
                callback(outcome);
            }
        });

        Ok(())
    }

    /// Runs the `Classified → Derived` transitions. Failures here are
    /// terminal and synchronous.
    fn prepare(
        &self,
        signature: &MethodSignature,
        args: &[Bson],
    ) -> RepositoryResult<QueryPlan> {
        let kind = self.classifier.classify(signature)?;
        debug!(method = signature.name(), kind = ?kind, "classified");

        Planner::new(&self.model).plan(&kind, signature, args)
    }
}

/// Runs the `Derived → Executing → Completed | Failed` transitions and
/// triggers result adaptation on completion.
async fn execute_plan<M: StorageManager>(
    manager: &M,
    model: &EntityModel,
    method: &str,
    shape: &ReturnShape,
    plan: QueryPlan,
) -> RepositoryResult<OutcomeValue> {
    let adapter = ResultAdapter::new(model, ConverterRegistry::global());

    if plan.is_update() {
        debug!(method, kind = ?plan.kind, "executing update plan");
        let affected = manager.execute_update(plan).await?;
        Ok(adapter.adapt_affected(shape, affected))
    } else {
        debug!(method, kind = ?plan.kind, "executing query plan");
        let records = manager.execute_query(plan).await?;
        adapter.adapt_records(method, shape, records)
    }
}
