// src/engine/mod.rs

//! Execution engine for stepwise.
//!
//! This module ties together:
//! - graph assembly for the root procedure
//! - the per-run scheduling graph
//! - one of two executors:
//!   - [`sequential`]: one node at a time, in topological order
//!   - [`runtime`]: a bounded worker pool fed by the frontier scheduler
//!
//! Both executors evaluate nodes with `exec::evaluate`, so they
//! agree on when a body runs and how failures are reported.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, Span, debug, dispatcher, info_span};

use crate::config::ConfigFile;
use crate::dag::{Node, TaskGraph};
use crate::declare::{Procedure, Run};
use crate::errors::{Result, StepwiseError};
use crate::exec::{EvalContext, join_error_message};

pub mod runtime;
pub mod sequential;

pub use runtime::Runtime;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// What evaluating one node amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Assets are ready after evaluation.
    Ready,
    /// Assets are still not ready; requirements may be missing.
    NotReady,
    /// The body returned an error, panicked, or timed out.
    Failed,
    /// Dry run: the body would have run.
    Skipped,
    /// The run was interrupted before the node finished.
    Abandoned,
}

/// A worker's report back to the coordinator.
#[derive(Debug, Clone)]
pub struct Completion {
    pub task: TaskName,
    pub outcome: NodeOutcome,
}

/// How a run is executed.
#[derive(Debug, Clone)]
pub struct Options {
    /// Log bodies instead of running them.
    pub dry_run: bool,
    /// Worker pool size; `1` runs sequentially.
    pub workers: usize,
    /// Give up on a body after this long. The body is left running in the
    /// background and the node is reported failed.
    pub task_timeout: Option<Duration>,
    /// Cancelling stops the run after in-flight work is abandoned.
    pub cancel: CancellationToken,
    /// Where this run's log events go. Defaults to the caller's subscriber.
    pub dispatch: Option<Dispatch>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dry_run: false,
            workers: 1,
            task_timeout: None,
            cancel: CancellationToken::new(),
            dispatch: None,
        }
    }
}

impl Options {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            dry_run: cfg.run().dry_run,
            workers: cfg.run().workers,
            task_timeout: cfg.run().task_timeout(),
            ..Self::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> u64 {
    NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Assemble `procedure` as the root of a new run, evaluate everything it
/// needs, and return the root node.
///
/// Declaration errors abort the run before anything executes. Task failures
/// are logged and leave their nodes not ready; they are not returned.
/// Cancellation is not an error either: the root is returned as it stands.
pub async fn invoke(procedure: impl Procedure + 'static, options: &Options) -> Result<Node> {
    if options.workers == 0 {
        return Err(StepwiseError::ConfigError(
            "workers must be >= 1 (got 0)".to_string(),
        ));
    }

    let dispatch = match &options.dispatch {
        Some(dispatch) => dispatch.clone(),
        None => tracing::dispatcher::get_default(Dispatch::clone),
    };
    let options = options.clone();
    let procedure: Box<dyn Procedure> = Box::new(procedure);
    let run_dispatch = dispatch.clone();

    async move {
        let run_id = next_run_id();
        let span = info_span!("run", run_id);
        drive(procedure, options, run_id, run_dispatch)
            .instrument(span)
            .await
    }
    .with_subscriber(dispatch)
    .await
}

async fn drive(
    procedure: Box<dyn Procedure>,
    options: Options,
    run_id: u64,
    dispatch: Dispatch,
) -> Result<Node> {
    let (root, graph) = assemble(procedure, run_id, dispatch.clone()).await?;

    debug!("Execution");
    let ctx = EvalContext {
        dry_run: options.dry_run,
        task_timeout: options.task_timeout,
        cancel: options.cancel.clone(),
        dispatch,
    };

    if options.workers == 1 {
        sequential::execute(&graph, &ctx).await?;
    } else {
        Runtime::new(&graph, run_id, options.workers, ctx).run().await?;
    }

    Ok(root)
}

/// Assemble the root and build its scheduling graph on a blocking thread.
/// Requirement declarations and readiness predicates are user code and may
/// block.
async fn assemble(
    procedure: Box<dyn Procedure>,
    run_id: u64,
    dispatch: Dispatch,
) -> Result<(Node, TaskGraph)> {
    let span = Span::current();
    tokio::task::spawn_blocking(move || {
        dispatcher::with_default(&dispatch, || {
            span.in_scope(|| -> Result<(Node, TaskGraph)> {
                let mut run = Run::new(run_id);
                let root = run.assemble(procedure)?;
                debug!("Task Graph");
                let graph = TaskGraph::from_root(&root);
                Ok((root, graph))
            })
        })
    })
    .await
    .map_err(|err| {
        StepwiseError::Other(anyhow::anyhow!("graph assembly {}", join_error_message(err)))
    })?
}
