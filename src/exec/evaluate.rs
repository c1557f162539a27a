// src/exec/evaluate.rs

//! Evaluation of a single node.

use std::any::Any;
use std::time::Duration;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, Span, debug, dispatcher, error, info};

use crate::dag::{Node, NodeKind};
use crate::engine::NodeOutcome;

/// Everything a worker needs to evaluate nodes for one run.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub dry_run: bool,
    pub task_timeout: Option<Duration>,
    pub cancel: CancellationToken,
    /// Bodies run on blocking threads, which do not inherit the run's
    /// subscriber, so it is carried explicitly.
    pub dispatch: Dispatch,
}

/// Evaluate `node`: run its body if it is a task whose requirements are
/// ready and whose assets are not, then report its readiness.
///
/// Predicates and the body run on a blocking thread. A panic there, like an
/// error returned by the body, is logged and leaves the node failed; it never
/// reaches the caller. If the run is cancelled or the timeout expires first,
/// the blocking work is abandoned.
pub async fn evaluate(node: Node, ctx: &EvalContext) -> NodeOutcome {
    let name = node.taskname().to_string();
    if ctx.cancel.is_cancelled() {
        debug!(task = %name, "not evaluated: run interrupted");
        return NodeOutcome::Abandoned;
    }

    let dispatch = ctx.dispatch.clone();
    let span = Span::current();
    let dry_run = ctx.dry_run;
    let blocking = tokio::task::spawn_blocking(move || {
        dispatcher::with_default(&dispatch, || span.in_scope(|| evaluate_blocking(&node, dry_run)))
    });

    let finished = async {
        match ctx.task_timeout {
            Some(limit) => tokio::time::timeout(limit, blocking).await.ok(),
            None => Some(blocking.await),
        }
    };

    tokio::select! {
        biased;

        _ = ctx.cancel.cancelled() => {
            debug!(task = %name, "abandoned: run interrupted");
            NodeOutcome::Abandoned
        }

        result = finished => match result {
            Some(Ok(outcome)) => outcome,
            Some(Err(err)) => {
                error!(task = %name, "Failed: {}", join_error_message(err));
                NodeOutcome::Failed
            }
            None => {
                error!(
                    task = %name,
                    "Failed: timed out after {:?}",
                    ctx.task_timeout.unwrap_or_default()
                );
                NodeOutcome::Failed
            }
        }
    }
}

fn evaluate_blocking(node: &Node, dry_run: bool) -> NodeOutcome {
    let name = node.taskname();
    let mut outcome = None;

    match node.kind() {
        NodeKind::Task => {
            if !node.ready() && node.requirements_ready() {
                if dry_run {
                    info!(task = %name, "SKIPPING (DRY RUN)");
                    outcome = Some(NodeOutcome::Skipped);
                } else if let Some(body) = node.take_continuation() {
                    info!(task = %name, "Executing");
                    let result = body();
                    node.invalidate();
                    if let Err(err) = result {
                        log_failure(name, &err);
                        outcome = Some(NodeOutcome::Failed);
                    }
                }
            }
        }
        NodeKind::Collection => node.invalidate(),
        NodeKind::External => {}
    }

    node.report_readiness();

    outcome.unwrap_or(if node.ready() {
        NodeOutcome::Ready
    } else {
        NodeOutcome::NotReady
    })
}

fn log_failure(name: &str, err: &anyhow::Error) {
    error!(task = %name, "Failed: {:#}", err);
    for (depth, cause) in err.chain().enumerate() {
        debug!(task = %name, "  {depth}: {cause}");
    }
}

pub(crate) fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        format!("panicked: {}", panic_message(&*err.into_panic()))
    } else {
        err.to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
