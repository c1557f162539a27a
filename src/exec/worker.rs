// src/exec/worker.rs

//! Worker pool for the concurrent executor.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, Span, debug};

use crate::dag::ScheduledNode;
use crate::engine::Completion;
use crate::exec::evaluate::{EvalContext, evaluate};

/// Spawn `count` workers sharing one work queue.
///
/// Each worker pulls a node, evaluates it, and reports a [`Completion`] on
/// `done_tx`. A worker exits when the work channel is closed and drained, or
/// when the run is cancelled. Once every worker has exited, `done_tx` is
/// dropped and the coordinator's receiver closes.
pub fn spawn_workers(
    count: usize,
    work_rx: Arc<Mutex<mpsc::Receiver<ScheduledNode>>>,
    done_tx: mpsc::Sender<Completion>,
    ctx: Arc<EvalContext>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker| {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let ctx = Arc::clone(&ctx);
            let dispatch = ctx.dispatch.clone();
            tokio::spawn(
                worker_loop(worker, work_rx, done_tx, ctx)
                    .instrument(Span::current())
                    .with_subscriber(dispatch),
            )
        })
        .collect()
}

async fn worker_loop(
    worker: usize,
    work_rx: Arc<Mutex<mpsc::Receiver<ScheduledNode>>>,
    done_tx: mpsc::Sender<Completion>,
    ctx: Arc<EvalContext>,
) {
    debug!(worker, "worker started");

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => None,
            next = async { work_rx.lock().await.recv().await } => next,
        };
        let Some(scheduled) = next else {
            break;
        };

        let task = scheduled.name().to_string();
        debug!(worker, task = %task, run_id = scheduled.run_id, "evaluating");
        let outcome = evaluate(scheduled.node, &ctx).await;

        if done_tx.send(Completion { task, outcome }).await.is_err() {
            debug!(worker, "coordinator gone; stopping");
            break;
        }
    }

    debug!(worker, "worker finished");
}
