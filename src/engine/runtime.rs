// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::{ScheduledNode, Scheduler, TaskGraph};
use crate::errors::Result;
use crate::exec::{EvalContext, spawn_workers};

use super::Completion;

/// Coordinator for the concurrent executor.
///
/// Feeds the scheduler's frontier to a pool of workers over a work channel,
/// and feeds their completions back into the scheduler, until every node is
/// evaluated or the run is cancelled.
pub struct Runtime {
    scheduler: Scheduler,
    workers: usize,
    ctx: Arc<EvalContext>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(graph: &TaskGraph, run_id: u64, workers: usize, ctx: EvalContext) -> Self {
        Self {
            scheduler: Scheduler::new(graph, run_id),
            workers: workers.max(1),
            ctx: Arc::new(ctx),
        }
    }

    /// Main coordination loop.
    ///
    /// - Admits the initial frontier.
    /// - Waits for completions and admits whatever each one unblocks.
    /// - On cancellation, stops admitting work, closes the work channel, and
    ///   drains completions until every worker has exited.
    pub async fn run(mut self) -> Result<()> {
        // Every node is sent and completed at most once, so neither channel
        // can fill up.
        let capacity = self.scheduler.len().max(1);
        let (work_tx, work_rx) = mpsc::channel::<ScheduledNode>(capacity);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(capacity);

        let handles = spawn_workers(
            self.workers,
            Arc::new(Mutex::new(work_rx)),
            done_tx,
            Arc::clone(&self.ctx),
        );
        debug!(workers = self.workers, nodes = capacity, "runtime started");

        let initial = self.scheduler.start();
        dispatch(&work_tx, initial).await;

        let cancel = self.ctx.cancel.clone();
        while !self.scheduler.is_finished() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Interrupted, shutting down...");
                    break;
                }

                completion = done_rx.recv() => {
                    let Some(Completion { task, outcome }) = completion else {
                        warn!("all workers exited before the run finished");
                        break;
                    };
                    let next = self.scheduler.handle_completion(&task, outcome);
                    dispatch(&work_tx, next).await;
                }
            }
        }

        // Closing the work channel lets idle workers exit.
        drop(work_tx);
        while let Some(Completion { task, outcome }) = done_rx.recv().await {
            debug!(task = %task, ?outcome, "completion after shutdown");
        }
        join_workers(handles).await;

        let failed = self.scheduler.failed();
        if !failed.is_empty() {
            warn!(?failed, "some tasks failed");
        }
        debug!(
            finished = self.scheduler.is_finished(),
            "runtime exiting"
        );
        Ok(())
    }
}

async fn dispatch(work_tx: &mpsc::Sender<ScheduledNode>, nodes: Vec<ScheduledNode>) {
    if nodes.is_empty() {
        return;
    }

    let names: Vec<_> = nodes.iter().map(|n| n.name().to_string()).collect();
    debug!(?names, "dispatching ready nodes");

    for node in nodes {
        let name = node.name().to_string();
        if work_tx.send(node).await.is_err() {
            warn!(task = %name, "no worker left to evaluate node");
        }
    }
}

async fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(err) = handle.await {
            warn!(error = %err, "worker task did not shut down cleanly");
        }
    }
}
