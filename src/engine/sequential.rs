// src/engine/sequential.rs

//! Single-worker executor: evaluate nodes one at a time in topological order.

use tracing::{debug, info};

use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::exec::{EvalContext, evaluate};

use super::NodeOutcome;

/// Evaluate every node of `graph` after all of its requirements.
///
/// Cancellation is checked between nodes; the node in flight when it fires
/// is abandoned.
pub async fn execute(graph: &TaskGraph, ctx: &EvalContext) -> Result<()> {
    for node in graph.topological_order()? {
        if ctx.cancel.is_cancelled() {
            info!("Interrupted, shutting down...");
            break;
        }
        let name = node.taskname().to_string();
        let outcome = evaluate(node, ctx).await;
        debug!(task = %name, ?outcome, "node evaluated");
        if outcome == NodeOutcome::Abandoned {
            info!("Interrupted, shutting down...");
            break;
        }
    }
    Ok(())
}
