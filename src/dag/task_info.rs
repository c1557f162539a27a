// src/dag/task_info.rs

//! Per-run node state and scheduled work items.

use crate::dag::node::Node;
use crate::engine::{NodeOutcome, TaskName};

/// Per-run state of a node (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunState {
    /// Waiting for its requirements to be evaluated.
    Pending,
    /// Handed to a worker.
    Running,
    /// Evaluated (successfully or not) for this run.
    Done,
}

/// Scheduling bookkeeping for one node of the graph.
#[derive(Debug, Clone)]
pub(crate) struct NodeInfo {
    pub node: Node,
    /// Requirements of this node that are part of the graph.
    pub deps: Vec<TaskName>,
    pub run_state: RunState,
    pub outcome: Option<NodeOutcome>,
}

impl NodeInfo {
    pub fn new(node: Node, deps: Vec<TaskName>) -> Self {
        Self {
            node,
            deps,
            run_state: RunState::Pending,
            outcome: None,
        }
    }
}

/// A node the scheduler wants a worker to evaluate now.
#[derive(Debug, Clone)]
pub struct ScheduledNode {
    pub node: Node,
    /// Identifier of the run this node belongs to.
    pub run_id: u64,
}

impl ScheduledNode {
    pub fn name(&self) -> &str {
        self.node.taskname()
    }
}
