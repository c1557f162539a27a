// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{NodeInfo, RunState, ScheduledNode};
use crate::engine::{NodeOutcome, TaskName};

/// Frontier scheduler for one run over a [`TaskGraph`].
///
/// It is responsible for:
/// - remembering which nodes are pending, running, or done
/// - admitting a node only once every requirement in the graph is done
/// - recording each node's outcome
///
/// A failed requirement still counts as done: its dependents get evaluated,
/// see a requirement that is not ready, and stay not ready themselves. That
/// way one failure never stalls the rest of the run.
#[derive(Debug)]
pub struct Scheduler {
    /// Discovery order, so admission order is stable between runs.
    order: Vec<TaskName>,
    nodes: HashMap<TaskName, NodeInfo>,
    run_id: u64,
}

impl Scheduler {
    pub fn new(graph: &TaskGraph, run_id: u64) -> Self {
        let mut order = Vec::with_capacity(graph.len());
        let mut nodes = HashMap::with_capacity(graph.len());

        for node in graph.nodes() {
            let name = node.taskname().to_string();
            let deps = graph
                .dependencies_of(&name)
                .into_iter()
                .map(str::to_string)
                .collect();
            order.push(name.clone());
            nodes.insert(name, NodeInfo::new(node.clone(), deps));
        }

        Self {
            order,
            nodes,
            run_id,
        }
    }

    /// Number of nodes in this run.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True once every node has been evaluated.
    pub fn is_finished(&self) -> bool {
        self.nodes
            .values()
            .all(|info| info.run_state == RunState::Done)
    }

    /// Nodes whose evaluation failed, in discovery order.
    pub fn failed(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.nodes
                    .get(name.as_str())
                    .is_some_and(|info| info.outcome == Some(NodeOutcome::Failed))
            })
            .map(String::as_str)
            .collect()
    }

    fn deps_satisfied_for_info(&self, info: &NodeInfo) -> bool {
        info.deps.iter().all(|dep| match self.nodes.get(dep) {
            Some(dep) => dep.run_state == RunState::Done,
            None => {
                warn!(task = %info.node.taskname(), dep = %dep, "requirement missing from graph");
                false
            }
        })
    }

    /// Admit the initial frontier: nodes with no pending requirements.
    pub fn start(&mut self) -> Vec<ScheduledNode> {
        self.collect_new_ready()
    }

    /// Record that `name` was evaluated with `outcome` and admit whatever
    /// that unblocked.
    pub fn handle_completion(&mut self, name: &str, outcome: NodeOutcome) -> Vec<ScheduledNode> {
        match self.nodes.get_mut(name) {
            Some(info) if info.run_state == RunState::Running => {
                info.run_state = RunState::Done;
                info.outcome = Some(outcome);
                debug!(task = %name, run_id = self.run_id, ?outcome, "node evaluated");
            }
            Some(info) => {
                warn!(
                    task = %name,
                    state = ?info.run_state,
                    "completion for node that is not running; ignoring"
                );
                return Vec::new();
            }
            None => {
                warn!(task = %name, "completion for unknown node; ignoring");
                return Vec::new();
            }
        }

        self.collect_new_ready()
    }

    /// Collect nodes that are `Pending` with all requirements done, mark them
    /// `Running`, and return them.
    fn collect_new_ready(&mut self) -> Vec<ScheduledNode> {
        // Decide first, then mutate.
        let candidates: Vec<TaskName> = self
            .order
            .iter()
            .filter(|name| {
                self.nodes.get(name.as_str()).is_some_and(|info| {
                    info.run_state == RunState::Pending && self.deps_satisfied_for_info(info)
                })
            })
            .cloned()
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(info) = self.nodes.get_mut(&name) {
                debug!(task = %name, run_id = self.run_id, "requirements evaluated; admitting");
                info.run_state = RunState::Running;
                ready.push(ScheduledNode {
                    node: info.node.clone(),
                    run_id: self.run_id,
                });
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{Asset, Node};
    use crate::types::Shape;

    fn task(name: &str, reqs: Vec<Node>) -> Node {
        Node::task(
            name.into(),
            Shape::One(Asset::new(name, || false)),
            Shape::List(reqs),
            Box::new(|| Ok(())),
        )
    }

    fn names(nodes: &[ScheduledNode]) -> Vec<&str> {
        let mut names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
        names.sort();
        names
    }

    #[test]
    fn admits_nodes_only_after_requirements_complete() {
        let a = task("a", vec![]);
        let b = task("b", vec![]);
        let c = task("c", vec![a, b]);
        let root = task("root", vec![c]);
        let graph = TaskGraph::from_root(&root);
        let mut scheduler = Scheduler::new(&graph, 7);

        let first = scheduler.start();
        assert_eq!(names(&first), vec!["a", "b"]);
        assert!(first.iter().all(|n| n.run_id == 7));

        assert!(scheduler.handle_completion("a", NodeOutcome::Ready).is_empty());
        let next = scheduler.handle_completion("b", NodeOutcome::Failed);
        assert_eq!(names(&next), vec!["c"]);
        assert!(!scheduler.is_finished());

        let next = scheduler.handle_completion("c", NodeOutcome::NotReady);
        assert_eq!(names(&next), vec!["root"]);
        assert!(scheduler.handle_completion("root", NodeOutcome::NotReady).is_empty());
        assert!(scheduler.is_finished());
        assert_eq!(scheduler.failed(), vec!["b"]);
    }

    #[test]
    fn ignores_duplicate_and_unknown_completions() {
        let root = task("root", vec![]);
        let graph = TaskGraph::from_root(&root);
        let mut scheduler = Scheduler::new(&graph, 1);

        assert!(scheduler.handle_completion("root", NodeOutcome::Failed).is_empty());
        assert!(!scheduler.is_finished());

        assert_eq!(names(&scheduler.start()), vec!["root"]);
        scheduler.handle_completion("root", NodeOutcome::Ready);
        scheduler.handle_completion("root", NodeOutcome::Failed);
        assert!(scheduler.handle_completion("nope", NodeOutcome::Failed).is_empty());
        assert!(scheduler.is_finished());
        assert!(scheduler.failed().is_empty());
    }
}
