// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::dag::node::Node;
use crate::errors::{Result, StepwiseError};

/// The part of an assembled task graph that still needs work.
///
/// Built from a root node by walking requirements, but only below nodes that
/// are not ready yet, and only into requirements that are not ready yet.
/// Everything ready is already done, so scheduling it again would only
/// re-report it.
///
/// Edge direction: requirement -> dependent. Nodes are keyed by task name, so
/// equivalent nodes reached along different paths collapse into one vertex.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraph<Node, ()>,
    index: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn from_root(root: &Node) -> Self {
        let mut g = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        g.add(root, 0);
        g
    }

    fn add(&mut self, node: &Node, level: usize) -> NodeIndex {
        if let Some(idx) = self.index.get(node.taskname()) {
            return *idx;
        }

        debug!("{}{}", "  ".repeat(level), node.taskname());
        let idx = self.graph.add_node(node.clone());
        self.index.insert(node.taskname().to_string(), idx);

        if !node.ready() {
            for req in node.requirements().iter() {
                if req.ready() {
                    continue;
                }
                let req_idx = self.add(req, level + 1);
                self.graph.update_edge(req_idx, idx, ());
            }
        }

        idx
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes, in insertion (discovery) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Requirements of `name` that are part of this graph.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Nodes in this graph that require `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        match self.index.get(name) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, direction)
                .map(|n| self.graph[n].taskname())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every node after all of its requirements.
    pub fn topological_order(&self) -> Result<Vec<Node>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            StepwiseError::Cycle(self.graph[cycle.node_id()].taskname().to_string())
        })?;
        Ok(order.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }
}
