// src/dag/mod.rs

//! Task-graph data model and scheduling.
//!
//! - [`asset`] holds assets and their readiness predicates.
//! - [`node`] holds the three node kinds and the readiness cache.
//! - [`graph`] builds the graph of nodes that still need work.
//! - [`scheduler`] contains the per-run frontier that decides which nodes
//!   are ready to be evaluated.
//! - [`task_info`] provides per-run node state and scheduled work items.
//! - [`dot`] renders a graph as Graphviz DOT.

pub mod asset;
pub mod dot;
pub mod graph;
pub mod node;
pub mod scheduler;
pub mod task_info;

pub use asset::{Asset, AssetShape, refs};
pub use graph::TaskGraph;
pub use node::{Continuation, Node, NodeKind, NodeShape, RequirementShape};
pub use scheduler::Scheduler;
pub use task_info::ScheduledNode;
