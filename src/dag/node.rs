// src/dag/node.rs

//! Task-graph nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde_json::Value;
use tracing::{info, warn};

use crate::dag::asset::{self, AssetShape};
use crate::types::Shape;

/// Deferred task body. Runs at most once per run.
pub type Continuation = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// The requirement(s) declared by one task.
pub type NodeShape = Shape<Node>;

/// Requirements as declared, before absent entries are dropped.
pub type RequirementShape = Shape<Option<Node>>;

/// Which declaration produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Assets the workflow can observe but not produce.
    External,
    /// Assets the workflow can produce by running a body.
    Task,
    /// A named group of other tasks, ready when they all are.
    Collection,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::External => "external",
            NodeKind::Task => "task",
            NodeKind::Collection => "collection",
        };
        f.write_str(s)
    }
}

struct NodeInner {
    taskname: String,
    kind: NodeKind,
    assets: AssetShape,
    requirements: NodeShape,
    continuation: Mutex<Option<Continuation>>,
    /// Cached aggregate readiness; `None` until first asked.
    ready: Mutex<Option<bool>>,
    /// Set when this node lost deduplication to an equivalent one.
    canonical: OnceLock<Node>,
}

/// A vertex in the task graph.
///
/// `Node` is a cheap handle: clones share the same state. Nodes are equal
/// when their task names are equal, which is what deduplication relies on.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    fn build(
        taskname: String,
        kind: NodeKind,
        assets: AssetShape,
        requirements: NodeShape,
        continuation: Option<Continuation>,
    ) -> Self {
        Node(Arc::new(NodeInner {
            taskname,
            kind,
            assets,
            requirements,
            continuation: Mutex::new(continuation),
            ready: Mutex::new(None),
            canonical: OnceLock::new(),
        }))
    }

    pub(crate) fn external(taskname: String, assets: AssetShape) -> Self {
        Self::build(taskname, NodeKind::External, assets, Shape::None, None)
    }

    pub(crate) fn task(
        taskname: String,
        assets: AssetShape,
        requirements: NodeShape,
        continuation: Continuation,
    ) -> Self {
        Self::build(
            taskname,
            NodeKind::Task,
            assets,
            requirements,
            Some(continuation),
        )
    }

    pub(crate) fn collection(taskname: String, requirements: NodeShape) -> Self {
        Self::build(
            taskname,
            NodeKind::Collection,
            Shape::None,
            requirements,
            None,
        )
    }

    /// The node whose outcome this one reports: itself, or the canonical node
    /// it was redirected to during deduplication.
    fn target(&self) -> &Node {
        match self.0.canonical.get() {
            Some(canonical) => canonical.target(),
            None => self,
        }
    }

    pub fn taskname(&self) -> &str {
        &self.0.taskname
    }

    pub fn kind(&self) -> NodeKind {
        self.target().0.kind
    }

    /// The node's asset(s). A collection reports the assets of its
    /// requirements, flattened into a list.
    pub fn assets(&self) -> AssetShape {
        let node = self.target();
        match node.0.kind {
            NodeKind::Collection => Shape::List(
                node.0
                    .requirements
                    .iter()
                    .flat_map(|req| req.assets().iter().cloned().collect::<Vec<_>>())
                    .collect(),
            ),
            NodeKind::External | NodeKind::Task => node.0.assets.clone(),
        }
    }

    /// Asset reference(s), shaped like [`Node::assets`].
    pub fn refs(&self) -> Value {
        asset::refs(&self.assets())
    }

    /// The requirement(s) in the shape they were declared in.
    pub fn requirements(&self) -> &NodeShape {
        &self.target().0.requirements
    }

    /// Are the asset(s) represented by this node ready?
    ///
    /// Computed on first use and cached until the engine invalidates it
    /// after running a continuation.
    pub fn ready(&self) -> bool {
        let node = self.target();
        let mut cache = lock(&node.0.ready);
        if let Some(ready) = *cache {
            return ready;
        }
        let ready = match node.0.kind {
            NodeKind::External | NodeKind::Task => node.0.assets.iter().all(|a| a.is_ready()),
            NodeKind::Collection => node.0.requirements.iter().all(|r| r.ready()),
        };
        *cache = Some(ready);
        ready
    }

    /// Graphviz DOT text for the graph rooted here.
    pub fn graph(&self) -> String {
        crate::dag::dot::render(self)
    }

    /// Same underlying node, not merely an equivalent one.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.target().0, &other.target().0)
    }

    pub(crate) fn requirements_ready(&self) -> bool {
        self.requirements().iter().all(|r| r.ready())
    }

    pub(crate) fn invalidate(&self) {
        *lock(&self.target().0.ready) = None;
    }

    pub(crate) fn take_continuation(&self) -> Option<Continuation> {
        lock(&self.target().0.continuation).take()
    }

    /// Make this node report `canonical`'s outcome from now on, and drop its
    /// own body so it can never run.
    pub(crate) fn redirect_to(&self, canonical: &Node) {
        if self.ptr_eq(canonical) {
            return;
        }
        lock(&self.0.continuation).take();
        let _ = self.0.canonical.set(canonical.clone());
    }

    /// Log readiness of this node and, when not ready, of each requirement.
    pub(crate) fn report_readiness(&self) {
        let name = self.taskname();
        let ready = self.ready();
        if ready {
            info!(task = %name, "Ready");
            return;
        }

        if self.kind() == NodeKind::External {
            warn!(task = %name, "Not ready [external asset]");
        } else {
            warn!(task = %name, "Not ready");
        }

        let requirements = self.requirements();
        if requirements.is_empty() {
            return;
        }
        warn!(task = %name, "Requires:");
        for req in requirements.iter() {
            let status = if req.ready() { "✔" } else { "✖" };
            warn!(task = %name, "{} {}", status, req.taskname());
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.taskname() == other.taskname()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.taskname().hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("taskname", &self.0.taskname)
            .field("kind", &self.0.kind)
            .field("requirements", &self.requirements().len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
