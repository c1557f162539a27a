// src/declare/procedure.rs

//! How a task declares itself.

use std::fmt;

use crate::dag::{Asset, AssetShape, Continuation, NodeKind, NodeShape, RequirementShape};
use crate::declare::assembly::Run;
use crate::errors::Result;
use crate::types::Shape;

/// A task declaration, driven one step at a time by the assembler.
///
/// The assembler asks, in order, for the task name, then (tasks and
/// externals) the assets, then (tasks and collections) the requirements, and
/// finally takes the body of a task. Answering `None` to any step the kind
/// calls for is a declaration error.
///
/// Asset declaration must not have side effects: it runs on every invocation,
/// ready or not. Side effects belong in the body.
pub trait Procedure: Send {
    fn kind(&self) -> NodeKind;

    fn taskname(&mut self) -> Option<String>;

    fn assets(&mut self) -> Option<AssetShape>;

    /// Declare requirements, assembling each one through `run`. Absent
    /// entries are dropped; an empty list or map means no requirements.
    fn requirements(&mut self, run: &mut Run) -> Result<Option<RequirementShape>>;

    /// The task body. Only asked of tasks, and only after the other steps.
    fn into_continuation(self: Box<Self>) -> Continuation {
        Box::new(|| Ok(()))
    }
}

type Requires = Box<dyn FnOnce(&mut Run) -> Result<RequirementShape> + Send>;

/// Builder-style [`Procedure`].
///
/// ```no_run
/// use stepwise::{Asset, Decl, Shape};
///
/// fn greeting(path: &'static str) -> Decl {
///     Decl::task(format!("greeting {path}"))
///         .asset(Asset::file(path))
///         .no_requirements()
///         .body(move || {
///             std::fs::write(path, "hello")?;
///             Ok(())
///         })
/// }
///
/// fn site() -> Decl {
///     Decl::collection("site").requires(|run| {
///         Ok(Shape::List(vec![run.require(greeting("/tmp/index"))?]))
///     })
/// }
/// ```
pub struct Decl {
    kind: NodeKind,
    taskname: Option<String>,
    assets: Option<AssetShape>,
    requires: Option<Requires>,
    body: Option<Continuation>,
}

impl Decl {
    fn new(kind: NodeKind, taskname: impl Into<String>) -> Self {
        Self {
            kind,
            taskname: Some(taskname.into()),
            assets: None,
            requires: None,
            body: None,
        }
    }

    /// A task: assets, requirements, and a body that makes the assets ready.
    pub fn task(taskname: impl Into<String>) -> Self {
        Self::new(NodeKind::Task, taskname)
    }

    /// Assets the workflow observes but cannot produce.
    pub fn external(taskname: impl Into<String>) -> Self {
        Self::new(NodeKind::External, taskname)
    }

    /// A named group of requirements.
    pub fn collection(taskname: impl Into<String>) -> Self {
        Self::new(NodeKind::Collection, taskname)
    }

    /// Declare a single asset.
    pub fn asset(self, asset: Asset) -> Self {
        self.assets(Shape::One(asset))
    }

    pub fn assets(mut self, assets: impl Into<AssetShape>) -> Self {
        self.assets = Some(assets.into());
        self
    }

    /// Declare requirements. `f` receives the run context and should
    /// assemble each requirement with [`Run::require`].
    pub fn requires(
        mut self,
        f: impl FnOnce(&mut Run) -> Result<NodeShape> + Send + 'static,
    ) -> Self {
        self.requires_optional(move |run| f(run).map(Shape::into_present))
    }

    /// Like [`Decl::requires`], but entries may be absent. Absent entries are
    /// dropped at assembly, so a list closes up and a map loses the key.
    pub fn requires_optional(
        mut self,
        f: impl FnOnce(&mut Run) -> Result<RequirementShape> + Send + 'static,
    ) -> Self {
        self.requires = Some(Box::new(f));
        self
    }

    pub fn no_requirements(self) -> Self {
        self.requires(|_| Ok(Shape::None))
    }

    pub fn body(mut self, f: impl FnOnce() -> anyhow::Result<()> + Send + 'static) -> Self {
        self.body = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decl")
            .field("kind", &self.kind)
            .field("taskname", &self.taskname)
            .field("assets", &self.assets)
            .field("requires", &self.requires.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

impl Procedure for Decl {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn taskname(&mut self) -> Option<String> {
        self.taskname.take()
    }

    fn assets(&mut self) -> Option<AssetShape> {
        self.assets.take()
    }

    fn requirements(&mut self, run: &mut Run) -> Result<Option<RequirementShape>> {
        match self.requires.take() {
            Some(f) => f(run).map(Some),
            None => Ok(None),
        }
    }

    fn into_continuation(self: Box<Self>) -> Continuation {
        match self.body {
            Some(body) => body,
            None => Box::new(|| Ok(())),
        }
    }
}
