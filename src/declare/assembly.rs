// src/declare/assembly.rs

//! Turning procedures into a deduplicated node graph.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::dag::{Node, NodeKind};
use crate::declare::procedure::Procedure;
use crate::errors::{Result, StepwiseError};

/// Canonical node per task name, for one run.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: Mutex<HashMap<String, Node>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `node` as canonical for its name, or, if an equivalent node
    /// got there first, redirect `node` to it and return that one instead.
    pub fn canonicalize(&self, node: Node) -> Node {
        let mut nodes = self.lock();
        match nodes.get(node.taskname()) {
            Some(canonical) => {
                debug!(task = %node.taskname(), "deduplicated");
                node.redirect_to(canonical);
                canonical.clone()
            }
            None => {
                nodes.insert(node.taskname().to_string(), node.clone());
                node
            }
        }
    }

    pub fn get(&self, taskname: &str) -> Option<Node> {
        self.lock().get(taskname).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Per-run assembly context, handed to every requirements declaration.
#[derive(Debug)]
pub struct Run {
    id: u64,
    registry: Registry,
    depth: usize,
    /// Names of procedures currently being assembled, outermost first.
    stack: Vec<String>,
}

impl Run {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            registry: Registry::default(),
            depth: 0,
            stack: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Nesting level of the procedure being assembled; the root is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Assemble a requirement and return its canonical node.
    pub fn require(&mut self, procedure: impl Procedure + 'static) -> Result<Node> {
        self.depth += 1;
        let node = self.assemble(Box::new(procedure));
        self.depth -= 1;
        node
    }

    /// Assemble `procedure`, then canonicalize it.
    pub(crate) fn assemble(&mut self, procedure: Box<dyn Procedure>) -> Result<Node> {
        let node = self.build(procedure)?;
        Ok(self.registry.canonicalize(node))
    }

    fn build(&mut self, mut procedure: Box<dyn Procedure>) -> Result<Node> {
        let kind = procedure.kind();
        let taskname = procedure
            .taskname()
            .ok_or_else(|| StepwiseError::missing("<unnamed>", "task name"))?;

        if let Some(start) = self.stack.iter().position(|name| *name == taskname) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(taskname);
            return Err(StepwiseError::Cycle(chain.join(" -> ")));
        }

        trace!("{}{}", "  ".repeat(self.depth), taskname);

        let assets = match kind {
            NodeKind::Task | NodeKind::External => {
                let assets = procedure
                    .assets()
                    .ok_or_else(|| StepwiseError::missing(&taskname, "assets"))?;
                if assets.is_none() {
                    return Err(StepwiseError::declaration(
                        &taskname,
                        format!("Absent assets are only allowed for collections (got {kind})"),
                    ));
                }
                assets
            }
            NodeKind::Collection => Default::default(),
        };

        if kind == NodeKind::External {
            return Ok(Node::external(taskname, assets));
        }

        self.stack.push(taskname.clone());
        let requirements = procedure.requirements(self);
        self.stack.pop();
        let requirements = requirements?
            .ok_or_else(|| StepwiseError::missing(&taskname, "requirements"))?
            .compact()
            .normalized();

        Ok(match kind {
            NodeKind::Collection => Node::collection(taskname, requirements),
            _ => Node::task(taskname, assets, requirements, procedure.into_continuation()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Asset;
    use crate::declare::Decl;
    use crate::types::Shape;

    fn leaf(name: &str) -> Decl {
        Decl::task(name)
            .asset(Asset::new(name, || false))
            .no_requirements()
    }

    #[test]
    fn duplicate_requirements_share_one_canonical_node() {
        let mut run = Run::new(1);
        let root = Decl::collection("root").requires(|run| {
            Ok(Shape::List(vec![run.require(leaf("x"))?, run.require(leaf("x"))?]))
        });
        let root = run.assemble(Box::new(root)).expect("assembles");

        let reqs = root.requirements();
        let first = reqs.at(0).expect("first");
        let second = reqs.at(1).expect("second");
        assert!(first.ptr_eq(second));
        assert_eq!(run.registry().len(), 2);
        assert!(run.is_root());
    }

    #[test]
    fn empty_requirement_list_means_none() {
        let mut run = Run::new(1);
        let decl = Decl::task("t")
            .asset(Asset::new("t", || false))
            .requires(|_| Ok(Shape::List(Vec::new())));
        let node = run.assemble(Box::new(decl)).expect("assembles");
        assert!(node.requirements().is_none());
    }

    #[test]
    fn absent_requirements_are_dropped() {
        let mut run = Run::new(1);
        let decl = Decl::collection("c").requires_optional(|run| {
            Ok(Shape::List(vec![
                None,
                Some(run.require(leaf("a"))?),
                None,
                Some(run.require(leaf("b"))?),
            ]))
        });
        let node = run.assemble(Box::new(decl)).expect("assembles");
        let names: Vec<&str> = node.requirements().iter().map(Node::taskname).collect();
        assert_eq!(names, vec!["a", "b"]);

        let decl = Decl::collection("m").requires_optional(|run| {
            Ok([("a", Some(run.require(leaf("a"))?)), ("gone", None)]
                .into_iter()
                .collect())
        });
        let node = run.assemble(Box::new(decl)).expect("assembles");
        assert!(node.requirements().get("a").is_some());
        assert!(node.requirements().get("gone").is_none());

        let decl = Decl::task("t")
            .asset(Asset::new("t", || false))
            .requires_optional(|_| Ok(Shape::List(vec![None, None])));
        let node = run.assemble(Box::new(decl)).expect("assembles");
        assert!(node.requirements().is_none());
    }

    #[test]
    fn map_requirements_keep_their_keys() {
        let mut run = Run::new(1);
        let decl = Decl::collection("c").requires(|run| {
            Ok([("a", run.require(leaf("a"))?), ("b", run.require(leaf("b"))?)]
                .into_iter()
                .collect())
        });
        let node = run.assemble(Box::new(decl)).expect("assembles");
        assert_eq!(node.requirements().get("b").map(Node::taskname), Some("b"));
    }

    #[test]
    fn missing_assets_is_a_declaration_error() {
        let mut run = Run::new(1);
        let err = run
            .assemble(Box::new(Decl::task("t").no_requirements()))
            .expect_err("no assets");
        assert!(err.is_declaration());
        assert_eq!(err.to_string(), "t: Failed to get assets: Check declaration");
    }

    #[test]
    fn missing_requirements_is_a_declaration_error() {
        let mut run = Run::new(1);
        let err = run
            .assemble(Box::new(Decl::collection("c")))
            .expect_err("no requirements");
        assert_eq!(
            err.to_string(),
            "c: Failed to get requirements: Check declaration"
        );
    }

    #[test]
    fn absent_assets_are_only_allowed_for_collections() {
        let mut run = Run::new(1);
        let err = run
            .assemble(Box::new(Decl::external("e").assets(Shape::None)))
            .expect_err("absent assets");
        assert!(err.is_declaration());
    }

    #[test]
    fn self_requirement_is_reported_as_a_cycle() {
        fn looping() -> Decl {
            Decl::task("loop")
                .asset(Asset::new("loop", || false))
                .requires(|run| Ok(Shape::One(run.require(looping())?)))
        }

        let mut run = Run::new(1);
        let err = run.assemble(Box::new(looping())).expect_err("cycle");
        assert!(matches!(err, StepwiseError::Cycle(ref chain) if chain == "loop -> loop"));
    }
}
