// src/dag/dot.rs

//! Graphviz DOT rendering of a task graph.
//!
//! This is a read-only walk over declared requirements; it never evaluates
//! anything except the (cached) readiness used for colouring.

use std::collections::BTreeSet;

use crate::dag::node::{Node, NodeKind};

/// Render the graph rooted at `root`.
///
/// Lines are sorted so the same graph always renders to the same text.
pub fn render(root: &Node) -> String {
    let mut vertices = BTreeSet::new();
    let mut edges = BTreeSet::new();
    let mut seen = BTreeSet::new();
    collect(root, &mut seen, &mut vertices, &mut edges);

    let lines: BTreeSet<&String> = vertices.iter().chain(edges.iter()).collect();
    let body: Vec<&str> = lines.into_iter().map(String::as_str).collect();
    format!("digraph g {{\n  {}\n}}", body.join("\n  "))
}

fn collect(
    node: &Node,
    seen: &mut BTreeSet<String>,
    vertices: &mut BTreeSet<String>,
    edges: &mut BTreeSet<String>,
) {
    if !seen.insert(node.taskname().to_string()) {
        return;
    }
    vertices.insert(vertex(node));
    for req in node.requirements().iter() {
        edges.insert(format!("{} -> {}", vertex_id(node), vertex_id(req)));
        collect(req, seen, vertices, edges);
    }
}

fn vertex(node: &Node) -> String {
    let color = if node.ready() { "palegreen" } else { "orange" };
    let shape = match node.kind() {
        NodeKind::Task => "box",
        NodeKind::External => "ellipse",
        NodeKind::Collection => "folder",
    };
    format!(
        "{} [fillcolor={}, label=\"{}\", shape={}, style=filled]",
        vertex_id(node),
        color,
        escape(node.taskname()),
        shape
    )
}

/// Stable identifier derived from the task name, valid as a DOT ID.
fn vertex_id(node: &Node) -> String {
    format!("_{}", blake3::hash(node.taskname().as_bytes()).to_hex())
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Asset;
    use crate::types::Shape;

    #[test]
    fn renders_vertices_and_edges() {
        let leaf = Node::external("leaf \"x\"".into(), Shape::One(Asset::new("x", || true)));
        let root = Node::task(
            "root".into(),
            Shape::One(Asset::new("r", || false)),
            Shape::List(vec![leaf.clone(), leaf.clone()]),
            Box::new(|| Ok(())),
        );

        let dot = render(&root);
        let root_id = vertex_id(&root);
        let leaf_id = vertex_id(&leaf);

        assert!(dot.starts_with("digraph g {\n"));
        assert!(dot.ends_with("\n}"));
        assert!(dot.contains(&format!(
            "{root_id} [fillcolor=orange, label=\"root\", shape=box, style=filled]"
        )));
        assert!(dot.contains(&format!(
            "{leaf_id} [fillcolor=palegreen, label=\"leaf \\\"x\\\"\", shape=ellipse, style=filled]"
        )));
        assert_eq!(dot.matches(&format!("{root_id} -> {leaf_id}")).count(), 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = Node::external("a".into(), Shape::One(Asset::new("a", || true)));
        let b = Node::external("b".into(), Shape::One(Asset::new("b", || true)));
        let all = Node::collection("all".into(), Shape::List(vec![b, a]));
        assert_eq!(render(&all), render(&all));
        assert!(render(&all).contains("shape=folder"));
    }
}
