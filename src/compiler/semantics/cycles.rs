use log::debug;

use crate::diagnostics::{Code, Reporter};

/// Directed graph keyed by struct name. Nodes and edge lists keep insertion
/// order so detection and diagnostics are deterministic.
#[derive(Debug, Default)]
pub struct StructGraph {
    nodes: Vec<(String, Vec<String>)>,
}

impl StructGraph {
    pub fn new() -> StructGraph {
        StructGraph { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.nodes.iter().any(|(n, _)| n == name) {
            self.nodes.push((name.to_string(), Vec::new()));
        }
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        let edges = &mut self
            .nodes
            .iter_mut()
            .find(|(n, _)| n == from)
            .unwrap()
            .1;
        edges.push(to.to_string());
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(n, _)| n.as_str())
    }

    pub fn neighbors(&self, name: &str) -> &[String] {
        self.nodes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Unvisited,
    Visiting,
    Visited,
}

/// Which relationship a graph encodes; picks the diagnostic wording.
#[derive(Clone, Copy, PartialEq)]
pub enum GraphKind {
    Inheritance,
    Dependency,
}

/// Three-color depth-first search over a struct graph. Hitting a node that
/// is still on the current path means a cycle; the offending path is
/// reported as `a -> b -> ... -> a`. Returns whether any cycle was found.
pub fn detect_cycles(graph: &StructGraph, kind: GraphKind, reporter: &mut Reporter) -> bool {
    let names: Vec<String> = graph.nodes().map(|n| n.to_string()).collect();
    let mut colors: Vec<Color> = vec![Color::Unvisited; names.len()];
    let mut path: Vec<String> = Vec::new();
    let mut found = false;

    for i in 0..names.len() {
        if colors[i] == Color::Unvisited
            && visit(graph, &names, &names[i], kind, &mut colors, &mut path, reporter)
        {
            found = true;
        }
    }
    debug!(
        "cycle detection over {} struct(s): {}",
        names.len(),
        if found { "cyclic" } else { "acyclic" }
    );
    found
}

fn visit(
    graph: &StructGraph,
    names: &[String],
    node: &str,
    kind: GraphKind,
    colors: &mut Vec<Color>,
    path: &mut Vec<String>,
    reporter: &mut Reporter,
) -> bool {
    let index = match names.iter().position(|n| n == node) {
        Some(i) => i,
        // Edges may name structs that were never declared; the checker
        // reports those separately.
        None => return false,
    };
    colors[index] = Color::Visiting;
    path.push(node.to_string());

    let mut found = false;
    for next in graph.neighbors(node) {
        let next_index = names.iter().position(|n| n == next);
        match next_index.map(|i| colors[i]) {
            Some(Color::Visiting) => {
                let start = path.iter().position(|p| p == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(next.clone());
                let wording = match kind {
                    GraphKind::Inheritance => "cyclic inheritance",
                    GraphKind::Dependency => "cyclic struct dependency",
                };
                reporter.report(
                    Code::CyclicDependency,
                    format!("{}: {}", wording, cycle.join(" -> ")),
                );
                found = true;
            }
            Some(Color::Unvisited) => {
                if visit(graph, names, next, kind, colors, path, reporter) {
                    found = true;
                }
            }
            Some(Color::Visited) | None => {}
        }
    }

    path.pop();
    colors[index] = Color::Visited;
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_graph_is_clean() {
        let mut g = StructGraph::new();
        g.add_edge("B", "A");
        g.add_node("A");
        let mut reporter = Reporter::new();
        assert!(!detect_cycles(&g, GraphKind::Inheritance, &mut reporter));
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn two_cycle_reports_the_path() {
        let mut g = StructGraph::new();
        g.add_edge("A", "B");
        g.add_edge("B", "A");
        let mut reporter = Reporter::new();
        assert!(detect_cycles(&g, GraphKind::Inheritance, &mut reporter));
        let rendered = reporter.render();
        assert!(rendered.contains("14.1"));
        assert!(rendered.contains("cyclic inheritance"));
        assert!(rendered.contains("A -> B -> A"));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut g = StructGraph::new();
        g.add_edge("NODE", "NODE");
        let mut reporter = Reporter::new();
        assert!(detect_cycles(&g, GraphKind::Dependency, &mut reporter));
        assert!(reporter.render().contains("cyclic struct dependency: NODE -> NODE"));
    }

    #[test]
    fn edge_to_unknown_struct_is_not_a_cycle() {
        let mut g = StructGraph::new();
        g.add_edge("A", "GHOST");
        let mut reporter = Reporter::new();
        assert!(!detect_cycles(&g, GraphKind::Dependency, &mut reporter));
    }

    #[test]
    fn longer_cycle_found_once() {
        let mut g = StructGraph::new();
        g.add_edge("A", "B");
        g.add_edge("B", "C");
        g.add_edge("C", "A");
        let mut reporter = Reporter::new();
        assert!(detect_cycles(&g, GraphKind::Inheritance, &mut reporter));
        assert_eq!(reporter.diagnostics().len(), 1);
        assert!(reporter.render().contains("A -> B -> C -> A"));
    }
}
