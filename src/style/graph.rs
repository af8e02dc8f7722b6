//! Cross-element style dependencies.
//!
//! Nodes are primary selectors; an edge `a -> b` means one of `a`'s inline
//! properties reads a property of `b`.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::ast::PrimarySelector;
use crate::dom::ElementRegistry;

use super::ResolveError;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: IndexMap<PrimarySelector, IndexSet<PrimarySelector>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over every element with inline styles, in document order.
    ///
    /// References whose selector matches nothing add no edge; they surface
    /// during evaluation instead.
    pub fn build(registry: &ElementRegistry<'_>) -> Self {
        let mut graph = Self::new();
        for (id, element) in registry.iter() {
            if !element.has_inline_style() {
                continue;
            }
            let Some(source) = registry.primary_selector(id) else {
                continue;
            };
            graph.add_node(source.clone());

            for expr in element.inline_properties().values() {
                for (selector, _) in expr.cross_refs() {
                    let target = registry
                        .first(selector)
                        .and_then(|target| registry.primary_selector(target));
                    if let Some(target) = target {
                        graph.add_edge(source.clone(), target.clone());
                    }
                }
            }
        }
        graph
    }

    pub fn add_node(&mut self, node: PrimarySelector) {
        self.edges.entry(node).or_default();
    }

    /// Add `from -> to`, adding both nodes. Self-edges are ignored: reads of
    /// an element's own properties are ordered by the resolver.
    pub fn add_edge(&mut self, from: PrimarySelector, to: PrimarySelector) {
        if from == to {
            self.add_node(from);
            return;
        }
        self.edges.entry(from).or_default().insert(to.clone());
        self.add_node(to);
    }

    /// Direct dependencies of `node`, in insertion order.
    pub fn dependencies(&self, node: &str) -> impl Iterator<Item = &PrimarySelector> {
        self.edges.get(node).into_iter().flatten()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PrimarySelector> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    /// Every node after all of its dependencies.
    ///
    /// Iterative depth-first search over nodes in insertion order. The DFS
    /// stack is the current path; reaching a node that is still on it is a
    /// cycle, reported from its first occurrence back to itself.
    pub fn topological_order(&self) -> Result<Vec<PrimarySelector>, ResolveError> {
        let mut order = Vec::with_capacity(self.edges.len());
        let mut done: HashSet<&PrimarySelector> = HashSet::new();
        let mut on_path: HashSet<&PrimarySelector> = HashSet::new();

        for start in self.edges.keys() {
            if done.contains(start) {
                continue;
            }
            // (node, index of the next dependency to visit)
            let mut stack: Vec<(&PrimarySelector, usize)> = vec![(start, 0)];
            on_path.insert(start);

            while let Some(&(node, next)) = stack.last() {
                let dependency = self.edges.get(node).and_then(|deps| deps.get_index(next));
                let Some(dependency) = dependency else {
                    stack.pop();
                    on_path.remove(node);
                    done.insert(node);
                    order.push(node.clone());
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                if on_path.contains(dependency) {
                    let from = stack
                        .iter()
                        .position(|(entry, _)| *entry == dependency)
                        .unwrap_or(0);
                    let mut cycle: Vec<PrimarySelector> =
                        stack[from..].iter().map(|(entry, _)| (*entry).clone()).collect();
                    cycle.push(dependency.clone());
                    return Err(ResolveError::CircularDependency { cycle });
                }
                if !done.contains(dependency) {
                    on_path.insert(dependency);
                    stack.push((dependency, 0));
                }
            }
        }

        log::debug!(
            "style evaluation order: {}",
            order
                .iter()
                .map(PrimarySelector::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Element, ExprAst, Node, Selector, StyleBlock};

    fn sel(value: &str) -> PrimarySelector {
        PrimarySelector::from(value)
    }

    fn position(order: &[PrimarySelector], node: &str) -> usize {
        order.iter().position(|entry| entry.as_str() == node).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(sel("#c"), sel("#b"));
        graph.add_edge(sel("#b"), sel("#a"));
        graph.add_edge(sel("#d"), sel("#a"));
        graph.add_node(sel("#e"));

        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 5);
        assert!(position(&order, "#a") < position(&order, "#b"));
        assert!(position(&order, "#b") < position(&order, "#c"));
        assert!(position(&order, "#a") < position(&order, "#d"));
    }

    #[test]
    fn diamond() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(sel("top"), sel(".left"));
        graph.add_edge(sel("top"), sel(".right"));
        graph.add_edge(sel(".left"), sel("#base"));
        graph.add_edge(sel(".right"), sel("#base"));

        let order = graph.topological_order().unwrap();
        let names: Vec<&str> = order.iter().map(PrimarySelector::as_str).collect();
        assert_eq!(names, vec!["#base", ".left", ".right", "top"]);
    }

    #[test]
    fn two_node_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(sel("#a"), sel("#b"));
        graph.add_edge(sel("#b"), sel("#a"));

        let err = graph.topological_order().unwrap_err();
        assert_eq!(
            err,
            ResolveError::CircularDependency {
                cycle: vec![sel("#a"), sel("#b"), sel("#a")],
            }
        );
        assert_eq!(err.to_string(), "circular style dependency: #a -> #b -> #a");
    }

    #[test]
    fn cycle_reported_without_prefix() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(sel("#entry"), sel("#x"));
        graph.add_edge(sel("#x"), sel("#y"));
        graph.add_edge(sel("#y"), sel("#z"));
        graph.add_edge(sel("#z"), sel("#x"));

        let Err(ResolveError::CircularDependency { cycle }) = graph.topological_order() else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle, vec![sel("#x"), sel("#y"), sel("#z"), sel("#x")]);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut graph = DependencyGraph::new();
        for i in 0..20_000 {
            graph.add_edge(sel(&format!("#n{i}")), sel(&format!("#n{}", i + 1)));
        }
        let order = graph.topological_order().unwrap();
        assert_eq!(order.first().map(PrimarySelector::as_str), Some("#n20000"));
        assert_eq!(order.last().map(PrimarySelector::as_str), Some("#n0"));
    }

    #[test]
    fn self_edge_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(sel("#a"), sel("#a"));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.topological_order().unwrap(), vec![sel("#a")]);
    }

    #[test]
    fn build_from_registry() {
        let nodes: Vec<Node> = vec![
            Element::new("div")
                .with_attribute("id", "box")
                .with_child(StyleBlock::new().with_property("width", ExprAst::dim(100.0, "px")))
                .into(),
            Element::new("p")
                .with_child(
                    StyleBlock::new()
                        .with_property("height", ExprAst::prop_of(Selector::id("box"), "width"))
                        .with_property("margin", ExprAst::prop_of(Selector::id("nowhere"), "width")),
                )
                .into(),
            Element::new("span").into(),
        ];
        let registry = ElementRegistry::build(&nodes);
        let graph = DependencyGraph::build(&registry);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies("p").collect::<Vec<_>>(), vec![&sel("#box")]);
    }
}
