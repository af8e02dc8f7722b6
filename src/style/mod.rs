//! Style resolution: dependency ordering, memoized evaluation, output maps.

pub mod graph;
pub mod hoist;
pub mod output;
pub mod resolver;

use crate::ast::PrimarySelector;

pub use graph::DependencyGraph;
pub use hoist::prepare_local_rules;
pub use output::{render_stylesheet, GlobalRule, StyleMap};
pub use resolver::{error_marker, resolve, Diagnostic, ResolvedStyles, StyleResolver};

/// Compile-fatal resolution errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// Elements whose styles reference each other in a loop.
    #[error("circular style dependency: {}", join_cycle(.cycle))]
    CircularDependency { cycle: Vec<PrimarySelector> },
    /// Properties of one element that reference each other in a loop.
    #[error("circular property reference in {selector}: {}", .cycle.join(" -> "))]
    CircularProperty {
        selector: PrimarySelector,
        cycle: Vec<String>,
    },
}

fn join_cycle(cycle: &[PrimarySelector]) -> String {
    cycle
        .iter()
        .map(PrimarySelector::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
