//! Template and custom expansion.
//!
//! The expander rewrites every usage in a document into owned copies of the
//! referenced definitions, applies usage-site specializations, substitutes
//! variable references and leaves a template-free tree behind.

mod expander;
mod specialize;
mod vars;

use crate::ast::{DefKind, Node, Usage};
use crate::symbols::{display_path, SymbolTable};

pub use expander::{Expander, DEFAULT_MAX_DEPTH};

/// Compile-fatal expansion errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpandError {
    #[error("undefined {kind} '{name}' (looked up from namespace '{}')", display_path(.namespace))]
    UndefinedTemplate {
        name: String,
        kind: DefKind,
        namespace: Vec<String>,
    },
    #[error("cyclic template expansion through '{name}'")]
    CyclicTemplateExpansion { name: String },
    #[error("variable group '{group}' has no variable '{var}'")]
    UndefinedVariable { group: String, var: String },
    #[error("expansion of '{name}' exceeds the maximum depth of {depth}")]
    ExpansionTooDeep { name: String, depth: usize },
    #[error("{kind} '{name}' cannot be used in {context}")]
    MisplacedUsage {
        name: String,
        kind: DefKind,
        context: &'static str,
    },
}

/// Expand a single usage against `table`.
///
/// Element usages yield the expanded nodes; a style usage yields one style
/// block carrying the merged properties.
pub fn expand(usage: &Usage, table: &SymbolTable) -> Result<Vec<Node>, ExpandError> {
    Expander::new(table).expand_usage(usage)
}

/// Resolve `Group(var)` to its bound value in source form, following
/// variables bound to other variables.
pub fn resolve_var(group: &str, var: &str, table: &SymbolTable) -> Result<String, ExpandError> {
    Expander::new(table)
        .resolve_var(group, var)
        .map(|value| value.to_string())
}
