//! The compile pipeline: symbols, expansion, local rules, style resolution.

use crate::ast::{Node, PrimarySelector};
use crate::dom::ElementRegistry;
use crate::expand::{ExpandError, Expander, DEFAULT_MAX_DEPTH};
use crate::style::{prepare_local_rules, Diagnostic, GlobalRule, ResolveError, StyleMap, StyleResolver};
use crate::symbols::SymbolTable;

// ---------------------------------------------------------------------------
// CompileOptions
// ---------------------------------------------------------------------------

/// Configuration for one compile.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Bound on nested template expansion.
    pub max_expansion_depth: usize,
    /// Give an element without a class the first class its local rules name.
    pub auto_add_class: bool,
    /// Give an element without an id the first id its local rules name.
    pub auto_add_id: bool,
    /// Collect local selector rules into the global rule list.
    pub hoist_local_rules: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_DEPTH,
            auto_add_class: true,
            auto_add_id: true,
            hoist_local_rules: true,
        }
    }
}

impl CompileOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum expansion depth (builder).
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    /// Enable or disable automatic classes (builder).
    pub fn with_auto_add_class(mut self, enabled: bool) -> Self {
        self.auto_add_class = enabled;
        self
    }

    /// Enable or disable automatic ids (builder).
    pub fn with_auto_add_id(mut self, enabled: bool) -> Self {
        self.auto_add_id = enabled;
        self
    }

    /// Enable or disable local rule hoisting (builder).
    pub fn with_hoist_local_rules(mut self, enabled: bool) -> Self {
        self.hoist_local_rules = enabled;
        self
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Definitions from another compiled file, merged beneath `namespace`
/// (the global namespace when empty).
#[derive(Debug, Clone, Default)]
pub struct Import {
    pub namespace: Vec<String>,
    pub table: SymbolTable,
}

impl Import {
    pub fn new(table: SymbolTable) -> Self {
        Self {
            namespace: Vec::new(),
            table,
        }
    }

    /// Merge beneath `namespace` (builder).
    pub fn under(mut self, namespace: &[&str]) -> Self {
        self.namespace = namespace.iter().map(|part| (*part).to_owned()).collect();
        self
    }
}

/// Result of a successful compile.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The template-free tree.
    pub tree: Vec<Node>,
    /// Evaluated inline properties per element.
    pub styles: StyleMap,
    /// Evaluated rules for the global stylesheet.
    pub rules: Vec<GlobalRule>,
    /// Properties that failed to evaluate and render as error markers.
    pub diagnostics: Vec<Diagnostic>,
    /// Evaluation order of the styled elements.
    pub order: Vec<PrimarySelector>,
}

/// The single document-level error of a failed compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Runs the pipeline. Holds no state between compiles.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    pub options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile a parsed document.
    ///
    /// Imports are merged first, so a definition in the document replaces an
    /// imported one with the same name, kind and namespace.
    pub fn compile(&self, document: &[Node], imports: Vec<Import>) -> Result<CompileOutput, CompileError> {
        let mut table = SymbolTable::new();
        for import in imports {
            if import.namespace.is_empty() {
                table.merge(import.table);
            } else {
                table.merge_under(import.table, &import.namespace);
            }
        }
        let defined = table.collect(document);
        log::debug!("{defined} definitions collected, {} in scope", table.len());

        let mut tree = Expander::new(&table)
            .with_max_depth(self.options.max_expansion_depth)
            .expand_document(document)?;
        prepare_local_rules(&mut tree, self.options.auto_add_class, self.options.auto_add_id);

        let resolved = {
            let registry = ElementRegistry::build(&tree);
            let resolver = StyleResolver::new(&tree, &registry)
                .with_local_rules(self.options.hoist_local_rules);
            resolver.resolve()?
        };

        Ok(CompileOutput {
            tree,
            styles: resolved.styles,
            rules: resolved.rules,
            diagnostics: resolved.diagnostics,
            order: resolved.order,
        })
    }
}

/// Compile with default options and no imports.
pub fn compile(document: &[Node]) -> Result<CompileOutput, CompileError> {
    Compiler::default().compile(document, Vec::new())
}
