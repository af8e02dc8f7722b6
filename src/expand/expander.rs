//! Usage expansion over a stack of active definitions.
//!
//! Each definition being expanded pushes a [`Frame`]. The stack serves three
//! purposes: nested usages without a `from` clause resolve from the namespace
//! of the innermost frame, a frame that is already on the stack means a cycle,
//! and the stack height is bounded by the configured maximum depth.

use crate::ast::{
    DefBody, DefKind, DeleteTarget, Element, Node, PropertyMap, Specialization, StyleBlock, Usage,
};
use crate::symbols::{Resolved, SymbolTable};

use super::specialize;
use super::ExpandError;

/// Default bound on nested template expansion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One definition being expanded.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Frame {
    kind: DefKind,
    name: String,
    namespace: Vec<String>,
}

impl Frame {
    pub(super) fn new(kind: DefKind, name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace,
        }
    }

    fn of(resolved: Resolved<'_>) -> Self {
        Self::new(
            resolved.definition.kind(),
            resolved.definition.name(),
            resolved.namespace,
        )
    }
}

/// Expands usages against one symbol table.
///
/// Definitions are never handed out: every expansion clones the stored body,
/// so results can be mutated freely.
pub struct Expander<'t> {
    table: &'t SymbolTable,
    max_depth: usize,
    stack: Vec<Frame>,
}

impl<'t> Expander<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self {
            table,
            max_depth: DEFAULT_MAX_DEPTH,
            stack: Vec::new(),
        }
    }

    /// Set the maximum nesting depth (builder).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand a whole document into a template-free tree.
    ///
    /// Definitions are dropped from the output; collect them into the symbol
    /// table first. A tree without usages comes back unchanged.
    pub fn expand_document(&mut self, nodes: &[Node]) -> Result<Vec<Node>, ExpandError> {
        self.expand_nodes(nodes)
    }

    pub fn expand_element(&mut self, element: &Element) -> Result<Element, ExpandError> {
        Ok(Element {
            tag: element.tag.clone(),
            attributes: element.attributes.clone(),
            children: self.expand_nodes(&element.children)?,
        })
    }

    /// Merge a style block's usages into its inline properties, apply its
    /// deletions and substitute variables. The result has no usages left.
    pub fn expand_style_block(&mut self, block: &StyleBlock) -> Result<StyleBlock, ExpandError> {
        let inline = self.merge_style(block, &[])?;
        let mut rules = block.rules.clone();
        for rule in &mut rules {
            self.substitute_map(&mut rule.properties)?;
        }
        Ok(StyleBlock {
            inline,
            rules,
            usages: Vec::new(),
            deletions: Vec::new(),
        })
    }

    /// Expand one usage into owned nodes.
    pub fn expand_usage(&mut self, usage: &Usage) -> Result<Vec<Node>, ExpandError> {
        match usage.kind {
            DefKind::Element => self.expand_element_usage(usage),
            DefKind::Style => {
                let inline = self.expand_style_usage(usage)?;
                Ok(vec![Node::Style(StyleBlock {
                    inline,
                    ..StyleBlock::default()
                })])
            }
            DefKind::Var => Err(misplaced(usage, "element content")),
        }
    }

    pub(super) fn table(&self) -> &'t SymbolTable {
        self.table
    }

    /// Namespace that unqualified usages resolve from.
    pub(super) fn scope(&self) -> &[String] {
        self.stack
            .last()
            .map_or(&[], |frame| frame.namespace.as_slice())
    }

    /// Run `f` with `frame` pushed, failing on a cycle or when too deep.
    pub(super) fn with_frame<T>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> Result<T, ExpandError>,
    ) -> Result<T, ExpandError> {
        if self.stack.contains(&frame) {
            return Err(ExpandError::CyclicTemplateExpansion { name: frame.name });
        }
        if self.stack.len() >= self.max_depth {
            return Err(ExpandError::ExpansionTooDeep {
                name: frame.name,
                depth: self.max_depth,
            });
        }
        self.stack.push(frame);
        let result = f(self);
        self.stack.pop();
        result
    }

    fn expand_nodes<'n>(
        &mut self,
        nodes: impl IntoIterator<Item = &'n Node>,
    ) -> Result<Vec<Node>, ExpandError> {
        let mut expanded = Vec::new();
        for node in nodes {
            match node {
                Node::Element(element) => expanded.push(Node::Element(self.expand_element(element)?)),
                Node::Text(_) => expanded.push(node.clone()),
                Node::Style(block) => expanded.push(Node::Style(self.expand_style_block(block)?)),
                Node::Usage(usage) => expanded.extend(self.expand_usage(usage)?),
                Node::Template(_) | Node::Custom(_) => {}
            }
        }
        Ok(expanded)
    }

    fn resolve(&self, usage: &Usage) -> Result<Resolved<'t>, ExpandError> {
        let path = if usage.from_namespace.is_empty() {
            self.scope().to_vec()
        } else {
            usage.from_namespace.clone()
        };
        match self.table.lookup_scoped(&usage.name, usage.kind, &path) {
            Some(resolved) => Ok(resolved),
            None => Err(ExpandError::UndefinedTemplate {
                name: usage.name.clone(),
                kind: usage.kind,
                namespace: path,
            }),
        }
    }

    fn expand_element_usage(&mut self, usage: &Usage) -> Result<Vec<Node>, ExpandError> {
        let resolved = self.resolve(usage)?;
        let body = match resolved.definition.body() {
            DefBody::Element(nodes) => nodes,
            other => unreachable!("element lookup returned a {} body", other.kind()),
        };
        let skipped = inherited_deletions(usage);
        let mut nodes = self.with_frame(Frame::of(resolved), |this| {
            this.expand_nodes(body.iter().filter(|node| match node {
                Node::Usage(nested) => !is_skipped(nested, &skipped),
                _ => true,
            }))
        })?;

        if !usage.is_plain() {
            let specializations = self.expand_specializations(&usage.specializations)?;
            specialize::apply_to_nodes(&mut nodes, &specializations, usage);
        }
        Ok(nodes)
    }

    fn expand_style_usage(&mut self, usage: &Usage) -> Result<PropertyMap, ExpandError> {
        let resolved = self.resolve(usage)?;
        let definition = resolved.definition;
        let body = match definition.body() {
            DefBody::Style(block) => block,
            other => unreachable!("style lookup returned a {} body", other.kind()),
        };
        let skipped = inherited_deletions(usage);
        let mut properties =
            self.with_frame(Frame::of(resolved), |this| this.merge_style(body, &skipped))?;

        if !usage.is_plain() {
            let specializations = self.expand_specializations(&usage.specializations)?;
            specialize::apply_to_properties(&mut properties, &specializations, usage);
        }
        for name in definition.valueless() {
            if !properties.contains_key(name) {
                log::warn!(
                    "valueless property '{name}' of {} '{}' was not given a value; dropped",
                    definition.kind(),
                    definition.name()
                );
            }
        }
        Ok(properties)
    }

    /// Usage properties in order, later winning, then the block's own
    /// properties, then its deletions.
    fn merge_style(
        &mut self,
        block: &StyleBlock,
        skipped: &[(DefKind, &str)],
    ) -> Result<PropertyMap, ExpandError> {
        let mut properties = PropertyMap::new();
        for usage in block.usages.iter().filter(|usage| !is_skipped(usage, skipped)) {
            if usage.kind != DefKind::Style {
                return Err(misplaced(usage, "a style block"));
            }
            properties.extend(self.expand_style_usage(usage)?);
        }
        properties.extend(block.inline.iter().map(|(name, expr)| (name.clone(), expr.clone())));
        for name in &block.deletions {
            properties.shift_remove(name);
        }
        self.substitute_map(&mut properties)?;
        Ok(properties)
    }

    /// Expand usages inside inserted content and override trees, and
    /// substitute variables in property values, all in the usage-site scope.
    fn expand_specializations(
        &mut self,
        specializations: &[Specialization],
    ) -> Result<Vec<Specialization>, ExpandError> {
        specializations
            .iter()
            .map(|specialization| {
                Ok(match specialization {
                    Specialization::Insert {
                        position,
                        target_selector,
                        content,
                    } => Specialization::Insert {
                        position: *position,
                        target_selector: target_selector.clone(),
                        content: self.expand_nodes(content)?,
                    },
                    Specialization::StyleOverride { tree } => Specialization::StyleOverride {
                        tree: self.expand_nodes(tree)?,
                    },
                    Specialization::SetProperties { properties } => {
                        let mut properties = properties.clone();
                        self.substitute_map(&mut properties)?;
                        Specialization::SetProperties { properties }
                    }
                    Specialization::Delete { .. } => specialization.clone(),
                })
            })
            .collect()
    }
}

/// `delete @Kind Name;` targets of a usage.
fn inherited_deletions(usage: &Usage) -> Vec<(DefKind, &str)> {
    usage
        .specializations
        .iter()
        .filter_map(|specialization| match specialization {
            Specialization::Delete { targets } => Some(targets),
            _ => None,
        })
        .flatten()
        .filter_map(|target| match target {
            DeleteTarget::Inherited { kind, name } => Some((*kind, name.as_str())),
            _ => None,
        })
        .collect()
}

fn is_skipped(usage: &Usage, skipped: &[(DefKind, &str)]) -> bool {
    skipped.contains(&(usage.kind, usage.name.as_str()))
}

fn misplaced(usage: &Usage, context: &'static str) -> ExpandError {
    ExpandError::MisplacedUsage {
        name: usage.name.clone(),
        kind: usage.kind,
        context,
    }
}
