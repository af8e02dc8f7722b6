//! Document nodes: elements, text, style blocks, definitions and usages.

use std::fmt;

use indexmap::IndexMap;

use super::expr::ExprAst;
use super::selector::Selector;

/// Ordered property name → expression map of a style block.
pub type PropertyMap = IndexMap<String, ExprAst>;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Style(StyleBlock),
    /// A `@Element Name;` usage awaiting expansion.
    Usage(Usage),
    Template(TemplateDef),
    Custom(CustomDef),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Text {
            value: value.into(),
        })
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<StyleBlock> for Node {
    fn from(block: StyleBlock) -> Self {
        Node::Style(block)
    }
}

impl From<Usage> for Node {
    fn from(usage: Usage) -> Self {
        Node::Usage(usage)
    }
}

/// An element with ordered attributes and owned children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute (builder).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child (builder).
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children (builder).
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    /// Whitespace-separated class tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|classes| classes.split_whitespace())
            .into_iter()
            .flatten()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class token. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let entry = self.attributes.entry("class".to_owned()).or_default();
        if !entry.trim().is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
    }

    pub fn set_id(&mut self, id: &str) {
        self.attributes.insert("id".to_owned(), id.to_owned());
    }

    /// Child elements, skipping text, style and usage nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Style block children, in order.
    pub fn style_blocks(&self) -> impl Iterator<Item = &StyleBlock> {
        self.children.iter().filter_map(|child| match child {
            Node::Style(block) => Some(block),
            _ => None,
        })
    }

    /// The last style block child, created at the front if absent. Properties
    /// written here win over every other block of the element.
    pub fn style_or_insert(&mut self) -> &mut StyleBlock {
        let position = self
            .children
            .iter()
            .rposition(|child| matches!(child, Node::Style(_)));
        let index = match position {
            Some(index) => index,
            None => {
                self.children.insert(0, Node::Style(StyleBlock::new()));
                0
            }
        };
        match &mut self.children[index] {
            Node::Style(block) => block,
            _ => unreachable!("index points at a style block"),
        }
    }

    /// The expression of an inline property. Later style blocks win.
    pub fn inline_property(&self, name: &str) -> Option<&ExprAst> {
        self.style_blocks()
            .filter_map(|block| block.inline.get(name))
            .last()
    }

    /// All inline properties across style blocks, merged in declaration order.
    pub fn inline_properties(&self) -> IndexMap<&str, &ExprAst> {
        let mut merged = IndexMap::new();
        for block in self.style_blocks() {
            for (name, expr) in &block.inline {
                merged.insert(name.as_str(), expr);
            }
        }
        merged
    }

    pub fn has_inline_style(&self) -> bool {
        self.style_blocks().any(|block| !block.inline.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub value: String,
}

/// A `style { ... }` block: inline properties, selector rules, template
/// usages and property deletions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleBlock {
    pub inline: PropertyMap,
    pub rules: Vec<SelectorRule>,
    pub usages: Vec<Usage>,
    pub deletions: Vec<String>,
}

impl StyleBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an inline property (builder).
    pub fn with_property(mut self, name: impl Into<String>, value: ExprAst) -> Self {
        self.inline.insert(name.into(), value);
        self
    }

    pub fn with_rule(mut self, rule: SelectorRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usages.push(usage);
        self
    }

    pub fn with_deletion(mut self, property: impl Into<String>) -> Self {
        self.deletions.push(property.into());
        self
    }
}

/// A selector rule inside a style block, e.g. `.card:hover { ... }`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorRule {
    pub selector: String,
    pub properties: PropertyMap,
}

impl SelectorRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: ExprAst) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// The three kinds of template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Style,
    Element,
    Var,
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefKind::Style => f.write_str("@Style"),
            DefKind::Element => f.write_str("@Element"),
            DefKind::Var => f.write_str("@Var"),
        }
    }
}

/// Body of a template or custom definition. The variant fixes its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DefBody {
    Style(StyleBlock),
    Element(Vec<Node>),
    Var(IndexMap<String, ExprAst>),
}

impl DefBody {
    pub fn kind(&self) -> DefKind {
        match self {
            DefBody::Style(_) => DefKind::Style,
            DefBody::Element(_) => DefKind::Element,
            DefBody::Var(_) => DefKind::Var,
        }
    }
}

/// `[Template] @Kind Name { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDef {
    pub name: String,
    pub namespace: Vec<String>,
    pub body: DefBody,
}

impl TemplateDef {
    pub fn new(name: impl Into<String>, body: DefBody) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
            body,
        }
    }

    pub fn in_namespace(mut self, path: &[&str]) -> Self {
        self.namespace = path.iter().map(|part| (*part).to_owned()).collect();
        self
    }

    pub fn kind(&self) -> DefKind {
        self.body.kind()
    }
}

/// `[Custom] @Kind Name { ... }`: a template whose usages may be specialized.
///
/// Style customs may declare valueless properties (`color;`) that each usage
/// fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDef {
    pub name: String,
    pub namespace: Vec<String>,
    pub body: DefBody,
    pub valueless: Vec<String>,
}

impl CustomDef {
    pub fn new(name: impl Into<String>, body: DefBody) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
            body,
            valueless: Vec::new(),
        }
    }

    pub fn in_namespace(mut self, path: &[&str]) -> Self {
        self.namespace = path.iter().map(|part| (*part).to_owned()).collect();
        self
    }

    pub fn with_valueless(mut self, properties: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.valueless.extend(properties.into_iter().map(Into::into));
        self
    }

    pub fn kind(&self) -> DefKind {
        self.body.kind()
    }
}

/// A stored definition: either a template or a custom.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Template(TemplateDef),
    Custom(CustomDef),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Template(def) => &def.name,
            Definition::Custom(def) => &def.name,
        }
    }

    pub fn kind(&self) -> DefKind {
        self.body().kind()
    }

    pub fn namespace(&self) -> &[String] {
        match self {
            Definition::Template(def) => &def.namespace,
            Definition::Custom(def) => &def.namespace,
        }
    }

    pub fn body(&self) -> &DefBody {
        match self {
            Definition::Template(def) => &def.body,
            Definition::Custom(def) => &def.body,
        }
    }

    /// Valueless property declarations (customs only).
    pub fn valueless(&self) -> &[String] {
        match self {
            Definition::Template(_) => &[],
            Definition::Custom(def) => &def.valueless,
        }
    }
}

impl From<TemplateDef> for Definition {
    fn from(def: TemplateDef) -> Self {
        Definition::Template(def)
    }
}

impl From<CustomDef> for Definition {
    fn from(def: CustomDef) -> Self {
        Definition::Custom(def)
    }
}

/// A usage site: `@Style Name;`, `@Element Name from a.b { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    pub kind: DefKind,
    pub name: String,
    /// Namespace path of the `from` clause. Empty means the enclosing scope.
    pub from_namespace: Vec<String>,
    pub specializations: Vec<Specialization>,
}

impl Usage {
    pub fn new(kind: DefKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            from_namespace: Vec::new(),
            specializations: Vec::new(),
        }
    }

    pub fn style(name: impl Into<String>) -> Self {
        Self::new(DefKind::Style, name)
    }

    pub fn element(name: impl Into<String>) -> Self {
        Self::new(DefKind::Element, name)
    }

    /// Set the `from` namespace path (builder).
    pub fn from(mut self, path: &[&str]) -> Self {
        self.from_namespace = path.iter().map(|part| (*part).to_owned()).collect();
        self
    }

    /// Append a specialization (builder).
    pub fn with(mut self, specialization: Specialization) -> Self {
        self.specializations.push(specialization);
        self
    }

    /// A usage without specializations expands to a plain copy.
    pub fn is_plain(&self) -> bool {
        self.specializations.is_empty()
    }
}

/// Where an `insert` places its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
    Replace,
    AtTop,
    AtBottom,
}

/// What a `delete` removes.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    /// A style property, or an attribute of the top-level elements of an
    /// element template.
    Property(String),
    /// A top-level element of an element template, e.g. `span[1]`.
    Element(Selector),
    /// A nested template usage, e.g. `delete @Style Base;`.
    Inherited { kind: DefKind, name: String },
}

/// A modification applied to an expanded template at its usage site.
#[derive(Debug, Clone, PartialEq)]
pub enum Specialization {
    Delete {
        targets: Vec<DeleteTarget>,
    },
    Insert {
        position: InsertPosition,
        /// Unused for `AtTop` / `AtBottom`.
        target_selector: Option<Selector>,
        content: Vec<Node>,
    },
    /// Element overrides matched against the expansion by tag.
    StyleOverride {
        tree: Vec<Node>,
    },
    /// Property values for a style usage; fills valueless custom properties.
    SetProperties {
        properties: PropertyMap,
    },
}
