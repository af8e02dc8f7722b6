//! Registering the definitions declared in a document.

use crate::ast::Node;

use super::table::SymbolTable;

impl SymbolTable {
    /// Build a table from the definitions declared in `nodes`.
    pub fn from_document(nodes: &[Node]) -> Self {
        let mut table = Self::new();
        table.collect(nodes);
        table
    }

    /// Define every template and custom found in `nodes`, each in its own
    /// namespace. Definitions nested inside elements are found too.
    ///
    /// Returns the number of definitions registered.
    pub fn collect(&mut self, nodes: &[Node]) -> usize {
        let mut count = 0;
        for node in nodes {
            match node {
                Node::Template(def) => {
                    self.define(def.clone(), &def.namespace);
                    count += 1;
                }
                Node::Custom(def) => {
                    self.define(def.clone(), &def.namespace);
                    count += 1;
                }
                Node::Element(element) => count += self.collect(&element.children),
                Node::Text(_) | Node::Style(_) | Node::Usage(_) => {}
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{
        CustomDef, DefBody, DefKind, Element, ExprAst, Node, StyleBlock, TemplateDef, Usage,
    };
    use crate::symbols::SymbolTable;

    #[test]
    fn collects_top_level_and_nested() {
        let document = vec![
            Node::Template(TemplateDef::new(
                "Text",
                DefBody::Style(StyleBlock::new().with_property("color", ExprAst::literal("black"))),
            )),
            Node::Custom(
                CustomDef::new("Box", DefBody::Element(vec![Element::new("div").into()]))
                    .in_namespace(&["ui"]),
            ),
            Element::new("body")
                .with_child(Node::Template(TemplateDef::new(
                    "Inner",
                    DefBody::Element(Vec::new()),
                )))
                .with_child(Usage::element("Box"))
                .into(),
        ];

        let table = SymbolTable::from_document(&document);
        assert_eq!(table.len(), 3);
        assert!(table.lookup("Text", DefKind::Style, &[]).is_some());
        assert!(table.lookup("Box", DefKind::Element, &[]).is_none());
        assert!(table
            .lookup("Box", DefKind::Element, &["ui".to_owned()])
            .is_some());
        assert!(table.lookup("Inner", DefKind::Element, &[]).is_some());
    }

    #[test]
    fn empty_document() {
        let mut table = SymbolTable::new();
        assert_eq!(table.collect(&[]), 0);
        assert!(table.is_empty());
    }
}
