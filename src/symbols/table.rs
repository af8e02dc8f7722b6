//! Namespace-scoped storage of template and custom definitions.
//!
//! Lookup from namespace path `[a, b]` checks `a.b`, then `a`, then the global
//! root, so a definition in an inner namespace shadows an outer one with the
//! same `(name, kind)`.

use indexmap::IndexMap;

use crate::ast::{DefKind, Definition};

/// Key of a definition within one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub name: String,
    pub kind: DefKind,
}

impl SymbolKey {
    pub fn new(name: impl Into<String>, kind: DefKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One node of the namespace tree.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    symbols: IndexMap<SymbolKey, Definition>,
    children: IndexMap<String, Namespace>,
}

impl Namespace {
    pub fn get(&self, name: &str, kind: DefKind) -> Option<&Definition> {
        self.symbols.get(&SymbolKey::new(name, kind))
    }

    fn merge(&mut self, other: Namespace) {
        self.symbols.extend(other.symbols);
        for (name, child) in other.children {
            self.children.entry(name).or_default().merge(child);
        }
    }

    fn count(&self) -> usize {
        self.symbols.len() + self.children.values().map(Namespace::count).sum::<usize>()
    }
}

/// A definition found by [`SymbolTable::lookup_scoped`], with the namespace
/// path it was found in.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub definition: &'a Definition,
    pub namespace: Vec<String>,
}

/// The symbol table of one compile. Only grows: nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    root: Namespace,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition into the namespace at `namespace_path`, creating
    /// intermediate namespaces as needed.
    ///
    /// Redefining the same `(name, kind)` in the same namespace logs a warning
    /// and replaces the previous definition, which is returned.
    pub fn define(
        &mut self,
        definition: impl Into<Definition>,
        namespace_path: &[String],
    ) -> Option<Definition> {
        let definition = definition.into();
        let key = SymbolKey::new(definition.name(), definition.kind());
        let namespace = self.namespace_mut(namespace_path);
        let previous = namespace.symbols.insert(key, definition);
        if let Some(previous) = &previous {
            log::warn!(
                "redefinition of {} {} in namespace '{}'",
                previous.kind(),
                previous.name(),
                display_path(namespace_path)
            );
        }
        previous
    }

    /// Look up `(name, kind)` starting at `namespace_path` and walking outward
    /// to the global root.
    pub fn lookup(&self, name: &str, kind: DefKind, namespace_path: &[String]) -> Option<&Definition> {
        self.lookup_scoped(name, kind, namespace_path)
            .map(|resolved| resolved.definition)
    }

    /// Like [`lookup`](Self::lookup), also returning the namespace the
    /// definition was found in.
    pub fn lookup_scoped(
        &self,
        name: &str,
        kind: DefKind,
        namespace_path: &[String],
    ) -> Option<Resolved<'_>> {
        (0..=namespace_path.len()).rev().find_map(|depth| {
            let scope = &namespace_path[..depth];
            let definition = self.namespace(scope)?.get(name, kind)?;
            Some(Resolved {
                definition,
                namespace: scope.to_vec(),
            })
        })
    }

    /// The namespace at an exact path, if it exists.
    pub fn namespace(&self, path: &[String]) -> Option<&Namespace> {
        path.iter()
            .try_fold(&self.root, |namespace, part| namespace.children.get(part))
    }

    /// Deep-merge another table into this one. Child namespaces are unioned
    /// recursively; on a key collision the incoming definition wins.
    pub fn merge(&mut self, other: SymbolTable) {
        self.root.merge(other.root);
    }

    /// Merge another table beneath `namespace_path`, as done for an import
    /// into a caller-chosen namespace.
    pub fn merge_under(&mut self, other: SymbolTable, namespace_path: &[String]) {
        self.namespace_mut(namespace_path).merge(other.root);
    }

    /// Total number of stored definitions.
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn namespace_mut(&mut self, path: &[String]) -> &mut Namespace {
        path.iter().fold(&mut self.root, |namespace, part| {
            namespace.children.entry(part.clone()).or_default()
        })
    }
}

/// `a.b`, or `<global>` for the root.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<global>".to_owned()
    } else {
        path.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DefBody, ExprAst, StyleBlock, TemplateDef};
    use indexmap::IndexMap;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| (*p).to_owned()).collect()
    }

    fn style(name: &str, color: &str) -> TemplateDef {
        TemplateDef::new(
            name,
            DefBody::Style(StyleBlock::new().with_property("color", ExprAst::literal(color))),
        )
    }

    fn color_of(def: &Definition) -> &ExprAst {
        match def.body() {
            DefBody::Style(block) => &block.inline["color"],
            other => panic!("expected style body, got {other:?}"),
        }
    }

    #[test]
    fn define_and_lookup_global() {
        let mut table = SymbolTable::new();
        assert!(table.define(style("Text", "black"), &[]).is_none());
        let found = table.lookup("Text", DefKind::Style, &[]).unwrap();
        assert_eq!(found.name(), "Text");
        assert!(table.lookup("Text", DefKind::Element, &[]).is_none());
    }

    #[test]
    fn redefinition_replaces_and_returns_previous() {
        let mut table = SymbolTable::new();
        table.define(style("Text", "black"), &[]);
        let previous = table.define(style("Text", "white"), &[]);
        assert!(previous.is_some());
        assert_eq!(table.len(), 1);
        let found = table.lookup("Text", DefKind::Style, &[]).unwrap();
        assert_eq!(color_of(found), &ExprAst::literal("white"));
    }

    #[test]
    fn inner_namespace_shadows_outer() {
        let mut table = SymbolTable::new();
        table.define(style("Text", "global"), &[]);
        table.define(style("Text", "outer"), &path(&["a"]));
        table.define(style("Text", "inner"), &path(&["a", "b"]));

        let lookup = |p: &[&str]| color_of(table.lookup("Text", DefKind::Style, &path(p)).unwrap()).clone();
        assert_eq!(lookup(&["a", "b"]), ExprAst::literal("inner"));
        assert_eq!(lookup(&["a"]), ExprAst::literal("outer"));
        assert_eq!(lookup(&[]), ExprAst::literal("global"));
        // Missing intermediate namespaces fall back outward.
        assert_eq!(lookup(&["a", "zzz"]), ExprAst::literal("outer"));
        assert_eq!(lookup(&["other"]), ExprAst::literal("global"));
    }

    #[test]
    fn lookup_scoped_reports_namespace() {
        let mut table = SymbolTable::new();
        table.define(style("Card", "x"), &path(&["ui"]));
        let resolved = table
            .lookup_scoped("Card", DefKind::Style, &path(&["ui", "forms"]))
            .unwrap();
        assert_eq!(resolved.namespace, path(&["ui"]));
    }

    #[test]
    fn outer_lookup_does_not_see_inner() {
        let mut table = SymbolTable::new();
        table.define(style("Hidden", "x"), &path(&["a"]));
        assert!(table.lookup("Hidden", DefKind::Style, &[]).is_none());
    }

    #[test]
    fn merge_unions_namespaces_and_overwrites_leaves() {
        let mut base = SymbolTable::new();
        base.define(style("Text", "old"), &path(&["ui"]));
        base.define(style("Keep", "k"), &path(&["ui"]));

        let mut other = SymbolTable::new();
        other.define(style("Text", "new"), &path(&["ui"]));
        other.define(style("Extra", "e"), &path(&["ui", "deep"]));

        base.merge(other);
        assert_eq!(base.len(), 3);
        let text = base.lookup("Text", DefKind::Style, &path(&["ui"])).unwrap();
        assert_eq!(color_of(text), &ExprAst::literal("new"));
        assert!(base.lookup("Keep", DefKind::Style, &path(&["ui"])).is_some());
        assert!(base.lookup("Extra", DefKind::Style, &path(&["ui", "deep"])).is_some());
    }

    #[test]
    fn merge_under_nests_import() {
        let mut imported = SymbolTable::new();
        imported.define(style("Button", "blue"), &[]);
        let mut vars = IndexMap::new();
        vars.insert("gap".to_owned(), ExprAst::dim(4.0, "px"));
        imported.define(TemplateDef::new("Spacing", DefBody::Var(vars)), &path(&["tokens"]));

        let mut table = SymbolTable::new();
        table.merge_under(imported, &path(&["lib"]));

        assert!(table.lookup("Button", DefKind::Style, &[]).is_none());
        assert!(table.lookup("Button", DefKind::Style, &path(&["lib"])).is_some());
        assert!(table
            .lookup("Spacing", DefKind::Var, &path(&["lib", "tokens"]))
            .is_some());
    }

    #[test]
    fn display_path_root() {
        assert_eq!(display_path(&[]), "<global>");
        assert_eq!(display_path(&path(&["a", "b"])), "a.b");
    }
}
