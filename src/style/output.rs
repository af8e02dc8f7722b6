//! Evaluated style output: per-element property maps and global rules.

use std::fmt;

use indexmap::IndexMap;

use crate::ast::PrimarySelector;

/// Evaluated property strings, in declaration order.
pub type PropertyStrings = IndexMap<String, String>;

/// Each styled element's evaluated inline properties, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    entries: IndexMap<PrimarySelector, PropertyStrings>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selector: PrimarySelector, properties: PropertyStrings) {
        self.entries.insert(selector, properties);
    }

    pub fn get(&self, selector: &str) -> Option<&PropertyStrings> {
        self.entries.get(selector)
    }

    /// One evaluated property of one element.
    pub fn property(&self, selector: &str, property: &str) -> Option<&str> {
        self.get(selector)?.get(property).map(String::as_str)
    }

    /// The value of a `style="..."` attribute: `color: red; width: 100px;`.
    pub fn inline_style(&self, selector: &str) -> Option<String> {
        let properties = self.get(selector)?;
        Some(
            properties
                .iter()
                .map(|(name, value)| format!("{name}: {value};"))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PrimarySelector, &PropertyStrings)> {
        self.entries.iter()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &PrimarySelector> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A selector rule with evaluated properties, destined for the global
/// stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalRule {
    pub selector: String,
    pub properties: PropertyStrings,
}

impl fmt::Display for GlobalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.selector)?;
        for (name, value) in &self.properties {
            write!(f, " {name}: {value};")?;
        }
        f.write_str(" }")
    }
}

/// Render rules as a stylesheet, one rule per line.
pub fn render_stylesheet(rules: &[GlobalRule]) -> String {
    rules
        .iter()
        .map(GlobalRule::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
