//! Element selectors: `#id`, `.class`, `tag`, each with an optional `[n]` index.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use super::node::Element;

/// The simple selector part of a [`Selector`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// ID selector: `#box`.
    Id(String),
    /// Class selector: `.card`.
    Class(String),
    /// Tag selector: `div`. Stored lowercase.
    Tag(String),
}

/// A selector addressing one or more elements of the expanded tree.
///
/// The optional `index` narrows the match list to its Nth entry (0-based),
/// e.g. `div[1]` is the second `div` in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub kind: SelectorKind,
    pub index: Option<usize>,
}

/// Errors from parsing a selector string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector '{0}'")]
    Invalid(String),
}

impl Selector {
    /// `#name`
    pub fn id(name: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Id(name.into()),
            index: None,
        }
    }

    /// `.name`
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Class(name.into()),
            index: None,
        }
    }

    /// Bare tag name. Lowercased.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Tag(name.into().to_ascii_lowercase()),
            index: None,
        }
    }

    /// Narrow to the Nth match (builder).
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Whether `element` matches the simple selector. The index is ignored.
    pub fn matches(&self, element: &Element) -> bool {
        match &self.kind {
            SelectorKind::Id(id) => element.id() == Some(id.as_str()),
            SelectorKind::Class(class) => element.has_class(class),
            SelectorKind::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }
        let invalid = || SelectorError::Invalid(input.to_owned());

        let (body, index) = match input.strip_suffix(']') {
            Some(rest) => {
                let open = rest.rfind('[').ok_or_else(invalid)?;
                let index = rest[open + 1..].trim().parse::<usize>().map_err(|_| invalid())?;
                (&rest[..open], Some(index))
            }
            None => (input, None),
        };

        let (kind, name) = match body.chars().next() {
            Some('#') => ('#', &body[1..]),
            Some('.') => ('.', &body[1..]),
            _ => (' ', body),
        };
        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(invalid());
        }

        let selector = match kind {
            '#' => Selector::id(name),
            '.' => Selector::class(name),
            _ => Selector::tag(name),
        };
        Ok(Selector { index, ..selector })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SelectorKind::Id(name) => write!(f, "#{name}")?,
            SelectorKind::Class(name) => write!(f, ".{name}")?,
            SelectorKind::Tag(name) => write!(f, "{name}")?,
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// The canonical address of one element in cross-references and style output.
///
/// `#id` if the element has an id, else `.first-class`, else its lowercase tag.
/// When several elements share the same canonical form, the registry suffixes
/// later ones with their occurrence index (`div`, `div[1]`, `div[2]`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimarySelector(String);

impl PrimarySelector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Canonical selector of an element, without any occurrence suffix.
    pub fn of(element: &Element) -> Self {
        if let Some(id) = element.id() {
            return Self(format!("#{id}"));
        }
        if let Some(class) = element.classes().next() {
            return Self(format!(".{class}"));
        }
        Self(element.tag.to_ascii_lowercase())
    }

    /// Append an occurrence suffix. Occurrence 0 leaves the selector unchanged.
    pub fn with_occurrence(self, occurrence: usize) -> Self {
        if occurrence == 0 {
            self
        } else {
            Self(format!("{}[{occurrence}]", self.0))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimarySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PrimarySelector {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrimarySelector {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
