//! Element registry: selector lookup over the expanded tree.

use std::collections::HashMap;

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::ast::{Element, Node, PrimarySelector, Selector, SelectorKind};

new_key_type! {
    /// Handle of an element within one [`ElementRegistry`].
    pub struct ElementId;
}

/// Index of the elements of one expanded tree by id, class, tag and primary
/// selector.
///
/// The registry borrows the tree; rebuild it after the tree changes. Elements
/// are numbered in pre-order document order, and every list it hands out
/// follows that order.
pub struct ElementRegistry<'a> {
    elements: SlotMap<ElementId, &'a Element>,
    primary: SecondaryMap<ElementId, PrimarySelector>,
    order: Vec<ElementId>,
    by_id: HashMap<String, ElementId>,
    by_class: HashMap<String, Vec<ElementId>>,
    by_tag: HashMap<String, Vec<ElementId>>,
    by_primary: HashMap<PrimarySelector, ElementId>,
}

impl<'a> ElementRegistry<'a> {
    /// Index every element reachable from `nodes` in one traversal.
    ///
    /// A duplicate id logs a warning; the later element wins.
    pub fn build(nodes: &'a [Node]) -> Self {
        let mut registry = Self {
            elements: SlotMap::with_key(),
            primary: SecondaryMap::new(),
            order: Vec::new(),
            by_id: HashMap::new(),
            by_class: HashMap::new(),
            by_tag: HashMap::new(),
            by_primary: HashMap::new(),
        };
        let mut occurrences: HashMap<PrimarySelector, usize> = HashMap::new();

        // Pre-order walk. Children are pushed in reverse so the first child
        // is visited first.
        let mut stack: Vec<&'a Element> = nodes.iter().rev().filter_map(Node::as_element).collect();
        while let Some(element) = stack.pop() {
            registry.insert(element, &mut occurrences);
            stack.extend(element.child_elements().collect::<Vec<_>>().into_iter().rev());
        }
        registry
    }

    fn insert(
        &mut self,
        element: &'a Element,
        occurrences: &mut HashMap<PrimarySelector, usize>,
    ) {
        let id = self.elements.insert(element);
        self.order.push(id);

        if let Some(element_id) = element.id() {
            if self.by_id.insert(element_id.to_owned(), id).is_some() {
                log::warn!("duplicate element id '#{element_id}'; the later element wins");
            }
        }
        for class in element.classes() {
            self.by_class.entry(class.to_owned()).or_default().push(id);
        }
        self.by_tag
            .entry(element.tag.to_ascii_lowercase())
            .or_default()
            .push(id);

        let base = PrimarySelector::of(element);
        let occurrence = occurrences.entry(base.clone()).or_default();
        let primary = base.with_occurrence(*occurrence);
        *occurrence += 1;
        self.by_primary.insert(primary.clone(), id);
        self.primary.insert(id, primary);
    }

    /// All elements matching `selector`, in document order.
    ///
    /// An index narrows the result to that match; out of range gives an empty
    /// result.
    pub fn find(&self, selector: &Selector) -> Vec<&'a Element> {
        self.find_ids(selector)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Like [`find`](Self::find), returning handles.
    pub fn find_ids(&self, selector: &Selector) -> Vec<ElementId> {
        let matches: Vec<ElementId> = match &selector.kind {
            SelectorKind::Id(name) => self.by_id.get(name).copied().into_iter().collect(),
            SelectorKind::Class(name) => self.by_class.get(name).cloned().unwrap_or_default(),
            SelectorKind::Tag(name) => self
                .by_tag
                .get(&name.to_ascii_lowercase())
                .cloned()
                .unwrap_or_default(),
        };
        match selector.index {
            Some(index) => matches.get(index).copied().into_iter().collect(),
            None => matches,
        }
    }

    /// The element a cross-reference through `selector` reads from: the
    /// indexed match, else the first.
    pub fn first(&self, selector: &Selector) -> Option<ElementId> {
        self.find_ids(selector).first().copied()
    }

    pub fn get(&self, id: ElementId) -> Option<&'a Element> {
        self.elements.get(id).copied()
    }

    /// The unique primary selector of an element.
    pub fn primary_selector(&self, id: ElementId) -> Option<&PrimarySelector> {
        self.primary.get(id)
    }

    pub fn by_primary(&self, selector: &str) -> Option<ElementId> {
        self.by_primary.get(selector).copied()
    }

    /// All elements in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &'a Element)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.get(id).map(|element| (id, element)))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
