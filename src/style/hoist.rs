//! Preparing local selector rules for the global stylesheet.
//!
//! A local `style {}` block may carry rules such as `.card {}`, `#main {}` or
//! `&:hover {}`. The owning element takes the class or id the first such rule
//! names when it has none, and `&` becomes a selector for the owner. The rules
//! stay in the tree; the resolver collects and evaluates them.

use crate::ast::{Element, Node};

/// Walk the tree, adding missing classes/ids named by local rules and
/// replacing `&` in rule selectors.
pub fn prepare_local_rules(nodes: &mut [Node], auto_add_class: bool, auto_add_id: bool) {
    for element in nodes.iter_mut().filter_map(Node::as_element_mut) {
        prepare_element(element, auto_add_class, auto_add_id);
    }
}

fn prepare_element(element: &mut Element, auto_add_class: bool, auto_add_id: bool) {
    let selectors: Vec<String> = element
        .style_blocks()
        .flat_map(|block| block.rules.iter().map(|rule| rule.selector.clone()))
        .collect();

    if !selectors.is_empty() {
        if auto_add_class && element.classes().next().is_none() {
            if let Some(class) = selectors.iter().find_map(|s| leading_name(s, '.')) {
                log::debug!("adding class '{class}' to <{}>", element.tag);
                element.add_class(class);
            }
        }
        if auto_add_id && element.id().is_none() {
            if let Some(id) = selectors.iter().find_map(|s| leading_name(s, '#')) {
                log::debug!("adding id '{id}' to <{}>", element.tag);
                element.set_id(id);
            }
        }

        let owner = owner_selector(element);
        for child in &mut element.children {
            if let Node::Style(block) = child {
                for rule in &mut block.rules {
                    if rule.selector.contains('&') {
                        rule.selector = rule.selector.replace('&', &owner);
                    }
                }
            }
        }
    }

    prepare_local_rules(&mut element.children, auto_add_class, auto_add_id);
}

/// `name` of a selector starting with `sigil` + `name`, e.g. `card` in
/// `.card:hover`.
fn leading_name(selector: &str, sigil: char) -> Option<&str> {
    let rest = selector.trim_start().strip_prefix(sigil)?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// What `&` stands for: the first class, else the id, else the tag.
fn owner_selector(element: &Element) -> String {
    if let Some(class) = element.classes().next() {
        format!(".{class}")
    } else if let Some(id) = element.id() {
        format!("#{id}")
    } else {
        element.tag.to_ascii_lowercase()
    }
}
