//! Usage-site specializations.
//!
//! Whatever order a usage lists them in, every delete runs first, then every
//! insert, then overrides and property sets. Deletes and inserts change the
//! positional shape that later steps match against.

use std::collections::HashMap;

use crate::ast::{
    DeleteTarget, Element, InsertPosition, Node, PropertyMap, Selector, Specialization, Usage,
};

/// Apply specializations to the nodes of an expanded element usage.
pub(super) fn apply_to_nodes(nodes: &mut Vec<Node>, specializations: &[Specialization], usage: &Usage) {
    for specialization in specializations {
        if let Specialization::Delete { targets } = specialization {
            for target in targets {
                delete_node(nodes, target);
            }
        }
    }

    for specialization in specializations {
        if let Specialization::Insert {
            position,
            target_selector,
            content,
        } = specialization
        {
            insert(nodes, *position, target_selector.as_ref(), content);
        }
    }

    for specialization in specializations {
        match specialization {
            Specialization::StyleOverride { tree } => override_elements(nodes, tree),
            Specialization::SetProperties { .. } => log::warn!(
                "property values have no effect on {} '{}'",
                usage.kind,
                usage.name
            ),
            Specialization::Delete { .. } | Specialization::Insert { .. } => {}
        }
    }
}

/// Apply specializations to the merged properties of a style usage.
pub(super) fn apply_to_properties(
    properties: &mut PropertyMap,
    specializations: &[Specialization],
    usage: &Usage,
) {
    for specialization in specializations {
        let Specialization::Delete { targets } = specialization else {
            continue;
        };
        for target in targets {
            match target {
                DeleteTarget::Property(name) => {
                    properties.shift_remove(name);
                }
                DeleteTarget::Element(selector) => log::warn!(
                    "cannot delete element {selector} from {} '{}'",
                    usage.kind,
                    usage.name
                ),
                // Dropped before expansion.
                DeleteTarget::Inherited { .. } => {}
            }
        }
    }

    for specialization in specializations {
        match specialization {
            Specialization::SetProperties { properties: values } => {
                properties.extend(values.iter().map(|(name, expr)| (name.clone(), expr.clone())));
            }
            Specialization::Insert { .. } | Specialization::StyleOverride { .. } => log::warn!(
                "element specialization has no effect on {} '{}'",
                usage.kind,
                usage.name
            ),
            Specialization::Delete { .. } => {}
        }
    }
}

/// Index of the top-level element that `selector` addresses.
fn find_target(nodes: &[Node], selector: &Selector) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.as_element().is_some_and(|element| selector.matches(element)))
        .nth(selector.index.unwrap_or(0))
        .map(|(index, _)| index)
}

fn delete_node(nodes: &mut Vec<Node>, target: &DeleteTarget) {
    match target {
        DeleteTarget::Property(name) => {
            for element in nodes.iter_mut().filter_map(Node::as_element_mut) {
                element.attributes.shift_remove(name);
            }
        }
        DeleteTarget::Element(selector) => match find_target(nodes, selector) {
            Some(index) => {
                nodes.remove(index);
            }
            None => log::debug!("delete target {selector} not found"),
        },
        DeleteTarget::Inherited { .. } => {}
    }
}

fn insert(
    nodes: &mut Vec<Node>,
    position: InsertPosition,
    target: Option<&Selector>,
    content: &[Node],
) {
    let content = content.iter().cloned();
    let range = match position {
        InsertPosition::AtTop => 0..0,
        InsertPosition::AtBottom => nodes.len()..nodes.len(),
        InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
            let Some(selector) = target else {
                log::debug!("{position:?} insert without a target ignored");
                return;
            };
            let Some(index) = find_target(nodes, selector) else {
                log::debug!("insert target {selector} not found");
                return;
            };
            match position {
                InsertPosition::Before => index..index,
                InsertPosition::After => index + 1..index + 1,
                _ => index..index + 1,
            }
        }
    };
    nodes.splice(range, content);
}

/// Pair the nth override element of each tag with the nth element of that
/// tag in `nodes`, and merge.
fn override_elements(nodes: &mut [Node], tree: &[Node]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for overriding in tree.iter().filter_map(Node::as_element) {
        let tag = overriding.tag.to_ascii_lowercase();
        let occurrence = seen.entry(tag.clone()).or_default();
        let target = nodes
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .filter(|element| element.tag.eq_ignore_ascii_case(&tag))
            .nth(*occurrence);
        *occurrence += 1;

        match target {
            Some(target) => merge_element(target, overriding),
            None => log::debug!("override for <{tag}> matched nothing"),
        }
    }
}

/// Merge style properties and rules. Attributes of the override are ignored.
fn merge_element(target: &mut Element, overriding: &Element) {
    for block in overriding.style_blocks() {
        if block.inline.is_empty() && block.rules.is_empty() {
            continue;
        }
        let style = target.style_or_insert();
        style
            .inline
            .extend(block.inline.iter().map(|(name, expr)| (name.clone(), expr.clone())));
        style.rules.extend(block.rules.iter().cloned());
    }
    override_elements(&mut target.children, &overriding.children);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprAst, StyleBlock};

    fn usage() -> Usage {
        Usage::element("Test")
    }

    fn list() -> Vec<Node> {
        vec![
            Element::new("p").with_attribute("id", "a").into(),
            Node::text("between"),
            Element::new("p").with_attribute("id", "b").into(),
        ]
    }

    #[test]
    fn find_target_skips_non_elements() {
        let nodes = list();
        assert_eq!(find_target(&nodes, &Selector::tag("p")), Some(0));
        assert_eq!(find_target(&nodes, &Selector::tag("p").with_index(1)), Some(2));
        assert_eq!(find_target(&nodes, &Selector::tag("p").with_index(2)), None);
        assert_eq!(find_target(&nodes, &Selector::id("b")), Some(2));
    }

    #[test]
    fn insert_without_target_is_noop() {
        let mut nodes = list();
        insert(&mut nodes, InsertPosition::Before, None, &[Node::text("x")]);
        assert_eq!(nodes, list());
    }

    #[test]
    fn override_pairs_by_occurrence() {
        let mut nodes = list();
        let tree = vec![
            Element::new("p")
                .with_child(StyleBlock::new().with_property("order", ExprAst::number(1.0)))
                .into(),
            Element::new("P")
                .with_child(StyleBlock::new().with_property("order", ExprAst::number(2.0)))
                .into(),
        ];
        override_elements(&mut nodes, &tree);
        let order = |index: usize| nodes[index].as_element().unwrap().inline_property("order").cloned();
        assert_eq!(order(0), Some(ExprAst::number(1.0)));
        assert_eq!(order(2), Some(ExprAst::number(2.0)));
    }

    #[test]
    fn override_ignores_attributes() {
        let mut nodes = list();
        let tree = vec![Element::new("p").with_attribute("title", "ignored").into()];
        override_elements(&mut nodes, &tree);
        assert_eq!(nodes, list());
    }

    #[test]
    fn override_beats_later_style_block() {
        let mut nodes = vec![Element::new("div")
            .with_child(StyleBlock::new().with_property("width", ExprAst::dim(1.0, "px")))
            .with_child(StyleBlock::new().with_property("color", ExprAst::literal("red")))
            .into()];
        let tree = vec![Element::new("div")
            .with_child(StyleBlock::new().with_property("color", ExprAst::literal("green")))
            .into()];
        apply_to_nodes(&mut nodes, &[Specialization::StyleOverride { tree }], &usage());
        let div = nodes[0].as_element().unwrap();
        assert_eq!(div.inline_property("color"), Some(&ExprAst::literal("green")));
        assert_eq!(div.inline_property("width"), Some(&ExprAst::dim(1.0, "px")));
    }

    #[test]
    fn set_properties_overrides_after_delete() {
        let mut properties = PropertyMap::new();
        properties.insert("color".into(), ExprAst::literal("red"));
        properties.insert("margin".into(), ExprAst::number(0.0));

        let mut values = PropertyMap::new();
        values.insert("color".into(), ExprAst::literal("blue"));
        let specializations = vec![
            Specialization::SetProperties { properties: values },
            Specialization::Delete {
                targets: vec![DeleteTarget::Property("color".into())],
            },
        ];
        apply_to_properties(&mut properties, &specializations, &usage());
        assert_eq!(properties.get("color"), Some(&ExprAst::literal("blue")));
        assert_eq!(properties.get_index(0).map(|(name, _)| name.as_str()), Some("margin"));
    }

    #[test]
    fn override_creates_missing_style_block() {
        let mut nodes = vec![Element::new("div").into()];
        let tree = vec![Element::new("div")
            .with_child(StyleBlock::new().with_property("color", ExprAst::literal("red")))
            .into()];
        apply_to_nodes(
            &mut nodes,
            &[Specialization::StyleOverride { tree }],
            &usage(),
        );
        let div = nodes[0].as_element().unwrap();
        assert_eq!(div.inline_property("color"), Some(&ExprAst::literal("red")));
    }
}
