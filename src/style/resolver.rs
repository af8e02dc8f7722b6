//! Memoized style evaluation.
//!
//! Elements are evaluated in dependency order. Every property is evaluated at
//! most once per compile: results, errors included, are memoized per primary
//! selector and reused by every element that references them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::ast::{Node, PrimarySelector, PropertyMap, Selector};
use crate::dom::{ElementId, ElementRegistry};
use crate::expr::{evaluate, EvalError, EvaluatedValue};

use super::graph::DependencyGraph;
use super::output::{GlobalRule, PropertyStrings, StyleMap};
use super::ResolveError;

type Evaluated = Result<EvaluatedValue, EvalError>;

/// A property that failed to evaluate. The compile goes on; the property
/// renders as an [`error_marker`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The owning element, or the rule selector for global rules.
    pub selector: PrimarySelector,
    pub property: String,
    pub error: EvalError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.selector, self.property, self.error)
    }
}

/// The visible stand-in for a property that failed to evaluate.
pub fn error_marker(error: &EvalError) -> String {
    format!("/* error: {error} */")
}

/// Everything the resolver produces for one tree.
#[derive(Debug, Clone, Default)]
pub struct ResolvedStyles {
    pub styles: StyleMap,
    pub rules: Vec<GlobalRule>,
    pub diagnostics: Vec<Diagnostic>,
    /// Evaluation order of the styled elements, dependencies first.
    pub order: Vec<PrimarySelector>,
}

/// Build a registry over `tree` and resolve its styles, local rules included.
pub fn resolve(tree: &[Node]) -> Result<ResolvedStyles, ResolveError> {
    let registry = ElementRegistry::build(tree);
    let resolver = StyleResolver::new(tree, &registry);
    resolver.resolve()
}

/// Drives the evaluator over a registry.
pub struct StyleResolver<'r, 'a> {
    tree: &'a [Node],
    registry: &'r ElementRegistry<'a>,
    local_rules: bool,
    memo: RefCell<HashMap<PrimarySelector, HashMap<String, Evaluated>>>,
    /// Properties currently being evaluated, innermost last.
    in_progress: RefCell<Vec<(PrimarySelector, String)>>,
    /// Set when a property turns out to reference itself.
    circular: RefCell<Option<ResolveError>>,
}

impl<'r, 'a> StyleResolver<'r, 'a> {
    pub fn new(tree: &'a [Node], registry: &'r ElementRegistry<'a>) -> Self {
        Self {
            tree,
            registry,
            local_rules: true,
            memo: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(Vec::new()),
            circular: RefCell::new(None),
        }
    }

    /// Whether rules inside element style blocks are collected (builder).
    pub fn with_local_rules(mut self, enabled: bool) -> Self {
        self.local_rules = enabled;
        self
    }

    /// Order, evaluate and render every styled element, then every rule.
    pub fn resolve(&self) -> Result<ResolvedStyles, ResolveError> {
        let order = DependencyGraph::build(self.registry).topological_order()?;

        let mut diagnostics = Vec::new();
        let mut rendered: HashMap<PrimarySelector, PropertyStrings> = HashMap::new();
        for primary in &order {
            let Some(id) = self.registry.by_primary(primary.as_str()) else {
                continue;
            };
            let Some(element) = self.registry.get(id).filter(|element| element.has_inline_style()) else {
                continue;
            };
            let mut properties = PropertyStrings::new();
            for name in element.inline_properties().keys() {
                let value = self.evaluate_property(id, name)?.unwrap_or_else(|| {
                    Ok(EvaluatedValue::str(*name))
                });
                properties.insert((*name).to_owned(), render(primary, name, value, &mut diagnostics));
            }
            rendered.insert(primary.clone(), properties);
        }

        let mut styles = StyleMap::new();
        for (id, _) in self.registry.iter() {
            if let Some(primary) = self.registry.primary_selector(id) {
                if let Some(properties) = rendered.remove(primary) {
                    styles.insert(primary.clone(), properties);
                }
            }
        }

        let rules = self.resolve_rules(&mut diagnostics)?;
        Ok(ResolvedStyles {
            styles,
            rules,
            diagnostics,
            order,
        })
    }

    /// Evaluate one inline property of an element, memoized.
    ///
    /// `Ok(None)` when the element does not declare the property. A property
    /// that reaches itself fails with `EvalError::CircularProperty` and
    /// records the fatal error.
    pub fn evaluate_property(
        &self,
        id: ElementId,
        property: &str,
    ) -> Result<Option<Evaluated>, ResolveError> {
        let value = self.lookup_property(id, property);
        match self.circular.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    fn lookup_property(&self, id: ElementId, property: &str) -> Option<Evaluated> {
        let primary = self.registry.primary_selector(id)?;
        if let Some(value) = self.memo.borrow().get(primary).and_then(|props| props.get(property)) {
            return Some(value.clone());
        }
        let element = self.registry.get(id)?;
        let expr = element.inline_property(property)?;

        let key = (primary.clone(), property.to_owned());
        if let Some(start) = self.in_progress.borrow().iter().position(|entry| *entry == key) {
            self.record_cycle(primary, start, property);
            return Some(Err(EvalError::CircularProperty {
                selector: primary.to_string(),
                property: property.to_owned(),
            }));
        }

        self.in_progress.borrow_mut().push(key);
        let value = evaluate(expr, &|selector, name| self.resolve_reference(id, selector, name));
        self.in_progress.borrow_mut().pop();

        self.memo
            .borrow_mut()
            .entry(primary.clone())
            .or_default()
            .insert(property.to_owned(), value.clone());
        Some(value)
    }

    /// The reference callback handed to the evaluator for element `current`.
    fn resolve_reference(
        &self,
        current: ElementId,
        selector: Option<&Selector>,
        property: &str,
    ) -> Result<Option<EvaluatedValue>, EvalError> {
        let target = match selector {
            None => current,
            Some(selector) => match self.registry.first(selector) {
                Some(target) => target,
                None => {
                    log::warn!("reference {selector}.{property} matches no element");
                    return Ok(None);
                }
            },
        };
        match self.lookup_property(target, property) {
            Some(value) => value.map(Some),
            None => {
                if selector.is_some() {
                    log::warn!("reference to undeclared property '{property}'");
                }
                Ok(None)
            }
        }
    }

    fn record_cycle(&self, primary: &PrimarySelector, start: usize, property: &str) {
        let mut circular = self.circular.borrow_mut();
        if circular.is_some() {
            return;
        }
        let mut cycle: Vec<String> = self.in_progress.borrow()[start..]
            .iter()
            .map(|(selector, name)| {
                if selector == primary {
                    name.clone()
                } else {
                    format!("{selector}.{name}")
                }
            })
            .collect();
        cycle.push(property.to_owned());
        *circular = Some(ResolveError::CircularProperty {
            selector: primary.clone(),
            cycle,
        });
    }

    /// Local rules of every element (when enabled), then the rules of
    /// top-level style blocks. Local rule properties are evaluated in the
    /// owning element's scope.
    fn resolve_rules(&self, diagnostics: &mut Vec<Diagnostic>) -> Result<Vec<GlobalRule>, ResolveError> {
        let mut rules = Vec::new();
        if self.local_rules {
            for (id, element) in self.registry.iter() {
                for rule in element.style_blocks().flat_map(|block| &block.rules) {
                    rules.push(self.resolve_rule(Some(id), &rule.selector, &rule.properties, diagnostics)?);
                }
            }
        }
        for node in self.tree {
            if let Node::Style(block) = node {
                if !block.inline.is_empty() {
                    log::debug!("ignoring inline properties of a top-level style block");
                }
                for rule in &block.rules {
                    rules.push(self.resolve_rule(None, &rule.selector, &rule.properties, diagnostics)?);
                }
            }
        }
        Ok(rules)
    }

    fn resolve_rule(
        &self,
        owner: Option<ElementId>,
        selector: &str,
        properties: &PropertyMap,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<GlobalRule, ResolveError> {
        let label = PrimarySelector::new(selector);
        let mut rendered = PropertyStrings::new();
        for (name, expr) in properties {
            let value = evaluate(expr, &|target, property| match (owner, target) {
                (Some(owner), _) => self.resolve_reference(owner, target, property),
                (None, None) => Ok(None),
                (None, Some(target)) => match self.registry.first(target) {
                    Some(id) => self.resolve_reference(id, None, property),
                    None => Ok(None),
                },
            });
            if let Some(error) = self.circular.borrow_mut().take() {
                return Err(error);
            }
            rendered.insert(name.clone(), render(&label, name, value, diagnostics));
        }
        Ok(GlobalRule {
            selector: selector.to_owned(),
            properties: rendered,
        })
    }
}

/// Final string of a property, recording a diagnostic on failure.
fn render(
    selector: &PrimarySelector,
    property: &str,
    value: Evaluated,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let error = match value {
        Ok(value) if value.is_renderable() => return value.to_string(),
        Ok(value) => EvalError::InvalidOperandType {
            op: "property value".to_owned(),
            expected: "dimension or string",
            found: value.type_name(),
        },
        Err(error) => error,
    };
    log::warn!("{selector} {property}: {error}");
    let marker = error_marker(&error);
    diagnostics.push(Diagnostic {
        selector: selector.clone(),
        property: property.to_owned(),
        error,
    });
    marker
}
