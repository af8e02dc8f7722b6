//! Document AST: element tree, style blocks, template definitions, usages, expressions.

pub mod expr;
pub mod node;
pub mod selector;

pub use expr::{BinaryOp, ExprAst};
pub use node::{
    CustomDef, DefBody, DefKind, DeleteTarget, Definition, Element, InsertPosition, Node,
    PropertyMap, SelectorRule, Specialization, StyleBlock, TemplateDef, Text, Usage,
};
pub use selector::{PrimarySelector, Selector, SelectorKind};
