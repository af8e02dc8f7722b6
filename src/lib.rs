//! # chtl-core
//!
//! The semantic core of a compiler from CHTL markup to HTML with computed CSS.
//!
//! Given a parsed document, chtl-core resolves namespaced template and custom
//! definitions, expands their usages with delete/insert/override
//! specialization, and evaluates CSS-like property expressions that may read
//! other elements' computed styles. Cross-element references are ordered
//! topologically and circular ones are reported instead of looping.
//!
//! ## Core Systems
//!
//! - **[`ast`]**: Document nodes, definitions, usages, selectors, value expressions
//! - **[`expr`]**: Value tokenizer and parser, typed evaluator with units
//! - **[`symbols`]**: Namespace tree of definitions with lexical shadowing
//! - **[`expand`]**: Usage expansion, specializations, variable substitution
//! - **[`dom`]**: Slotmap-backed element registry with selector lookup
//! - **[`style`]**: Dependency graph, memoized style resolution, style output
//! - **[`compile`]**: Options and the pipeline tying everything together
//!
//! ```
//! use chtl_core::ast::{BinaryOp, Element, ExprAst, Selector, StyleBlock};
//!
//! let document = vec![
//!     Element::new("div")
//!         .with_attribute("id", "box")
//!         .with_child(StyleBlock::new().with_property("width", ExprAst::dim(100.0, "px")))
//!         .into(),
//!     Element::new("p")
//!         .with_child(StyleBlock::new().with_property(
//!             "height",
//!             ExprAst::binary(
//!                 BinaryOp::Div,
//!                 ExprAst::prop_of(Selector::id("box"), "width"),
//!                 ExprAst::number(2.0),
//!             ),
//!         ))
//!         .into(),
//! ];
//!
//! let output = chtl_core::compile(&document).unwrap();
//! assert_eq!(output.styles.property("p", "height"), Some("50px"));
//! ```

// Foundation
pub mod ast;
pub mod expr;

// Definitions and expansion
pub mod expand;
pub mod symbols;

// Style evaluation
pub mod dom;
pub mod style;

// Pipeline
pub mod compile;

pub use compile::{compile, CompileError, CompileOptions, CompileOutput, Compiler, Import};
