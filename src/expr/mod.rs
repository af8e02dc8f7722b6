//! Property-value expressions: tokenizer, parser, values, evaluator.

pub mod eval;
pub mod parser;
pub mod tokenizer;
pub mod value;

pub use eval::{evaluate, EvalError, RefResolver};
pub use parser::{parse_value, parse_value_lossy, ParseError};
pub use value::{format_number, EvaluatedValue};
