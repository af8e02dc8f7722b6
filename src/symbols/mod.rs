//! Symbol table: namespaced template, custom and var definitions.

mod collect;
pub mod table;

pub use table::{display_path, Namespace, Resolved, SymbolKey, SymbolTable};
