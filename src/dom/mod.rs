//! Element registry over the expanded tree, backed by a slotmap arena.

pub mod registry;

pub use registry::{ElementId, ElementRegistry};
