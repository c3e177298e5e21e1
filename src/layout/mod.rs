//! Layout policies over the materialized file tree. Both consume the same
//! (nodes, edges) pair and produce per-node positions; neither owns any
//! selection semantics, so switching policy never disturbs the selection.

mod force;
mod quadtree;
mod tree;

pub use force::ForceSimulation;
pub use tree::layered_layout;
