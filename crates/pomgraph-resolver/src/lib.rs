//! Resolution engine: session-scoped resolution cache, nearest-wins
//! transitive resolution, dependency graph construction and rendering.

pub mod cache;
pub mod graph;
pub mod print;
pub mod resolver;
