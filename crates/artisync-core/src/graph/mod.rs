//! Dependency graph construction and topological resolution

pub mod builder;
pub mod resolver;

pub use builder::{build_graph, DependencyGraph, DependencyGraphNode};
pub use resolver::{resolve, Resolution};
