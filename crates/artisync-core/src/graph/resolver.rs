//! Topological resolver.
//!
//! Depth-first traversal with an explicit in-progress path, driven by a
//! heap-allocated stack. Every node is
//! emitted after all of its batch-internal dependencies. A dependency that
//! is already on the path closes a cycle, which fails the whole resolution.

use super::builder::DependencyGraph;
use crate::errors::{Result, SyncError};
use std::collections::HashSet;

/// Processing order for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Locations, dependencies before dependents
    pub order: Vec<String>,
    /// Dependency names absent from the batch, treated as satisfied
    pub external_dependencies: Vec<String>,
}

/// Resolve a processing order for `graph`.
///
/// Deterministic: nodes are visited in input order and dependencies in
/// declared order, so the same graph always yields the same order.
///
/// # Errors
///
/// Returns `SyncError::CyclicDependency` naming every member of the first
/// cycle found, in path order starting from the node that repeats.
pub fn resolve(graph: &DependencyGraph) -> Result<Resolution> {
    let mut walk = Walk {
        graph,
        path: Vec::new(),
        on_path: HashSet::new(),
        done: HashSet::new(),
        order: Vec::with_capacity(graph.len()),
    };

    for node in graph.nodes() {
        if !walk.done.contains(node.location()) {
            walk.visit(node.location())?;
        }
    }

    Ok(Resolution {
        order: walk.order,
        external_dependencies: graph.external_dependencies().to_vec(),
    })
}

struct Walk<'g> {
    graph: &'g DependencyGraph,
    path: Vec<&'g str>,
    on_path: HashSet<&'g str>,
    done: HashSet<&'g str>,
    order: Vec<String>,
}

/// A node on the path and the index of its next dependency to visit
struct Frame<'g> {
    location: &'g str,
    dependencies: &'g [String],
    next: usize,
}

impl<'g> Walk<'g> {
    /// Iterative DFS from `root`; long dependency chains never grow the call stack.
    fn visit(&mut self, root: &'g str) -> Result<()> {
        let graph = self.graph;
        let mut stack: Vec<Frame<'g>> = Vec::new();
        if let Some(node) = graph.get(root) {
            self.enter(&mut stack, node.location(), &node.dependencies);
        }

        while let Some(frame) = stack.last_mut() {
            let location = frame.location;
            let dependencies = frame.dependencies;
            let next = frame.next;
            frame.next += 1;

            match dependencies.get(next).map(String::as_str) {
                Some(dep) => {
                    if self.on_path.contains(dep) {
                        return Err(self.cycle_from(dep));
                    }
                    if self.done.contains(dep) {
                        continue;
                    }
                    if let Some(node) = graph.get(dep) {
                        self.enter(&mut stack, node.location(), &node.dependencies);
                    }
                }
                None => {
                    stack.pop();
                    self.path.pop();
                    self.on_path.remove(location);
                    self.done.insert(location);
                    self.order.push(location.to_string());
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, stack: &mut Vec<Frame<'g>>, location: &'g str, dependencies: &'g [String]) {
        self.path.push(location);
        self.on_path.insert(location);
        stack.push(Frame {
            location,
            dependencies,
            next: 0,
        });
    }

    fn cycle_from(&self, repeated: &str) -> SyncError {
        let start = self
            .path
            .iter()
            .position(|l| *l == repeated)
            .unwrap_or(0);
        let members = self.path[start..]
            .iter()
            .map(|l| {
                self.graph
                    .get(l)
                    .map(|n| n.name().to_string())
                    .unwrap_or_else(|| l.to_string())
            })
            .collect();
        SyncError::CyclicDependency { members }
    }
}
