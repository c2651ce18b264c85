//! Fixed-point processor.
//!
//! Repeatedly applies every pending node whose batch-internal dependencies
//! have all settled, until a round makes no progress. A failed node frees
//! its position: its dependents are still attempted in a later round and
//! succeed or fail on their own.

use crate::errors::ExError;
use crate::graph::DependencyGraph;
use crate::model::{ArtifactDeclaration, BlockedArtifact};
use std::collections::HashSet;

/// A node whose apply callback failed
#[derive(Debug, Clone)]
pub struct DepletionFailure {
    pub location: String,
    pub error: ExError,
}

/// Result of one depletion run
#[derive(Debug, Clone, Default)]
pub struct Depletion {
    /// Locations in the order they succeeded
    pub succeeded: Vec<String>,
    pub failed: Vec<DepletionFailure>,
    /// Pending nodes with the names of dependencies that never settled
    pub still_blocked: Vec<BlockedArtifact>,
    /// Rounds that invoked at least one node
    pub rounds: usize,
}

impl Depletion {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.still_blocked.is_empty()
    }
}

/// Drive `graph` to a fixed point.
///
/// The ready set of a round is computed before any invocation, so nodes in
/// one round never depend on each other. Within a round nodes run in
/// `order`. A dependency counts as settled once it succeeded or failed.
/// Only nodes whose dependencies can never settle (a cycle, or a dependency
/// missing from `order`) end up in `still_blocked`. At most `graph.len()`
/// rounds are needed.
pub fn deplete<F>(graph: &mut DependencyGraph, order: &[String], mut apply: F) -> Depletion
where
    F: FnMut(&ArtifactDeclaration) -> Result<(), ExError>,
{
    let mut depletion = Depletion::default();
    let mut failed: HashSet<String> = HashSet::new();

    loop {
        let ready: Vec<String> = order
            .iter()
            .filter(|location| {
                !failed.contains(location.as_str())
                    && graph
                        .get(location)
                        .map(|n| !n.resolved && n.unresolved_dependencies.is_empty())
                        .unwrap_or(false)
            })
            .cloned()
            .collect();

        if ready.is_empty() {
            break;
        }
        depletion.rounds += 1;
        tracing::debug!(
            round = depletion.rounds,
            ready = ready.len(),
            "depletion round"
        );

        for location in ready {
            let outcome = match graph.get(&location) {
                Some(node) => {
                    let failed_deps: Vec<&str> = node
                        .dependencies
                        .iter()
                        .filter(|dep| failed.contains(dep.as_str()))
                        .map(String::as_str)
                        .collect();
                    if !failed_deps.is_empty() {
                        tracing::debug!(
                            location = %location,
                            failed_dependencies = ?failed_deps,
                            "attempting artifact despite failed dependencies"
                        );
                    }
                    apply(&node.declaration)
                }
                None => continue,
            };
            match outcome {
                Ok(()) => {
                    if let Some(node) = graph.get_mut(&location) {
                        node.resolved = true;
                    }
                    depletion.succeeded.push(location.clone());
                }
                Err(error) => {
                    tracing::debug!(
                        location = %location,
                        err_code = error.code(),
                        "freeing position of failed artifact"
                    );
                    failed.insert(location.clone());
                    depletion.failed.push(DepletionFailure {
                        location: location.clone(),
                        error,
                    });
                }
            }
            // Settled either way; dependents become ready next round.
            for node in graph.nodes_mut() {
                node.mark_dependency_resolved(&location);
            }
        }
    }

    for location in order {
        if failed.contains(location.as_str()) {
            continue;
        }
        let Some(node) = graph.get(location) else {
            continue;
        };
        if node.resolved {
            continue;
        }
        let missing = node
            .unresolved_dependencies
            .iter()
            .map(|dep| {
                graph
                    .get(dep)
                    .map(|n| n.name().to_string())
                    .unwrap_or_else(|| dep.clone())
            })
            .collect();
        depletion.still_blocked.push(BlockedArtifact {
            location: location.clone(),
            missing,
        });
    }

    depletion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::graph::{build_graph, resolve};

    fn decl(name: &str, deps: &[&str]) -> ArtifactDeclaration {
        ArtifactDeclaration::new(format!("/{}", name), name, "test")
            .with_depends_on(deps.iter().copied())
    }

    #[test]
    fn test_chain_needs_one_round_per_level() {
        let mut graph = build_graph(vec![decl("c", &["b"]), decl("b", &["a"]), decl("a", &[])]);
        let order = resolve(&graph).unwrap().order;
        let mut calls = Vec::new();

        let depletion = deplete(&mut graph, &order, |d| {
            calls.push(d.name.clone());
            Ok(())
        });

        assert_eq!(calls, vec!["a", "b", "c"]);
        assert_eq!(depletion.rounds, 3);
        assert!(depletion.is_complete());
    }

    #[test]
    fn test_dependents_of_failure_are_still_attempted() {
        let mut graph = build_graph(vec![
            decl("a", &[]),
            decl("b", &["a"]),
            decl("c", &[]),
            decl("d", &["c"]),
        ]);
        let order = resolve(&graph).unwrap().order;
        let mut calls = Vec::new();

        let depletion = deplete(&mut graph, &order, |d| {
            calls.push(d.name.clone());
            if d.name == "c" {
                Err(ExError::new(ExErrorKind::ApplyFailed).with_message("boom"))
            } else {
                Ok(())
            }
        });

        assert_eq!(calls, vec!["a", "c", "b", "d"]);
        assert_eq!(depletion.succeeded, vec!["/a", "/b", "/d"]);
        assert_eq!(depletion.failed.len(), 1);
        assert_eq!(depletion.failed[0].location, "/c");
        assert!(depletion.still_blocked.is_empty());
        assert_eq!(depletion.rounds, 2);
    }

    #[test]
    fn test_dependent_can_fail_on_its_own_after_dependency_failed() {
        let mut graph = build_graph(vec![decl("a", &[]), decl("b", &["a"])]);
        let order = resolve(&graph).unwrap().order;

        let depletion = deplete(&mut graph, &order, |d| {
            Err(ExError::new(ExErrorKind::ApplyFailed).with_message(format!("{} down", d.name)))
        });

        let failed: Vec<_> = depletion.failed.iter().map(|f| f.location.as_str()).collect();
        assert_eq!(failed, vec!["/a", "/b"]);
        assert_eq!(depletion.failed[1].error.message(), "b down");
        assert!(depletion.still_blocked.is_empty());
    }

    #[test]
    fn test_nodes_that_never_settle_are_still_blocked() {
        // Unresolved input: a and b wait on each other
        let mut graph = build_graph(vec![decl("a", &["b"]), decl("b", &["a"]), decl("c", &[])]);
        let order = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];

        let depletion = deplete(&mut graph, &order, |_| Ok(()));

        assert_eq!(depletion.succeeded, vec!["/c"]);
        assert_eq!(
            depletion.still_blocked,
            vec![
                BlockedArtifact {
                    location: "/a".to_string(),
                    missing: vec!["b".to_string()],
                },
                BlockedArtifact {
                    location: "/b".to_string(),
                    missing: vec!["a".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_each_node_invoked_at_most_once() {
        let mut graph = build_graph(vec![decl("a", &[]), decl("b", &["a"]), decl("c", &["a", "b"])]);
        let order = resolve(&graph).unwrap().order;
        let mut count = 0;
        let depletion = deplete(&mut graph, &order, |_| {
            count += 1;
            Ok(())
        });
        assert_eq!(count, 3);
        assert!(depletion.rounds <= graph.len());
    }

    #[test]
    fn test_empty_graph_runs_no_rounds() {
        let mut graph = build_graph(Vec::new());
        let depletion = deplete(&mut graph, &[], |_| Ok(()));
        assert_eq!(depletion.rounds, 0);
        assert!(depletion.is_complete());
    }
}
