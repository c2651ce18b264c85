//! Dependency graph builder.
//!
//! Turns the declarations of one pass into a graph keyed by location.
//! Dependencies are declared by artifact name; names that match nothing in
//! the batch are external and assumed satisfied.

use crate::model::ArtifactDeclaration;
use std::collections::{HashMap, HashSet};

/// One declaration plus its bookkeeping for a single pass
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraphNode {
    pub declaration: ArtifactDeclaration,
    /// Locations of batch-internal dependencies, declared order, no duplicates
    pub dependencies: Vec<String>,
    /// Batch-internal dependencies that have not yet succeeded
    pub unresolved_dependencies: Vec<String>,
    pub resolved: bool,
}

impl DependencyGraphNode {
    pub fn location(&self) -> &str {
        &self.declaration.location
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Drop `location` from the unresolved set; true if it was there
    pub fn mark_dependency_resolved(&mut self, location: &str) -> bool {
        let before = self.unresolved_dependencies.len();
        self.unresolved_dependencies.retain(|l| l != location);
        before != self.unresolved_dependencies.len()
    }
}

/// Graph of one pass's declarations, iterated in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    nodes: Vec<DependencyGraphNode>,
    index: HashMap<String, usize>,
    names: HashMap<String, String>,
    external: Vec<String>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.index.contains_key(location)
    }

    pub fn get(&self, location: &str) -> Option<&DependencyGraphNode> {
        self.index.get(location).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, location: &str) -> Option<&mut DependencyGraphNode> {
        match self.index.get(location) {
            Some(&i) => self.nodes.get_mut(i),
            None => None,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DependencyGraphNode> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut DependencyGraphNode> {
        self.nodes.iter_mut()
    }

    /// Location of the first declaration carrying `name`
    pub fn location_of(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Dependency names matching no declaration, first-seen order
    pub fn external_dependencies(&self) -> &[String] {
        &self.external
    }
}

/// Build the dependency graph for one batch of declarations.
///
/// A repeated location keeps its first declaration. A repeated name
/// resolves to the first declaration that carries it. Pure: the input is
/// only consumed, nothing else is touched.
pub fn build_graph(declarations: Vec<ArtifactDeclaration>) -> DependencyGraph {
    let mut graph = DependencyGraph::default();

    for declaration in declarations {
        if graph.index.contains_key(&declaration.location) {
            continue;
        }
        graph
            .names
            .entry(declaration.name.clone())
            .or_insert_with(|| declaration.location.clone());
        graph
            .index
            .insert(declaration.location.clone(), graph.nodes.len());
        graph.nodes.push(DependencyGraphNode {
            declaration,
            dependencies: Vec::new(),
            unresolved_dependencies: Vec::new(),
            resolved: false,
        });
    }

    let mut seen_external = HashSet::new();
    for i in 0..graph.nodes.len() {
        let mut internal: Vec<String> = Vec::new();
        for dep in &graph.nodes[i].declaration.depends_on {
            match graph.names.get(dep) {
                Some(location) => {
                    if !internal.contains(location) {
                        internal.push(location.clone());
                    }
                }
                None => {
                    if seen_external.insert(dep.clone()) {
                        graph.external.push(dep.clone());
                    }
                }
            }
        }
        graph.nodes[i].unresolved_dependencies = internal.clone();
        graph.nodes[i].dependencies = internal;
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(location: &str, name: &str, deps: &[&str]) -> ArtifactDeclaration {
        ArtifactDeclaration::new(location, name, "test").with_depends_on(deps.iter().copied())
    }

    #[test]
    fn test_internal_dependencies_map_to_locations() {
        let graph = build_graph(vec![
            decl("/roles.role", "roles", &[]),
            decl("/access.access", "access", &["roles"]),
        ]);

        let access = graph.get("/access.access").unwrap();
        assert_eq!(access.dependencies, vec!["/roles.role".to_string()]);
        assert_eq!(access.unresolved_dependencies, access.dependencies);
        assert!(graph.external_dependencies().is_empty());
    }

    #[test]
    fn test_external_dependencies_deduplicated_in_first_seen_order() {
        let graph = build_graph(vec![
            decl("/a", "a", &["zeta", "alpha"]),
            decl("/b", "b", &["alpha", "a"]),
        ]);
        assert_eq!(
            graph.external_dependencies(),
            &["zeta".to_string(), "alpha".to_string()]
        );
    }

    #[test]
    fn test_duplicate_name_resolves_to_first_declaration() {
        let graph = build_graph(vec![
            decl("/x/users.table", "users", &[]),
            decl("/y/users.table", "users", &[]),
            decl("/view.view", "view", &["users"]),
        ]);
        assert_eq!(graph.location_of("users"), Some("/x/users.table"));
        assert_eq!(
            graph.get("/view.view").unwrap().dependencies,
            vec!["/x/users.table".to_string()]
        );
    }

    #[test]
    fn test_repeated_dependency_listed_once() {
        let graph = build_graph(vec![decl("/a", "a", &[]), decl("/b", "b", &["a", "a"])]);
        assert_eq!(graph.get("/b").unwrap().dependencies.len(), 1);
    }

    #[test]
    fn test_duplicate_location_keeps_first() {
        let graph = build_graph(vec![decl("/a", "first", &[]), decl("/a", "second", &[])]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("/a").unwrap().name(), "first");
    }

    #[test]
    fn test_mark_dependency_resolved_shrinks_set() {
        let mut graph = build_graph(vec![decl("/a", "a", &[]), decl("/b", "b", &["a"])]);
        let node = graph.get_mut("/b").unwrap();
        assert!(node.mark_dependency_resolved("/a"));
        assert!(!node.mark_dependency_resolved("/a"));
        assert!(node.unresolved_dependencies.is_empty());
        assert_eq!(node.dependencies, vec!["/a".to_string()]);
    }
}
