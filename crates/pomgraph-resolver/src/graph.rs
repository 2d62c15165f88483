//! Dependency graph reconstruction from a flat package list.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use pomgraph_core::package::{Package, Relationship};

/// A node of the package graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode<'a> {
    Package(&'a Package),
    /// Target of a `depends_on` entry that names no known package.
    Missing(&'a str),
}

impl<'a> GraphNode<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            GraphNode::Package(pkg) => &pkg.id,
            GraphNode::Missing(id) => id,
        }
    }
}

/// Borrowed view of a package list as a directed graph.
///
/// Dangling edges point at [`GraphNode::Missing`] nodes. Cycles and
/// repeated `depends_on` entries are kept as they are.
pub struct PackageGraph<'a> {
    graph: DiGraph<GraphNode<'a>, ()>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> PackageGraph<'a> {
    pub fn from_packages(packages: &'a [Package]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for pkg in packages {
            index
                .entry(pkg.id.as_str())
                .or_insert_with(|| graph.add_node(GraphNode::Package(pkg)));
        }

        for pkg in packages {
            let from = index[pkg.id.as_str()];
            for dep in &pkg.depends_on {
                let to = *index
                    .entry(dep.as_str())
                    .or_insert_with(|| graph.add_node(GraphNode::Missing(dep)));
                graph.add_edge(from, to, ());
            }
        }

        Self { graph, index }
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> GraphNode<'a> {
        self.graph[idx]
    }

    /// Outgoing neighbours sorted by ID.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort_by_key(|&c| self.graph[c].id());
        children
    }

    fn is_referenced(&self, idx: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .is_some()
    }

    /// Starting points of the tree view, sorted by name.
    ///
    /// Without `show_all`, these are the Root, Direct and Workspace
    /// packages. With it, every package nobody depends on, plus all Root
    /// and Workspace packages.
    pub fn root_packages(&self, show_all: bool) -> Vec<NodeIndex> {
        let mut roots: Vec<(NodeIndex, &'a Package)> = self
            .graph
            .node_indices()
            .filter_map(|idx| match self.graph[idx] {
                GraphNode::Package(pkg) => Some((idx, pkg)),
                GraphNode::Missing(_) => None,
            })
            .filter(|(idx, pkg)| {
                if show_all {
                    !self.is_referenced(*idx)
                        || matches!(
                            pkg.relationship,
                            Relationship::Root | Relationship::Workspace
                        )
                } else {
                    pkg.relationship.is_top_level()
                }
            })
            .collect();
        roots.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        roots.into_iter().map(|(idx, _)| idx).collect()
    }
}

/// Root packages of `packages` for the tree view.
pub fn find_root_packages(packages: &[Package], show_all: bool) -> Vec<&Package> {
    let graph = PackageGraph::from_packages(packages);
    graph
        .root_packages(show_all)
        .into_iter()
        .filter_map(|idx| match graph.node(idx) {
            GraphNode::Package(pkg) => Some(pkg),
            GraphNode::Missing(_) => None,
        })
        .collect()
}
