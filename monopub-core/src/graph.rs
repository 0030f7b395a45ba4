//! Dependency graph management and release ordering using petgraph.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::package::{DependencyEdge, DependencyKind, PackageManifest, PackageWithDependencies};

/// Dependency edges to leave out of ordering, keyed by the depending package.
///
/// This is the escape hatch for real dependency cycles. Nothing checks that an
/// override actually breaks a cycle, and a misused override can hide a genuine
/// ordering requirement.
pub type IgnoreOverrides = HashMap<String, HashSet<String>>;

/// Resolves manifest dependency maps into workspace-internal edges.
///
/// Dependencies on packages outside `manifests` are dropped.
pub fn resolve_dependencies(manifests: &[PackageManifest]) -> Vec<PackageWithDependencies> {
    let names: HashSet<&str> = manifests.iter().map(|m| m.name.as_str()).collect();

    manifests
        .iter()
        .map(|manifest| {
            let runtime = manifest
                .dependencies
                .iter()
                .map(|(name, range)| (name, range, DependencyKind::Runtime));
            let dev = manifest
                .dev_dependencies
                .iter()
                .map(|(name, range)| (name, range, DependencyKind::Dev));

            let depends_on = runtime
                .chain(dev)
                .filter(|(name, _, _)| names.contains(name.as_str()))
                .map(|(name, range, kind)| DependencyEdge::new(name.clone(), kind, range.clone()))
                .collect();

            PackageWithDependencies::new(manifest.package(), depends_on)
        })
        .collect()
}

/// Directed graph of workspace packages; an edge `p -> d` means `p` depends on `d`.
///
/// Node indices follow input order, which is what makes planning stable.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, DependencyKind>,
    node_map: HashMap<String, NodeIndex>,
    packages: Vec<PackageWithDependencies>,
}

impl DependencyGraph {
    /// Creates a dependency graph. Edges to unknown packages are dropped.
    pub fn new(packages: Vec<PackageWithDependencies>) -> Self {
        let mut graph = DiGraph::with_capacity(packages.len(), 0);
        let mut node_map = HashMap::with_capacity(packages.len());

        for package in &packages {
            let node = graph.add_node(package.name().to_string());
            node_map.insert(package.name().to_string(), node);
        }

        for package in &packages {
            let from = node_map[package.name()];
            for edge in &package.depends_on {
                if let Some(&to) = node_map.get(&edge.name) {
                    graph.add_edge(from, to, edge.kind);
                }
            }
        }

        Self {
            graph,
            node_map,
            packages,
        }
    }

    /// Builds the graph straight from discovered manifests.
    pub fn from_manifests(manifests: &[PackageManifest]) -> Self {
        Self::new(resolve_dependencies(manifests))
    }

    /// All packages in input order.
    #[inline]
    pub fn packages(&self) -> &[PackageWithDependencies] {
        &self.packages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Retrieves a package by name.
    #[inline]
    pub fn get_package(&self, name: &str) -> Option<&PackageWithDependencies> {
        self.node_map
            .get(name)
            .map(|idx| &self.packages[idx.index()])
    }

    /// Returns direct dependencies of a package.
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependencies(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.node(package_name)?;
        Ok(self.neighbors(node, Direction::Outgoing))
    }

    /// Returns direct dependents of a package (packages that depend on it).
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependents(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.node(package_name)?;
        Ok(self.neighbors(node, Direction::Incoming))
    }

    /// Groups packages into batches with no edges inside a batch.
    ///
    /// Each round takes every remaining package whose remaining dependencies
    /// (after dropping edges named in `overrides`) are all in earlier rounds.
    /// Packages inside a batch keep input order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicDependency`] if a round removes nothing while
    /// packages remain.
    pub fn execution_batches(
        &self,
        overrides: &IgnoreOverrides,
    ) -> Result<Vec<Vec<&PackageWithDependencies>>> {
        let mut remaining = vec![true; self.packages.len()];
        let mut left = self.packages.len();
        let mut batches = Vec::new();

        while left > 0 {
            let batch: Vec<NodeIndex> = self
                .graph
                .node_indices()
                .filter(|&node| remaining[node.index()])
                .filter(|&node| {
                    let ignored = overrides.get(&self.graph[node]);
                    self.graph
                        .edges_directed(node, Direction::Outgoing)
                        .map(|edge| edge.target())
                        .filter(|target| remaining[target.index()])
                        .all(|target| {
                            ignored.is_some_and(|names| names.contains(&self.graph[target]))
                        })
                })
                .collect();

            if batch.is_empty() {
                let stuck: Vec<&str> = self
                    .graph
                    .node_indices()
                    .filter(|node| remaining[node.index()])
                    .map(|node| self.graph[node].as_str())
                    .collect();
                return Err(Error::CyclicDependency(stuck.join(", ")));
            }

            for node in &batch {
                remaining[node.index()] = false;
            }
            left -= batch.len();
            batches.push(
                batch
                    .into_iter()
                    .map(|node| &self.packages[node.index()])
                    .collect(),
            );
        }

        Ok(batches)
    }

    /// Returns packages in release order (dependencies before dependents).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicDependency`] if the graph is cyclic after overrides.
    pub fn execution_order(
        &self,
        overrides: &IgnoreOverrides,
    ) -> Result<Vec<&PackageWithDependencies>> {
        Ok(self
            .execution_batches(overrides)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Whether `dependency` is an edge of `package` that `overrides` suppresses.
    pub fn is_ignored(overrides: &IgnoreOverrides, package: &str, dependency: &str) -> bool {
        overrides
            .get(package)
            .is_some_and(|names| names.contains(dependency))
    }

    fn node(&self, package_name: &str) -> Result<NodeIndex> {
        self.node_map
            .get(package_name)
            .copied()
            .ok_or_else(|| Error::PackageNotFound {
                name: package_name.to_string(),
                available: self
                    .packages
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names: Vec<(usize, String)> = self
            .graph
            .neighbors_directed(node, direction)
            .filter(|idx| seen.insert(*idx))
            .map(|idx| (idx.index(), self.graph[idx].clone()))
            .collect();
        names.sort_by_key(|(idx, _)| *idx);
        names.into_iter().map(|(_, name)| name).collect()
    }
}
