//! Package data models.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::version::{ReleaseType, Version};

/// Latest released version per package name; `None` means never released.
pub type LatestReleases = HashMap<String, Option<Version>>;

/// A releasable package in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name.
    pub name: String,
    /// Path to the package manifest.
    pub location: PathBuf,
}

impl Package {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Directory containing the manifest.
    pub fn directory(&self) -> &Path {
        self.location.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Kind of a workspace-internal dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Runtime,
    Dev,
}

/// Outgoing edge from a package to another package of the same workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub name: String,
    pub kind: DependencyKind,
    /// Version range as written in the manifest, kept so it can be rewritten.
    pub declared_range: String,
}

impl DependencyEdge {
    pub fn new(
        name: impl Into<String>,
        kind: DependencyKind,
        declared_range: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_range: declared_range.into(),
        }
    }
}

/// A package together with its workspace-internal dependency edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageWithDependencies {
    #[serde(flatten)]
    pub package: Package,
    pub depends_on: Vec<DependencyEdge>,
}

impl PackageWithDependencies {
    pub fn new(package: Package, depends_on: Vec<DependencyEdge>) -> Self {
        Self {
            package,
            depends_on,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.package.name
    }
}

/// A discovered package with the raw dependency maps of its manifest.
///
/// Maps keep declaration order and may reference packages outside the
/// workspace; the graph builder filters them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub location: PathBuf,
    pub dependencies: IndexMap<String, String>,
    pub dev_dependencies: IndexMap<String, String>,
}

impl PackageManifest {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), range.into());
        self
    }

    pub fn with_dev_dependency(
        mut self,
        name: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        self.dev_dependencies.insert(name.into(), range.into());
        self
    }

    pub fn package(&self) -> Package {
        Package::new(self.name.clone(), self.location.clone())
    }
}

/// Package info handed to commit extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageWithLatestRelease {
    pub package: Package,
    pub latest_release: Option<Version>,
}

/// A dependency that gets a new version in the current release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpedDependency {
    pub package: Package,
    pub old_version: Option<Version>,
    pub new_version: Version,
    pub release_type: ReleaseType,
}

/// Everything known about a package once it has been published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedPackage {
    pub package: Package,
    pub old_version: Option<Version>,
    pub new_version: Version,
    pub release_type: ReleaseType,
    pub commits: Vec<crate::commit::Commit>,
    pub bumped_deps: Vec<BumpedDependency>,
}
