//! Workspace adapter trait for discovering packages and rewriting manifests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::ReleaseContext;
use crate::error::{Error, Result};
use crate::package::{DependencyEdge, LatestReleases, Package, PackageManifest, PackageWithDependencies};
use crate::version::{range_for_bump, Version};

/// Version changes to write into one package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPatch {
    pub package: Package,
    /// Version the manifest should declare.
    pub version: Version,
    /// Workspace dependency edges with their rewritten ranges.
    pub dependencies: Vec<(DependencyEdge, String)>,
}

impl ManifestPatch {
    /// Computes the manifest changes for `package`.
    ///
    /// The package and each of its workspace dependencies get their new version
    /// when they are released now, or their latest release otherwise. Ranges keep
    /// the looseness they were declared with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingVersion`] if the package or one of its
    /// dependencies has neither a new version nor a previous release.
    pub fn compute(
        package: &PackageWithDependencies,
        new_versions: &HashMap<String, Option<Version>>,
        latest_releases: &LatestReleases,
    ) -> Result<Self> {
        let version = resolve_version(&package.package.name, new_versions, latest_releases)?;

        let dependencies = package
            .depends_on
            .iter()
            .map(|edge| {
                let dep_version = resolve_version(&edge.name, new_versions, latest_releases)?;
                let range = range_for_bump(&edge.declared_range, &dep_version.to_string());
                Ok((edge.clone(), range))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            package: package.package.clone(),
            version,
            dependencies,
        })
    }
}

fn resolve_version(
    name: &str,
    new_versions: &HashMap<String, Option<Version>>,
    latest_releases: &LatestReleases,
) -> Result<Version> {
    new_versions
        .get(name)
        .copied()
        .flatten()
        .or_else(|| latest_releases.get(name).copied().flatten())
        .ok_or_else(|| Error::MissingVersion {
            package: name.to_string(),
        })
}

/// Trait for workspace-specific package discovery and manifest editing.
///
/// Adapters locate manifests and rewrite versions. They do not build or
/// publish anything; that belongs to plugins.
#[async_trait]
pub trait WorkspaceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Finds releasable packages together with their raw dependency maps.
    async fn discover(&self, ctx: &ReleaseContext) -> Result<Vec<PackageManifest>>;

    /// Writes a computed patch into the package manifest.
    async fn apply_patch(&self, patch: &ManifestPatch) -> Result<()>;
}
