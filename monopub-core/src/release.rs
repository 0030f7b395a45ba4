//! Release driver: discovers packages, plans versions and runs the pipeline.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{error, info, warn, Instrument};

use crate::adapter::{ManifestPatch, WorkspaceAdapter};
use crate::chain::ReleaseChain;
use crate::commit::Commit;
use crate::context::ReleaseContext;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::package::{
    BumpedDependency, LatestReleases, Package, PackageWithDependencies, PackageWithLatestRelease,
    ReleasedPackage,
};
use crate::plugin::{Capability, Plugin, PrepareInfo};
use crate::version::{is_package_changed, next_version, ReleaseType, Version};

/// Driver behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Stop after computing versions: no manifest writes, builds or publishing.
    pub dry_run: bool,
    /// Keep publishing independent packages after a publish failure.
    pub continue_on_error: bool,
}

/// Computed release data for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasePlanEntry {
    pub name: String,
    pub old_version: Option<Version>,
    pub new_version: Option<Version>,
    pub release_type: ReleaseType,
    pub commits: Vec<Commit>,
}

impl ReleasePlanEntry {
    /// Whether this package gets published.
    pub fn is_changed(&self) -> bool {
        is_package_changed(self.new_version, self.old_version, self.release_type)
    }
}

/// Release plan keyed by package name, in release order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleasePlan {
    pub entries: IndexMap<String, ReleasePlanEntry>,
}

impl ReleasePlan {
    pub fn get(&self, name: &str) -> Option<&ReleasePlanEntry> {
        self.entries.get(name)
    }

    /// Packages in release order.
    pub fn order(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Entries that will be published, in release order.
    pub fn changed(&self) -> impl Iterator<Item = &ReleasePlanEntry> {
        self.entries.values().filter(|entry| entry.is_changed())
    }

    fn release_type(&self, name: &str) -> ReleaseType {
        self.entries
            .get(name)
            .map(|entry| entry.release_type)
            .unwrap_or_default()
    }
}

/// Outcome of a release run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseReport {
    pub plan: ReleasePlan,
    pub dry_run: bool,
    /// Packages published, in publish order.
    pub published: Vec<String>,
    /// Packages not published because a dependency failed.
    pub skipped: Vec<String>,
    /// Packages whose publish step failed.
    pub failed: Vec<String>,
    /// Published packages whose post-publish step failed. They are also
    /// listed in `published` and do not block their dependents.
    pub post_publish_failed: Vec<String>,
}

/// Engine for planning and executing releases.
pub struct ReleaseEngine {
    adapter: Box<dyn WorkspaceAdapter>,
    chain: ReleaseChain,
    options: ReleaseOptions,
}

impl ReleaseEngine {
    /// Creates a release engine over a workspace adapter and an ordered
    /// plugin list.
    pub fn new<A>(adapter: A, plugins: Vec<Plugin>) -> Self
    where
        A: WorkspaceAdapter + 'static,
    {
        Self {
            adapter: Box::new(adapter),
            chain: ReleaseChain::new(plugins),
            options: ReleaseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReleaseOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the full release.
    ///
    /// # Errors
    ///
    /// Fails on cyclic dependencies, unsuccessful plugin setup and any error of
    /// a per-package stage. With `continue_on_error`, publish failures are
    /// collected and reported as [`Error::PartialRelease`], which carries the
    /// full report.
    pub async fn run(mut self, ctx: &ReleaseContext) -> Result<ReleaseReport> {
        info!("Starting releasing process...");
        let manifests = self.adapter.discover(ctx).await?;
        if manifests.is_empty() {
            info!("No matching packages found. Exiting...");
            return Ok(ReleaseReport {
                dry_run: self.options.dry_run,
                ..ReleaseReport::default()
            });
        }
        info!(
            "Found {} packages to release: [{}]",
            manifests.len(),
            quoted(manifests.iter().map(|m| m.name.as_str()))
        );

        info!("Calculating release order based on packages dependencies and devDependencies...");
        let graph = DependencyGraph::from_manifests(&manifests);
        let order: Vec<&PackageWithDependencies> = graph
            .execution_order(ctx.ignore_dependencies())
            .inspect_err(|e| error!("{}", e))?;
        info!("Packages release order: [{}]", quoted(order.iter().map(|p| p.name())));

        info!(
            "Found {} plugins to form release chain: [{}]",
            self.chain.plugins().len(),
            quoted(self.chain.plugins().iter().map(Plugin::name))
        );
        self.chain.setup(ctx).await?;

        let packages: Vec<Package> = graph.packages().iter().map(|p| p.package.clone()).collect();
        info!("Searching for the latest releases...");
        let latest_releases = self.chain.last_releases(&packages, ctx).await?;

        let plan = self.plan(&order, &latest_releases, ctx).await?;

        let mut report = ReleaseReport {
            dry_run: self.options.dry_run,
            ..ReleaseReport::default()
        };
        if self.options.dry_run {
            info!("Dry run: skipping manifest updates, preparation and publishing");
            report.plan = plan;
            return Ok(report);
        }

        self.patch_manifests(&graph, &plan, &latest_releases, ctx)
            .await?;

        let changed_packages: Vec<PackageWithDependencies> = graph
            .packages()
            .iter()
            .filter(|p| plan.get(p.name()).is_some_and(ReleasePlanEntry::is_changed))
            .cloned()
            .collect();
        let info = PrepareInfo {
            found_packages: graph.packages(),
            changed_packages: &changed_packages,
        };
        self.chain.prepare(&info, ctx).await?;

        self.publish_all(&graph, &order, &plan, &latest_releases, ctx, &mut report)
            .await?;
        report.plan = plan;

        if report.failed.is_empty() && report.post_publish_failed.is_empty() {
            Ok(report)
        } else {
            Err(Error::PartialRelease {
                report: Box::new(report),
            })
        }
    }

    /// Extracts commits and classifies every package in dependency order, so
    /// each package sees the final release types of its dependencies.
    async fn plan(
        &self,
        order: &[&PackageWithDependencies],
        latest_releases: &LatestReleases,
        ctx: &ReleaseContext,
    ) -> Result<ReleasePlan> {
        let mut plan = ReleasePlan::default();

        for package in order {
            let name = package.name();
            let deps_changed = package
                .depends_on
                .iter()
                .filter(|dep| !DependencyGraph::is_ignored(ctx.ignore_dependencies(), name, &dep.name))
                .any(|dep| !plan.release_type(&dep.name).is_none());

            let scoped = ctx.scoped(name);
            let latest_release = latest_releases.get(name).copied().flatten();
            let entry = self
                .plan_package(package, latest_release, deps_changed, &scoped)
                .instrument(scoped.span().clone())
                .await?;
            plan.entries.insert(name.to_string(), entry);
        }

        Ok(plan)
    }

    async fn plan_package(
        &self,
        package: &PackageWithDependencies,
        latest_release: Option<Version>,
        deps_changed: bool,
        ctx: &ReleaseContext,
    ) -> Result<ReleasePlanEntry> {
        let name = package.name();
        match latest_release {
            Some(version) => info!("Found latest release version: {}", version),
            None => info!("No previous releases found..."),
        }

        let commits = self
            .chain
            .extract_commits(
                &PackageWithLatestRelease {
                    package: package.package.clone(),
                    latest_release,
                },
                ctx,
            )
            .await
            .map_err(|e| e.in_stage(Capability::ExtractCommits, name))?;
        info!("Found {} commits since last release", commits.len());

        let release_type = self
            .chain
            .release_type(&commits, deps_changed, ctx)
            .await
            .map_err(|e| e.in_stage(Capability::ReleaseType, name))?;
        let new_version = next_version(latest_release, release_type)
            .map_err(|e| e.in_stage(Capability::ReleaseType, name))?;

        match (new_version, latest_release) {
            (Some(new), Some(old)) if !release_type.is_none() => info!(
                "Found \"{}\" relevant changes since latest released version (\"{}\"). So the next version of the package is \"{}\"",
                release_type, old, new
            ),
            (Some(new), None) if !release_type.is_none() => info!(
                "Package has no previous releases, but \"{}\" relevant changes found, that's why package will be released under \"{}\" version",
                release_type, new
            ),
            _ => info!("There are no relevant changes found, so no new version will be released"),
        }

        Ok(ReleasePlanEntry {
            name: name.to_string(),
            old_version: latest_release,
            new_version,
            release_type,
            commits,
        })
    }

    async fn patch_manifests(
        &self,
        graph: &DependencyGraph,
        plan: &ReleasePlan,
        latest_releases: &LatestReleases,
        ctx: &ReleaseContext,
    ) -> Result<()> {
        let new_versions: HashMap<String, Option<Version>> = plan
            .entries
            .values()
            .map(|entry| (entry.name.clone(), entry.new_version))
            .collect();

        for package in graph.packages() {
            if plan.release_type(package.name()).is_none() {
                continue;
            }
            let scoped = ctx.scoped(package.name());
            info!(parent: scoped.span(), "Patching manifest with a new version criteria");

            let patch = ManifestPatch::compute(package, &new_versions, latest_releases)?;
            self.adapter
                .apply_patch(&patch)
                .instrument(scoped.span().clone())
                .await?;
        }

        Ok(())
    }

    async fn publish_all(
        &self,
        graph: &DependencyGraph,
        order: &[&PackageWithDependencies],
        plan: &ReleasePlan,
        latest_releases: &LatestReleases,
        ctx: &ReleaseContext,
        report: &mut ReleaseReport,
    ) -> Result<()> {
        let mut blocked: HashSet<String> = HashSet::new();

        for package in order {
            let name = package.name();
            let Some(entry) = plan.get(name).filter(|entry| entry.is_changed()) else {
                continue;
            };
            let Some(new_version) = entry.new_version else {
                continue;
            };
            let scoped = ctx.scoped(name);

            if let Some(dep) = package.depends_on.iter().find(|dep| blocked.contains(&dep.name)) {
                warn!(parent: scoped.span(), "Skipping publish because dependency \"{}\" was not released", dep.name);
                blocked.insert(name.to_string());
                report.skipped.push(name.to_string());
                continue;
            }

            let released = ReleasedPackage {
                package: package.package.clone(),
                old_version: entry.old_version,
                new_version,
                release_type: entry.release_type,
                commits: entry.commits.clone(),
                bumped_deps: bumped_dependencies(package, graph, plan, latest_releases),
            };

            match self.chain.publish(&released.package, &scoped).await {
                Ok(()) => report.published.push(name.to_string()),
                Err(e) if self.options.continue_on_error => {
                    error!(parent: scoped.span(), "{}", e);
                    blocked.insert(name.to_string());
                    report.failed.push(name.to_string());
                    continue;
                }
                Err(e) => return Err(stop_release(e, &scoped, &report.published)),
            }

            match self.chain.post_publish(&released, &scoped).await {
                Ok(()) => info!(parent: scoped.span(), "Package is successfully published!"),
                Err(e) if self.options.continue_on_error => {
                    error!(parent: scoped.span(), "Package is published, but {}", e);
                    report.post_publish_failed.push(name.to_string());
                }
                Err(e) => return Err(stop_release(e, &scoped, &report.published)),
            }
        }

        Ok(())
    }
}

/// Dependencies of `package` that get a new version in this release.
fn bumped_dependencies(
    package: &PackageWithDependencies,
    graph: &DependencyGraph,
    plan: &ReleasePlan,
    latest_releases: &LatestReleases,
) -> Vec<BumpedDependency> {
    let mut seen = HashSet::new();

    package
        .depends_on
        .iter()
        .filter(|dep| seen.insert(dep.name.as_str()))
        .filter_map(|dep| {
            let entry = plan.get(&dep.name)?;
            let new_version = entry.new_version?;
            let old_version = latest_releases.get(&dep.name).copied().flatten();
            if entry.release_type.is_none() || Some(new_version) == old_version {
                return None;
            }
            Some(BumpedDependency {
                package: graph.get_package(&dep.name)?.package.clone(),
                old_version,
                new_version,
                release_type: entry.release_type,
            })
        })
        .collect()
}

fn stop_release(e: Error, ctx: &ReleaseContext, published: &[String]) -> Error {
    error!(parent: ctx.span(), "{}", e);
    if !published.is_empty() {
        warn!(
            "Release stopped after publishing: [{}]. Those packages are not rolled back",
            quoted(published.iter().map(String::as_str))
        );
    }
    e
}

fn quoted<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}
