//! Plugin capability contracts.
//!
//! A [`Plugin`] is a named record of optional capability slots. Each slot holds
//! one implementation of a narrow async trait; the release chain scans the
//! slots during setup instead of probing plugin types at runtime.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::commit::Commit;
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::package::{
    LatestReleases, Package, PackageWithDependencies, PackageWithLatestRelease, ReleasedPackage,
};
use crate::version::ReleaseType;

/// One named operation a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Setup,
    LastRelease,
    ExtractCommits,
    ReleaseType,
    PrepareAll,
    PrepareSingle,
    Publish,
    PostPublish,
}

impl Capability {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Setup => "setup",
            Capability::LastRelease => "last-release",
            Capability::ExtractCommits => "extract-commits",
            Capability::ReleaseType => "release-type",
            Capability::PrepareAll => "prepare-all",
            Capability::PrepareSingle => "prepare-single",
            Capability::Publish => "publish",
            Capability::PostPublish => "post-publish",
        }
    }

    /// Single-owner capabilities keep only the last registered provider.
    #[inline]
    pub fn is_single_owner(&self) -> bool {
        matches!(
            self,
            Capability::LastRelease | Capability::ExtractCommits | Capability::ReleaseType
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates and configures a plugin before any other step runs.
#[async_trait]
pub trait SetupHook: Send + Sync {
    /// Returns `Ok(false)` when the plugin cannot run in this context.
    async fn setup(&self, ctx: &ReleaseContext) -> Result<bool>;
}

/// Finds the latest released version of every package.
#[async_trait]
pub trait LastReleaseProvider: Send + Sync {
    async fn last_releases(
        &self,
        packages: &[Package],
        ctx: &ReleaseContext,
    ) -> Result<LatestReleases>;
}

/// Lists the commits relevant to a package since its latest release.
#[async_trait]
pub trait CommitExtractor: Send + Sync {
    async fn extract_commits(
        &self,
        package: &PackageWithLatestRelease,
        ctx: &ReleaseContext,
    ) -> Result<Vec<Commit>>;
}

/// Turns commits into a release type.
#[async_trait]
pub trait ReleaseAnalyzer: Send + Sync {
    async fn release_type(
        &self,
        commits: &[Commit],
        deps_changed: bool,
        ctx: &ReleaseContext,
    ) -> Result<ReleaseType>;
}

/// Package sets handed to preparation steps.
#[derive(Debug, Clone, Copy)]
pub struct PrepareInfo<'a> {
    pub found_packages: &'a [PackageWithDependencies],
    pub changed_packages: &'a [PackageWithDependencies],
}

/// Prepares all packages at once, typically a workspace-wide build.
#[async_trait]
pub trait PrepareAll: Send + Sync {
    async fn prepare_all(&self, info: &PrepareInfo<'_>, ctx: &ReleaseContext) -> Result<()>;
}

/// Prepares one package; called for every package in dependency order.
#[async_trait]
pub trait PrepareSingle: Send + Sync {
    async fn prepare_single(
        &self,
        info: &PrepareInfo<'_>,
        target: &PackageWithDependencies,
        ctx: &ReleaseContext,
    ) -> Result<()>;
}

/// Publishes a package to a registry.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, package: &Package, ctx: &ReleaseContext) -> Result<()>;
}

/// Side effects after a successful publish: tags, release notes, webhooks.
#[async_trait]
pub trait PostPublisher: Send + Sync {
    async fn post_publish(&self, released: &ReleasedPackage, ctx: &ReleaseContext)
        -> Result<()>;
}

/// A named set of capability implementations.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    pub(crate) setup: Option<Arc<dyn SetupHook>>,
    pub(crate) last_release: Option<Arc<dyn LastReleaseProvider>>,
    pub(crate) commit_extractor: Option<Arc<dyn CommitExtractor>>,
    pub(crate) release_analyzer: Option<Arc<dyn ReleaseAnalyzer>>,
    pub(crate) prepare_all: Option<Arc<dyn PrepareAll>>,
    pub(crate) prepare_single: Option<Arc<dyn PrepareSingle>>,
    pub(crate) publisher: Option<Arc<dyn Publisher>>,
    pub(crate) post_publisher: Option<Arc<dyn PostPublisher>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            last_release: None,
            commit_extractor: None,
            release_analyzer: None,
            prepare_all: None,
            prepare_single: None,
            publisher: None,
            post_publisher: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_setup(mut self, hook: Arc<dyn SetupHook>) -> Self {
        self.setup = Some(hook);
        self
    }

    pub fn with_last_release(mut self, provider: Arc<dyn LastReleaseProvider>) -> Self {
        self.last_release = Some(provider);
        self
    }

    pub fn with_commit_extractor(mut self, extractor: Arc<dyn CommitExtractor>) -> Self {
        self.commit_extractor = Some(extractor);
        self
    }

    pub fn with_release_analyzer(mut self, analyzer: Arc<dyn ReleaseAnalyzer>) -> Self {
        self.release_analyzer = Some(analyzer);
        self
    }

    pub fn with_prepare_all(mut self, preparer: Arc<dyn PrepareAll>) -> Self {
        self.prepare_all = Some(preparer);
        self
    }

    pub fn with_prepare_single(mut self, preparer: Arc<dyn PrepareSingle>) -> Self {
        self.prepare_single = Some(preparer);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_post_publisher(mut self, post_publisher: Arc<dyn PostPublisher>) -> Self {
        self.post_publisher = Some(post_publisher);
        self
    }

    /// Capabilities this plugin fills, in pipeline order.
    pub fn capabilities(&self) -> Vec<Capability> {
        [
            (self.setup.is_some(), Capability::Setup),
            (self.last_release.is_some(), Capability::LastRelease),
            (self.commit_extractor.is_some(), Capability::ExtractCommits),
            (self.release_analyzer.is_some(), Capability::ReleaseType),
            (self.prepare_all.is_some(), Capability::PrepareAll),
            (self.prepare_single.is_some(), Capability::PrepareSingle),
            (self.publisher.is_some(), Capability::Publish),
            (self.post_publisher.is_some(), Capability::PostPublish),
        ]
        .into_iter()
        .filter_map(|(present, capability)| present.then_some(capability))
        .collect()
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
