//! Plugin orchestration: composes plugins into one release pipeline.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info, warn, Instrument};

use crate::commit::Commit;
use crate::context::ReleaseContext;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::package::{
    LatestReleases, Package, PackageWithLatestRelease, ReleasedPackage,
};
use crate::plugin::{
    Capability, CommitExtractor, LastReleaseProvider, Plugin, PostPublisher, PrepareAll,
    PrepareInfo, PrepareSingle, Publisher, ReleaseAnalyzer, SetupHook,
};
use crate::version::ReleaseType;

/// Lifecycle of a [`ReleaseChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Scanning,
    Validating,
    Initializing,
    Ready,
    Failed,
}

struct Registered<T: ?Sized> {
    plugin: String,
    provider: Arc<T>,
}

impl<T: ?Sized> Registered<T> {
    fn new(plugin: &Plugin, provider: &Arc<T>) -> Self {
        Self {
            plugin: plugin.name().to_string(),
            provider: Arc::clone(provider),
        }
    }
}

enum Preparer {
    All(Registered<dyn PrepareAll>),
    Single(Registered<dyn PrepareSingle>),
}

impl Preparer {
    fn plugin(&self) -> &str {
        match self {
            Preparer::All(registered) => &registered.plugin,
            Preparer::Single(registered) => &registered.plugin,
        }
    }
}

/// Release pipeline assembled from a list of plugins.
///
/// `last-release`, `extract-commits` and `release-type` have exactly one
/// provider: a later plugin replaces an earlier one. Every other capability
/// runs all its providers in registration order. State is only mutated by
/// [`ReleaseChain::setup`]; after that the chain is used through `&self`.
pub struct ReleaseChain {
    plugins: Vec<Plugin>,
    state: ChainState,
    setup_hooks: Vec<Registered<dyn SetupHook>>,
    last_release: Option<Registered<dyn LastReleaseProvider>>,
    commit_extractor: Option<Registered<dyn CommitExtractor>>,
    release_analyzer: Option<Registered<dyn ReleaseAnalyzer>>,
    preparers: Vec<Preparer>,
    publishers: Vec<Registered<dyn Publisher>>,
    post_publishers: Vec<Registered<dyn PostPublisher>>,
}

impl ReleaseChain {
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self {
            plugins,
            state: ChainState::Scanning,
            setup_hooks: Vec::new(),
            last_release: None,
            commit_extractor: None,
            release_analyzer: None,
            preparers: Vec::new(),
            publishers: Vec::new(),
            post_publishers: Vec::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> ChainState {
        self.state
    }

    #[inline]
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Scans plugins, checks mandatory capabilities and runs setup hooks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetupFailure`] if a mandatory capability has no
    /// provider, a setup hook returns `false` or fails, or setup already ran.
    pub async fn setup(&mut self, ctx: &ReleaseContext) -> Result<()> {
        if self.state != ChainState::Scanning {
            return Err(Error::SetupFailure(
                "release chain setup can only run once".to_string(),
            ));
        }

        self.scan();

        self.state = ChainState::Validating;
        if let Err(e) = self.validate() {
            self.state = ChainState::Failed;
            error!("{}", e);
            return Err(e);
        }

        self.state = ChainState::Initializing;
        for hook in &self.setup_hooks {
            info!("Running \"setup\" step of \"{}\" plugin", hook.plugin);
            let outcome = hook
                .provider
                .setup(ctx)
                .instrument(ctx.span().clone())
                .await;

            let failure = match outcome {
                Ok(true) => continue,
                Ok(false) => format!("\"setup\" step of \"{}\" plugin was not successful", hook.plugin),
                Err(e) => format!("\"setup\" step of \"{}\" plugin failed: {}", hook.plugin, e),
            };
            self.state = ChainState::Failed;
            error!("{}", failure);
            return Err(Error::SetupFailure(failure));
        }

        self.state = ChainState::Ready;
        Ok(())
    }

    fn scan(&mut self) {
        debug!("Scanning {} plugins", self.plugins.len());

        for plugin in &self.plugins {
            debug!(
                "Scanning \"{}\" plugin: [{}]",
                plugin.name(),
                plugin
                    .capabilities()
                    .iter()
                    .map(Capability::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            if let Some(hook) = &plugin.setup {
                let already_registered = self
                    .setup_hooks
                    .iter()
                    .any(|registered| same_provider(&registered.provider, hook));
                if !already_registered {
                    self.setup_hooks.push(Registered::new(plugin, hook));
                }
            }

            if let Some(provider) = &plugin.last_release {
                replace_single(&mut self.last_release, plugin, provider, Capability::LastRelease);
            }
            if let Some(provider) = &plugin.commit_extractor {
                replace_single(
                    &mut self.commit_extractor,
                    plugin,
                    provider,
                    Capability::ExtractCommits,
                );
            }
            if let Some(provider) = &plugin.release_analyzer {
                replace_single(
                    &mut self.release_analyzer,
                    plugin,
                    provider,
                    Capability::ReleaseType,
                );
            }

            match (&plugin.prepare_all, &plugin.prepare_single) {
                (Some(all), single) => {
                    if single.is_some() {
                        warn!(
                            "\"{}\" plugin implements both \"prepare-all\" and \"prepare-single\"; only \"prepare-all\" will run",
                            plugin.name()
                        );
                    }
                    self.preparers.push(Preparer::All(Registered::new(plugin, all)));
                }
                (None, Some(single)) => {
                    self.preparers
                        .push(Preparer::Single(Registered::new(plugin, single)));
                }
                (None, None) => {}
            }

            if let Some(publisher) = &plugin.publisher {
                self.publishers.push(Registered::new(plugin, publisher));
            }
            if let Some(post_publisher) = &plugin.post_publisher {
                self.post_publishers
                    .push(Registered::new(plugin, post_publisher));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            (self.last_release.is_none(), Capability::LastRelease),
            (self.commit_extractor.is_none(), Capability::ExtractCommits),
            (self.release_analyzer.is_none(), Capability::ReleaseType),
        ]
        .into_iter()
        .filter_map(|(missing, capability)| missing.then_some(capability.as_str()))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::SetupFailure(format!(
                "no plugins providing mandatory steps: {}",
                missing.join(", ")
            )))
        }
    }

    fn ensure_ready(&self, capability: Capability) -> Result<()> {
        if self.state == ChainState::Ready {
            Ok(())
        } else {
            Err(Error::NotReady(capability))
        }
    }

    /// Latest release of every package. Packages the provider does not
    /// mention are reported as never released.
    pub async fn last_releases(
        &self,
        packages: &[Package],
        ctx: &ReleaseContext,
    ) -> Result<LatestReleases> {
        self.ensure_ready(Capability::LastRelease)?;
        let getter = self
            .last_release
            .as_ref()
            .ok_or(Error::NotReady(Capability::LastRelease))?;

        info!("Running \"last-release\" step of \"{}\" plugin", getter.plugin);
        let mut releases = getter
            .provider
            .last_releases(packages, ctx)
            .instrument(ctx.span().clone())
            .await?;

        for package in packages {
            releases.entry(package.name.clone()).or_insert(None);
        }
        Ok(releases)
    }

    pub async fn extract_commits(
        &self,
        package: &PackageWithLatestRelease,
        ctx: &ReleaseContext,
    ) -> Result<Vec<Commit>> {
        self.ensure_ready(Capability::ExtractCommits)?;
        let extractor = self
            .commit_extractor
            .as_ref()
            .ok_or(Error::NotReady(Capability::ExtractCommits))?;

        debug!("Running \"extract-commits\" step of \"{}\" plugin", extractor.plugin);
        extractor
            .provider
            .extract_commits(package, ctx)
            .instrument(ctx.span().clone())
            .await
    }

    pub async fn release_type(
        &self,
        commits: &[Commit],
        deps_changed: bool,
        ctx: &ReleaseContext,
    ) -> Result<ReleaseType> {
        self.ensure_ready(Capability::ReleaseType)?;
        let analyzer = self
            .release_analyzer
            .as_ref()
            .ok_or(Error::NotReady(Capability::ReleaseType))?;

        debug!("Running \"release-type\" step of \"{}\" plugin", analyzer.plugin);
        analyzer
            .provider
            .release_type(commits, deps_changed, ctx)
            .instrument(ctx.span().clone())
            .await
    }

    /// Runs every preparer in registration order.
    ///
    /// `prepare-single` providers see every found package, batch by batch in
    /// dependency order (honouring the context's ignore overrides); packages of
    /// one batch are prepared concurrently.
    pub async fn prepare(&self, info: &PrepareInfo<'_>, ctx: &ReleaseContext) -> Result<()> {
        self.ensure_ready(Capability::PrepareAll)?;

        let has_single = self
            .preparers
            .iter()
            .any(|p| matches!(p, Preparer::Single(_)));
        let graph = has_single.then(|| DependencyGraph::new(info.found_packages.to_vec()));

        for preparer in &self.preparers {
            match preparer {
                Preparer::All(registered) => {
                    info!("Running \"prepare-all\" step of \"{}\" plugin", registered.plugin);
                    registered
                        .provider
                        .prepare_all(info, ctx)
                        .instrument(ctx.span().clone())
                        .await
                        .map_err(|e| Error::plugin(&registered.plugin, e.to_string()))?;
                }
                Preparer::Single(registered) => {
                    info!("Running \"prepare-single\" step of \"{}\" plugin", registered.plugin);
                    let Some(graph) = graph.as_ref() else {
                        continue;
                    };

                    for batch in graph.execution_batches(ctx.ignore_dependencies())? {
                        let runs = batch.into_iter().map(|target| {
                            let scoped = ctx.scoped(target.name());
                            let provider = &registered.provider;
                            async move {
                                provider
                                    .prepare_single(info, target, &scoped)
                                    .instrument(scoped.span().clone())
                                    .await
                                    .map_err(|e| e.in_stage(Capability::PrepareSingle, target.name()))
                            }
                        });
                        try_join_all(runs).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Runs every publisher for `package`; the first failure stops the rest.
    pub async fn publish(&self, package: &Package, ctx: &ReleaseContext) -> Result<()> {
        self.ensure_ready(Capability::Publish)?;

        for publisher in &self.publishers {
            info!("Running \"publish\" step of \"{}\" plugin", publisher.plugin);
            publisher
                .provider
                .publish(package, ctx)
                .instrument(ctx.span().clone())
                .await
                .map_err(|e| e.in_stage(Capability::Publish, &package.name))?;
        }

        Ok(())
    }

    /// Runs every post-publisher for a released package, in registration order.
    pub async fn post_publish(
        &self,
        released: &ReleasedPackage,
        ctx: &ReleaseContext,
    ) -> Result<()> {
        self.ensure_ready(Capability::PostPublish)?;

        for post_publisher in &self.post_publishers {
            info!("Running \"post-publish\" step of \"{}\" plugin", post_publisher.plugin);
            post_publisher
                .provider
                .post_publish(released, ctx)
                .instrument(ctx.span().clone())
                .await
                .map_err(|e| e.in_stage(Capability::PostPublish, &released.package.name))?;
        }

        Ok(())
    }

    /// Name of the plugin serving a single-owner capability.
    pub fn provider_of(&self, capability: Capability) -> Option<&str> {
        match capability {
            Capability::LastRelease => self.last_release.as_ref().map(|r| r.plugin.as_str()),
            Capability::ExtractCommits => {
                self.commit_extractor.as_ref().map(|r| r.plugin.as_str())
            }
            Capability::ReleaseType => self.release_analyzer.as_ref().map(|r| r.plugin.as_str()),
            _ => None,
        }
    }

    /// Names of the plugins registered for a multi-owner capability, in run order.
    pub fn providers_of(&self, capability: Capability) -> Vec<&str> {
        match capability {
            Capability::Setup => self.setup_hooks.iter().map(|r| r.plugin.as_str()).collect(),
            Capability::PrepareAll => self
                .preparers
                .iter()
                .filter(|p| matches!(p, Preparer::All(_)))
                .map(Preparer::plugin)
                .collect(),
            Capability::PrepareSingle => self
                .preparers
                .iter()
                .filter(|p| matches!(p, Preparer::Single(_)))
                .map(Preparer::plugin)
                .collect(),
            Capability::Publish => self.publishers.iter().map(|r| r.plugin.as_str()).collect(),
            Capability::PostPublish => self
                .post_publishers
                .iter()
                .map(|r| r.plugin.as_str())
                .collect(),
            single => self.provider_of(single).into_iter().collect(),
        }
    }
}

fn replace_single<T: ?Sized>(
    slot: &mut Option<Registered<T>>,
    plugin: &Plugin,
    provider: &Arc<T>,
    capability: Capability,
) {
    if let Some(previous) = slot.as_ref() {
        info!(
            "Found \"{}\" step of \"{}\" plugin. Overriding previous one from \"{}\"",
            capability,
            plugin.name(),
            previous.plugin
        );
    } else {
        debug!("Found \"{}\" step of \"{}\" plugin", capability, plugin.name());
    }
    *slot = Some(Registered::new(plugin, provider));
}

fn same_provider<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
