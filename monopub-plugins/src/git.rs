//! Git-backed release history: tags as release markers, commits per package.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use monopub_core::commit::Commit;
use monopub_core::context::ReleaseContext;
use monopub_core::error::Result;
use monopub_core::package::{LatestReleases, Package, PackageWithLatestRelease, ReleasedPackage};
use monopub_core::plugin::{CommitExtractor, LastReleaseProvider, Plugin, PostPublisher, SetupHook};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::process;
use crate::tags::{latest_releases, TagFormat, DEFAULT_TAG_FORMAT};

pub const PLUGIN_NAME: &str = "git";

const COMMIT_SEPARATOR: &str = "--monopub-commit-5a8e1f0c3b7d4e2a--";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub tag_format: String,
    /// Push created tags to `remote`.
    pub push_tags: bool,
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            tag_format: DEFAULT_TAG_FORMAT.to_string(),
            push_tags: true,
            remote: "origin".to_string(),
        }
    }
}

/// Reads release history from git and tags new releases.
#[derive(Debug, Clone)]
pub struct GitPlugin {
    tag_format: TagFormat,
    push_tags: bool,
    remote: String,
}

impl GitPlugin {
    /// # Errors
    ///
    /// Returns a configuration error for an invalid tag format.
    pub fn new(config: &GitConfig) -> Result<Self> {
        Ok(Self {
            tag_format: TagFormat::parse(&config.tag_format)?,
            push_tags: config.push_tags,
            remote: config.remote.clone(),
        })
    }

    #[inline]
    pub fn tag_format(&self) -> &TagFormat {
        &self.tag_format
    }

    /// Registers this plugin for setup, last-release, extract-commits and
    /// post-publish.
    pub fn into_plugin(self) -> Plugin {
        let git = Arc::new(self);
        Plugin::new(PLUGIN_NAME)
            .with_setup(git.clone())
            .with_last_release(git.clone())
            .with_commit_extractor(git.clone())
            .with_post_publisher(git)
    }

    async fn git<I, S>(&self, args: I, cwd: &Path) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        process::run(PLUGIN_NAME, "git", args, cwd, &[]).await
    }
}

#[async_trait]
impl SetupHook for GitPlugin {
    async fn setup(&self, ctx: &ReleaseContext) -> Result<bool> {
        match self.git(["rev-parse", "--is-inside-work-tree"], ctx.cwd()).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("{} is not a git repository: {}", ctx.cwd().display(), e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl LastReleaseProvider for GitPlugin {
    async fn last_releases(
        &self,
        packages: &[Package],
        ctx: &ReleaseContext,
    ) -> Result<LatestReleases> {
        let stdout = self.git(["tag", "--merged", "HEAD"], ctx.cwd()).await?;
        let tags: Vec<&str> = stdout.lines().collect();
        debug!("Found {} tags merged into HEAD", tags.len());

        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        latest_releases(&tags, &names, &self.tag_format)
    }
}

#[async_trait]
impl CommitExtractor for GitPlugin {
    async fn extract_commits(
        &self,
        package: &PackageWithLatestRelease,
        ctx: &ReleaseContext,
    ) -> Result<Vec<Commit>> {
        let range = release_range(&self.tag_format, package);
        package_commits(PLUGIN_NAME, &range, &package.package, ctx.cwd()).await
    }
}

#[async_trait]
impl PostPublisher for GitPlugin {
    async fn post_publish(&self, released: &ReleasedPackage, ctx: &ReleaseContext) -> Result<()> {
        let tag = self
            .tag_format
            .render(&released.package.name, released.new_version);
        let message = format!("Release {}", tag);

        self.git(["tag", "-a", tag.as_str(), "-m", message.as_str()], ctx.cwd())
            .await?;
        info!("Created tag \"{}\"", tag);

        if self.push_tags {
            self.git(["push", self.remote.as_str(), tag.as_str()], ctx.cwd())
                .await?;
            info!("Pushed tag \"{}\" to \"{}\"", tag, self.remote);
        }

        Ok(())
    }
}

/// Revision range covering everything since the latest release of `package`.
pub(crate) fn release_range(
    tag_format: &TagFormat,
    package: &PackageWithLatestRelease,
) -> String {
    match package.latest_release {
        Some(version) => format!("{}..HEAD", tag_format.render(&package.package.name, version)),
        None => "HEAD".to_string(),
    }
}

/// Commits in `range` touching the directory of `package`, newest first.
pub(crate) async fn package_commits(
    plugin: &str,
    range: &str,
    package: &Package,
    cwd: &Path,
) -> Result<Vec<Commit>> {
    let directory = relative_directory(package, cwd);
    let format = format!("--format=%aN%n%cN%n%B%n%n%n{}", COMMIT_SEPARATOR);

    let args: [&OsStr; 5] = [
        "rev-list".as_ref(),
        format.as_ref(),
        range.as_ref(),
        "--".as_ref(),
        directory.as_os_str(),
    ];
    let stdout = process::run(plugin, "git", args, cwd, &[]).await?;

    Ok(parse_rev_list(&stdout))
}

/// URL configured for `remote`, if any.
pub(crate) async fn remote_url(plugin: &str, remote: &str, cwd: &Path) -> Option<String> {
    let key = format!("remote.{}.url", remote);
    process::run(plugin, "git", ["config", "--get", key.as_str()], cwd, &[])
        .await
        .ok()
        .filter(|url| !url.is_empty())
}

fn relative_directory(package: &Package, cwd: &Path) -> PathBuf {
    let directory = package.directory();
    let relative = directory.strip_prefix(cwd).unwrap_or(directory);
    if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative.to_path_buf()
    }
}

/// Parses `git rev-list --format=%aN%n%cN%n%B%n%n%n<separator>` output.
///
/// Every record starts with a `commit <hash>` line emitted by rev-list itself.
fn parse_rev_list(stdout: &str) -> Vec<Commit> {
    let separator = format!("\n\n\n{}", COMMIT_SEPARATOR);

    stdout
        .split(separator.as_str())
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut lines = record.lines();
            let hash = lines.next()?.strip_prefix("commit ")?.trim().to_string();
            let author_name = lines.next().unwrap_or_default().to_string();
            let committer_name = lines.next().unwrap_or_default().to_string();
            let message = lines.collect::<Vec<_>>().join("\n").trim().to_string();

            Some(Commit {
                hash,
                message,
                author_name,
                committer_name,
            })
        })
        .collect()
}
