//! GitHub-aware commit extraction.
//!
//! Squash merges collapse a pull request into one commit whose header ends
//! with `(#<number>)`. This plugin asks the GitHub API for the pull request's
//! base and head and replaces the squashed commit with the commits it was made
//! from, so every one of them is classified on its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use monopub_core::commit::Commit;
use monopub_core::context::ReleaseContext;
use monopub_core::error::{Error, Result};
use monopub_core::package::PackageWithLatestRelease;
use monopub_core::plugin::{CommitExtractor, Plugin, SetupHook};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::git::{package_commits, release_range, remote_url};
use crate::tags::TagFormat;

pub const PLUGIN_NAME: &str = "github";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

static REPO_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.+[/:](?P<owner>[^/:]+)/(?P<repo>[^/]+?)(?:\.git)?/?$")
        .expect("valid repository url pattern")
});

static PULL_HEADER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(#(?P<pr>\d+)\)$").expect("valid pull header pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub enabled: bool,
    /// Environment variable holding the API token.
    pub env_token_key: String,
    /// Replace squash-merged commits with the commits of their pull request.
    pub extract_commits_from_squashed: bool,
    pub api_url: String,
    /// Remote whose URL names the repository.
    pub remote: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            env_token_key: "GITHUB_TOKEN".to_string(),
            extract_commits_from_squashed: true,
            api_url: DEFAULT_API_URL.to_string(),
            remote: "origin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
}

/// Owner and repository named by a remote URL, for both the
/// `git@host:owner/repo.git` and `https://host/owner/repo.git` forms.
pub fn extract_repo_from_origin_url(url: &str) -> Option<RepoInfo> {
    let captures = REPO_URL_PATTERN.captures(url.trim())?;
    Some(RepoInfo {
        owner: captures["owner"].to_string(),
        repo: captures["repo"].to_string(),
    })
}

/// Pull request number a squash merge header ends with.
pub fn pull_from_commit(message: &str) -> Option<u64> {
    let header = message.lines().next().unwrap_or_default().trim();
    PULL_HEADER_PATTERN
        .captures(header)
        .and_then(|captures| captures["pr"].parse().ok())
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    base: GitRef,
    head: GitRef,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    sha: String,
}

fn parse_pull(body: &str) -> Result<PullRequest> {
    serde_json::from_str(body).map_err(|e| {
        Error::plugin(
            PLUGIN_NAME,
            format!("Could not read pull request base and head: {}", e),
        )
    })
}

#[derive(Debug)]
struct RepoSession {
    repo: RepoInfo,
    token: String,
}

/// Commit extractor expanding squash merges through the GitHub API.
#[derive(Debug)]
pub struct GithubPlugin {
    config: GithubConfig,
    tag_format: TagFormat,
    client: Client,
    session: OnceCell<RepoSession>,
}

impl GithubPlugin {
    /// `tag_format` must match the tags the git plugin reads releases from.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be created.
    pub fn new(config: GithubConfig, tag_format: TagFormat) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("monopub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::plugin(PLUGIN_NAME, format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            tag_format,
            client,
            session: OnceCell::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Registers this plugin for setup and extract-commits.
    pub fn into_plugin(self) -> Plugin {
        let github = Arc::new(self);
        Plugin::new(PLUGIN_NAME)
            .with_setup(github.clone())
            .with_commit_extractor(github)
    }

    fn pull_url(&self, repo: &RepoInfo, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.config.api_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            number
        )
    }

    async fn fetch_pull(&self, session: &RepoSession, number: u64) -> Result<PullRequest> {
        let url = self.pull_url(&session.repo, number);
        debug!("Fetching pull request #{} from {}", number, url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| {
                Error::plugin(
                    PLUGIN_NAME,
                    format!("Failed to fetch pull request #{}: {}", number, e),
                )
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::plugin(
                PLUGIN_NAME,
                format!(
                    "Fetching pull request #{} failed with status {}: {}",
                    number, status, body
                ),
            ));
        }

        parse_pull(&body)
    }
}

#[async_trait]
impl SetupHook for GithubPlugin {
    async fn setup(&self, ctx: &ReleaseContext) -> Result<bool> {
        let Some(token) = ctx.env_var(&self.config.env_token_key) else {
            error!(
                "No GitHub token found in environment variable \"{}\"",
                self.config.env_token_key
            );
            return Ok(false);
        };

        let Some(url) = remote_url(PLUGIN_NAME, &self.config.remote, ctx.cwd()).await else {
            error!("No URL configured for remote \"{}\"", self.config.remote);
            return Ok(false);
        };

        let Some(repo) = extract_repo_from_origin_url(&url) else {
            error!("Could not read owner and repository from \"{}\"", url);
            return Ok(false);
        };

        info!("Using GitHub repository {}/{}", repo.owner, repo.repo);
        let _ = self.session.set(RepoSession {
            repo,
            token: token.to_string(),
        });
        Ok(true)
    }
}

#[async_trait]
impl CommitExtractor for GithubPlugin {
    async fn extract_commits(
        &self,
        package: &PackageWithLatestRelease,
        ctx: &ReleaseContext,
    ) -> Result<Vec<Commit>> {
        let session = self.session.get().ok_or_else(|| {
            Error::plugin(PLUGIN_NAME, "setup did not complete, no repository is known")
        })?;

        let range = release_range(&self.tag_format, package);
        let commits = package_commits(PLUGIN_NAME, &range, &package.package, ctx.cwd()).await?;
        if !self.config.extract_commits_from_squashed {
            return Ok(commits);
        }

        let mut expanded = Vec::with_capacity(commits.len());
        for commit in commits {
            let Some(number) = pull_from_commit(&commit.message) else {
                expanded.push(commit);
                continue;
            };

            let pull = self.fetch_pull(session, number).await?;
            let range = format!("{}..{}", pull.base.sha, pull.head.sha);
            let pull_commits =
                package_commits(PLUGIN_NAME, &range, &package.package, ctx.cwd()).await?;
            debug!(
                "Expanded {} into {} commits of pull request #{}",
                commit.hash,
                pull_commits.len(),
                number
            );
            expanded.extend(pull_commits);
        }

        Ok(expanded)
    }
}
