//! npm registry publisher.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use monopub_core::context::ReleaseContext;
use monopub_core::error::{Error, Result};
use monopub_core::package::Package;
use monopub_core::plugin::{Plugin, Publisher, SetupHook};
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{error, info};

use crate::process;

pub const PLUGIN_NAME: &str = "npm";
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Name of the variable the generated `.npmrc` reads the token from.
const TOKEN_VARIABLE: &str = "NPM_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NpmConfig {
    pub enabled: bool,
    /// Environment variable holding the auth token.
    pub env_token_key: String,
    pub dist_tag: String,
    pub dry_run: bool,
    pub provenance: bool,
    pub registry: String,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            env_token_key: TOKEN_VARIABLE.to_string(),
            dist_tag: "latest".to_string(),
            dry_run: false,
            provenance: false,
            registry: DEFAULT_REGISTRY.to_string(),
        }
    }
}

/// Publishes packages with the npm CLI using a throwaway `.npmrc`.
#[derive(Debug)]
pub struct NpmPublisher {
    config: NpmConfig,
    // Keeps the directory holding the generated `.npmrc` alive.
    _config_dir: TempDir,
    npmrc: PathBuf,
}

impl NpmPublisher {
    /// # Errors
    ///
    /// Fails if the temporary config directory cannot be created.
    pub fn new(config: NpmConfig) -> Result<Self> {
        let config_dir = tempfile::Builder::new().prefix("monopub-npm").tempdir()?;
        let npmrc = config_dir.path().join(".npmrc");
        Ok(Self {
            config,
            _config_dir: config_dir,
            npmrc,
        })
    }

    #[inline]
    pub fn config(&self) -> &NpmConfig {
        &self.config
    }

    pub fn into_plugin(self) -> Plugin {
        let npm = Arc::new(self);
        Plugin::new(PLUGIN_NAME)
            .with_setup(npm.clone())
            .with_publisher(npm)
    }

    fn token<'a>(&self, ctx: &'a ReleaseContext) -> Option<&'a str> {
        ctx.env_var(&self.config.env_token_key)
    }

    fn registry(&self) -> &str {
        self.config.registry.trim_end_matches('/')
    }

    /// `.npmrc` line authenticating against the configured registry.
    fn auth_line(&self) -> String {
        let host = self
            .registry()
            .split_once("://")
            .map_or(self.registry(), |(_, rest)| rest);
        format!("//{}/:_authToken=${{{}}}\n", host, TOKEN_VARIABLE)
    }

    fn userconfig(&self) -> &str {
        self.npmrc.to_str().unwrap_or(".npmrc")
    }

    fn publish_args(&self) -> Vec<&str> {
        let mut args = vec![
            "publish",
            "--tag",
            self.config.dist_tag.as_str(),
            "--userconfig",
            self.userconfig(),
            "--registry",
            self.registry(),
            "--no-workspaces",
        ];
        if self.config.dry_run {
            args.push("--dry-run");
        }
        if self.config.provenance {
            args.push("--provenance");
        }
        args
    }
}

#[async_trait]
impl SetupHook for NpmPublisher {
    async fn setup(&self, ctx: &ReleaseContext) -> Result<bool> {
        let Some(token) = self.token(ctx) else {
            error!(
                "No npm token found in environment (key: \"{}\"). Set it or point \"env_token_key\" to the variable holding it",
                self.config.env_token_key
            );
            return Ok(false);
        };

        tokio::fs::write(&self.npmrc, self.auth_line()).await?;

        let whoami = process::run(
            PLUGIN_NAME,
            "npm",
            [
                "whoami",
                "--no-workspaces",
                "--userconfig",
                self.userconfig(),
                "--registry",
                self.registry(),
            ],
            ctx.cwd(),
            &[(TOKEN_VARIABLE, token)],
        )
        .await;

        match whoami {
            Ok(user) => {
                info!("Authenticated to {} as \"{}\"", self.registry(), user);
                Ok(true)
            }
            Err(e) => {
                error!("Invalid npm auth token was provided: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl Publisher for NpmPublisher {
    async fn publish(&self, package: &Package, ctx: &ReleaseContext) -> Result<()> {
        let token = self.token(ctx).ok_or_else(|| {
            Error::plugin(
                PLUGIN_NAME,
                format!("environment variable {} is not set", self.config.env_token_key),
            )
        })?;
        let directory = package_directory(package, ctx.cwd());

        process::run(
            PLUGIN_NAME,
            "npm",
            self.publish_args(),
            &directory,
            &[(TOKEN_VARIABLE, token)],
        )
        .await?;

        if self.config.dry_run {
            info!("Dry-run publish of \"{}\" finished", package.name);
        }
        Ok(())
    }
}

fn package_directory(package: &Package, cwd: &Path) -> PathBuf {
    let directory = package.directory();
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        cwd.join(directory)
    }
}
