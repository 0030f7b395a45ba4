//! Command implementations for the CLI.

mod plan;
mod release;
mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use monopub_core::{DependencyGraph, ReleaseContext, WorkspaceAdapter};
use monopub_plugins::NpmWorkspace;

use crate::config::{IgnoreDep, MonopubConfig, DEFAULT_CONFIG_FILE};

pub use plan::cmd_plan;
pub use release::cmd_release;
pub use validate::cmd_validate;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

/// Loaded configuration plus the context commands run in.
struct Session {
    config: MonopubConfig,
    ctx: ReleaseContext,
}

impl Session {
    fn open(args: &GlobalArgs, ignore: &[IgnoreDep]) -> Result<Self> {
        let cwd = match &args.cwd {
            Some(cwd) => std::fs::canonicalize(cwd)
                .with_context(|| format!("Working directory {} not found", cwd.display()))?,
            None => std::env::current_dir()?,
        };
        let config = match &args.config {
            Some(path) => MonopubConfig::load(&cwd.join(path), true)?,
            None => MonopubConfig::load(&cwd.join(DEFAULT_CONFIG_FILE), false)?,
        };
        config.validate()?;

        let ctx = ReleaseContext::new(cwd)
            .with_env(std::env::vars().collect())
            .with_ignore_dependencies(config.ignore_overrides(ignore));
        Ok(Self { config, ctx })
    }

    fn workspace(&self) -> NpmWorkspace {
        NpmWorkspace::new(self.config.packages.iter().cloned())
    }

    async fn graph(&self) -> Result<DependencyGraph> {
        let manifests = self.workspace().discover(&self.ctx).await?;
        Ok(DependencyGraph::from_manifests(&manifests))
    }
}
