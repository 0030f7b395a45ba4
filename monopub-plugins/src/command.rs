//! Shell command preparation step, e.g. a workspace-wide build.

use std::sync::Arc;

use async_trait::async_trait;
use monopub_core::context::ReleaseContext;
use monopub_core::error::{Error, Result};
use monopub_core::plugin::{Plugin, PrepareAll, PrepareInfo};
use serde::Deserialize;
use tracing::{debug, info};

use crate::process;

pub const PLUGIN_NAME: &str = "command";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Shell command to run once before publishing.
    pub command: Option<String>,
}

/// Runs one shell command in the working directory before publishing.
#[derive(Debug, Clone)]
pub struct CommandPreparer {
    command: String,
}

impl CommandPreparer {
    /// # Errors
    ///
    /// Returns a configuration error for a blank command.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(Error::Configuration(
                "prepare command cannot be empty".to_string(),
            ));
        }
        Ok(Self { command })
    }

    /// Preparer for `config`, if a command is configured.
    pub fn from_config(config: &PrepareConfig) -> Result<Option<Self>> {
        config.command.as_deref().map(Self::new).transpose()
    }

    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn into_plugin(self) -> Plugin {
        Plugin::new(PLUGIN_NAME).with_prepare_all(Arc::new(self))
    }
}

#[async_trait]
impl PrepareAll for CommandPreparer {
    async fn prepare_all(&self, info: &PrepareInfo<'_>, ctx: &ReleaseContext) -> Result<()> {
        info!(
            "Running \"{}\" for {} changed packages",
            self.command,
            info.changed_packages.len()
        );
        let stdout = process::run(
            PLUGIN_NAME,
            "sh",
            ["-c", self.command.as_str()],
            ctx.cwd(),
            &[],
        )
        .await?;

        for line in stdout.lines() {
            debug!("{}", line);
        }
        Ok(())
    }
}
