//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

use crate::plugin::Capability;
use crate::release::ReleaseReport;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {path}: {error}")]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Release cannot be completed because of a circular dependency between: {0}")]
    CyclicDependency(String),

    #[error("Setup failed: {0}")]
    SetupFailure(String),

    #[error("Cannot run \"{0}\" step: release chain setup has not completed successfully")]
    NotReady(Capability),

    #[error("\"{stage}\" step failed for {package}: {source}")]
    Stage {
        stage: Capability,
        package: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Plugin \"{plugin}\" failed: {message}")]
    Plugin { plugin: String, message: String },

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Package not found: {name}. Available packages: {available}")]
    PackageNotFound { name: String, available: String },

    #[error("No version known for {package}: it is neither being released nor released before")]
    MissingVersion { package: String },

    #[error("Invalid version {version}: {message}")]
    InvalidVersion { version: String, message: String },

    #[error(
        "Release completed partially. Published: [{}]. Failed: [{}]. Skipped: [{}]. Post-publish failed: [{}]",
        .report.published.join(", "),
        .report.failed.join(", "),
        .report.skipped.join(", "),
        .report.post_publish_failed.join(", ")
    )]
    PartialRelease { report: Box<ReleaseReport> },
}

impl Error {
    /// Wraps an error with the stage and package it was raised from.
    ///
    /// Errors that already carry stage information are returned untouched so the
    /// innermost stage is the one reported.
    pub fn in_stage(self, stage: Capability, package: impl Into<String>) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                package: package.into(),
                source: Box::new(other),
            },
        }
    }

    /// Shorthand for a plugin-level failure.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
