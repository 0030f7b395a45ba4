//! `monopub.toml` loading and plugin assembly.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use monopub_core::{ClassifierConfig, Error, IgnoreOverrides, Plugin, ReleaseType};
use monopub_plugins::{
    CommandPreparer, CommitAnalyzer, GitConfig, GitPlugin, GithubConfig, GithubPlugin, NpmConfig,
    NpmPublisher, PrepareConfig,
};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "monopub.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonopubConfig {
    /// Workspace globs, relative to the working directory.
    pub packages: Vec<String>,
    /// Overrides `commit_analyzer.deps_bump_release_type` when set.
    pub min_dependency_bump: Option<ReleaseType>,
    pub ignore_dependencies: HashMap<String, Vec<String>>,
    pub git: GitConfig,
    pub github: GithubConfig,
    pub commit_analyzer: ClassifierConfig,
    pub prepare: PrepareConfig,
    pub npm: NpmConfig,
}

impl Default for MonopubConfig {
    fn default() -> Self {
        Self {
            packages: vec!["packages/*".to_string()],
            min_dependency_bump: None,
            ignore_dependencies: HashMap::new(),
            git: GitConfig::default(),
            github: GithubConfig::default(),
            commit_analyzer: ClassifierConfig::default(),
            prepare: PrepareConfig::default(),
            npm: NpmConfig::default(),
        }
    }
}

/// One `--ignore-dep <package>=<dependency>` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreDep {
    pub package: String,
    pub dependency: String,
}

/// Parses `<package>=<dependency>`.
pub fn parse_ignore_dep(value: &str) -> std::result::Result<IgnoreDep, Error> {
    let malformed = || {
        Error::Configuration(format!(
            "Invalid ignored dependency \"{}\", expected <package>=<dependency>",
            value
        ))
    };

    let (package, dependency) = value.split_once('=').ok_or_else(malformed)?;
    let (package, dependency) = (package.trim(), dependency.trim());
    if package.is_empty() || dependency.is_empty() || dependency.contains('=') {
        return Err(malformed());
    }

    Ok(IgnoreDep {
        package: package.to_string(),
        dependency: dependency.to_string(),
    })
}

impl MonopubConfig {
    /// Loads the config at `path`.
    ///
    /// A missing file yields the defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        let mut config = self.commit_analyzer.clone();
        if let Some(release_type) = self.min_dependency_bump {
            config.deps_bump_release_type = release_type;
        }
        config
    }

    /// Config-file overrides merged with command-line ones.
    pub fn ignore_overrides(&self, extra: &[IgnoreDep]) -> IgnoreOverrides {
        let mut overrides = IgnoreOverrides::new();
        for (package, dependencies) in &self.ignore_dependencies {
            overrides
                .entry(package.clone())
                .or_default()
                .extend(dependencies.iter().cloned());
        }
        for ignore in extra {
            overrides
                .entry(ignore.package.clone())
                .or_default()
                .insert(ignore.dependency.clone());
        }
        overrides
    }

    /// Checks everything that can be checked without touching the workspace.
    pub fn validate(&self) -> monopub_core::Result<()> {
        if self.packages.is_empty() {
            return Err(Error::Configuration(
                "\"packages\" must list at least one pattern".to_string(),
            ));
        }
        GitPlugin::new(&self.git)?;
        CommandPreparer::from_config(&self.prepare)?;
        for (package, dependencies) in &self.ignore_dependencies {
            if dependencies.iter().any(|dependency| dependency == package) {
                return Err(Error::Configuration(format!(
                    "\"{}\" cannot ignore a dependency on itself",
                    package
                )));
            }
        }
        Ok(())
    }

    /// Plugins in registration order: git, github, commit analyzer, prepare
    /// command, npm. The github plugin replaces git's commit extraction.
    pub fn plugins(&self) -> monopub_core::Result<Vec<Plugin>> {
        let git = GitPlugin::new(&self.git)?;
        let tag_format = git.tag_format().clone();
        let mut plugins = vec![git.into_plugin()];
        if self.github.enabled {
            plugins.push(GithubPlugin::new(self.github.clone(), tag_format)?.into_plugin());
        }
        plugins.push(CommitAnalyzer::new(self.classifier_config()).into_plugin());
        if let Some(preparer) = CommandPreparer::from_config(&self.prepare)? {
            plugins.push(preparer.into_plugin());
        }
        if self.npm.enabled {
            plugins.push(NpmPublisher::new(self.npm.clone())?.into_plugin());
        }
        Ok(plugins)
    }
}
