//! Execution context shared with every plugin call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Span;

use crate::graph::IgnoreOverrides;

/// Working directory, environment, logging scope and ignore overrides.
///
/// Cloning is cheap: the environment and overrides are shared read-only.
/// Per-package contexts only differ in their tracing span.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    cwd: PathBuf,
    env: Arc<HashMap<String, String>>,
    ignore_dependencies: Arc<IgnoreOverrides>,
    package: Option<String>,
    span: Span,
}

impl ReleaseContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: Arc::new(HashMap::new()),
            ignore_dependencies: Arc::new(IgnoreOverrides::new()),
            package: None,
            span: tracing::info_span!("release"),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_ignore_dependencies(mut self, overrides: IgnoreOverrides) -> Self {
        self.ignore_dependencies = Arc::new(overrides);
        self
    }

    /// Child context for one package, logging under a `package` span.
    pub fn scoped(&self, package: &str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "package", name = %package);
        Self {
            cwd: self.cwd.clone(),
            env: Arc::clone(&self.env),
            ignore_dependencies: Arc::clone(&self.ignore_dependencies),
            package: Some(package.to_string()),
            span,
        }
    }

    #[inline]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[inline]
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    #[inline]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    #[inline]
    pub fn ignore_dependencies(&self) -> &IgnoreOverrides {
        &self.ignore_dependencies
    }

    /// Package this context is scoped to, if any.
    #[inline]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    #[inline]
    pub fn span(&self) -> &Span {
        &self.span
    }
}
