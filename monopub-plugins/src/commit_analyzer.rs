//! Conventional commit release-type provider.

use std::sync::Arc;

use async_trait::async_trait;
use monopub_core::commit::{ClassifierConfig, Commit, CommitClassifier};
use monopub_core::context::ReleaseContext;
use monopub_core::error::Result;
use monopub_core::plugin::{Plugin, ReleaseAnalyzer};
use monopub_core::version::ReleaseType;
use tracing::debug;

pub const PLUGIN_NAME: &str = "commit-analyzer";

#[derive(Debug, Clone, Default)]
pub struct CommitAnalyzer {
    classifier: CommitClassifier,
}

impl CommitAnalyzer {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            classifier: CommitClassifier::new(config),
        }
    }

    pub fn into_plugin(self) -> Plugin {
        Plugin::new(PLUGIN_NAME).with_release_analyzer(Arc::new(self))
    }
}

#[async_trait]
impl ReleaseAnalyzer for CommitAnalyzer {
    async fn release_type(
        &self,
        commits: &[Commit],
        deps_changed: bool,
        _ctx: &ReleaseContext,
    ) -> Result<ReleaseType> {
        let release_type = self.classifier.classify(commits, deps_changed);
        debug!(
            commits = commits.len(),
            deps_changed,
            "Classified changes as \"{}\"",
            release_type
        );
        Ok(release_type)
    }
}
