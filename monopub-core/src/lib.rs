//! Core library for multi-package release orchestration.

pub mod adapter;
pub mod chain;
pub mod commit;
pub mod context;
pub mod error;
pub mod graph;
pub mod package;
pub mod plugin;
pub mod release;
pub mod version;

pub use adapter::{ManifestPatch, WorkspaceAdapter};
pub use chain::{ChainState, ReleaseChain};
pub use commit::{ClassifierConfig, Commit, CommitClassifier, CommitParser, Note, ParsedCommit};
pub use context::ReleaseContext;
pub use error::{Error, Result};
pub use graph::{DependencyGraph, IgnoreOverrides};
pub use package::{
    BumpedDependency, DependencyEdge, DependencyKind, LatestReleases, Package, PackageManifest,
    PackageWithDependencies, PackageWithLatestRelease, ReleasedPackage,
};
pub use plugin::{
    Capability, CommitExtractor, LastReleaseProvider, Plugin, PostPublisher, PrepareAll,
    PrepareInfo, PrepareSingle, Publisher, ReleaseAnalyzer, SetupHook,
};
pub use release::{ReleaseEngine, ReleaseOptions, ReleasePlan, ReleasePlanEntry, ReleaseReport};
pub use version::{
    combine_release_type, is_package_changed, next_version, range_for_bump, ReleaseType, Version,
};
