//! Release pipeline plugins and workspace adapters for monopub.

pub mod command;
pub mod commit_analyzer;
pub mod git;
pub mod github;
pub mod npm;
mod process;
pub mod tags;
pub mod workspace;

pub use command::{CommandPreparer, PrepareConfig};
pub use commit_analyzer::CommitAnalyzer;
pub use git::{GitConfig, GitPlugin};
pub use github::{GithubConfig, GithubPlugin};
pub use npm::{NpmConfig, NpmPublisher};
pub use tags::TagFormat;
pub use workspace::NpmWorkspace;
