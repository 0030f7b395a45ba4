//! npm-style workspace: `package.json` discovery and manifest rewriting.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use monopub_core::adapter::{ManifestPatch, WorkspaceAdapter};
use monopub_core::context::ReleaseContext;
use monopub_core::error::{Error, Result};
use monopub_core::package::{DependencyKind, PackageManifest};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "package.json";

/// Discovers packages from glob patterns relative to the working directory.
///
/// A pattern may match a `package.json` file or a directory containing one.
/// Patterns starting with `!` exclude matches.
#[derive(Debug, Clone)]
pub struct NpmWorkspace {
    patterns: Vec<String>,
}

impl NpmWorkspace {
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Manifest files matched by the patterns, deduplicated, in match order.
    pub fn manifest_paths(&self, cwd: &Path) -> Result<Vec<PathBuf>> {
        let (excludes, includes): (Vec<&String>, Vec<&String>) =
            self.patterns.iter().partition(|p| p.starts_with('!'));
        let excludes = excludes
            .into_iter()
            .map(|pattern| compile_pattern(&pattern[1..]))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for pattern in includes {
            let full_pattern = cwd.join(pattern);
            let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
                Error::Configuration(format!("Invalid package pattern \"{}\": {}", pattern, e))
            })?;

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!("Skipping unreadable path: {}", e);
                        continue;
                    }
                };

                let manifest = if path.is_dir() {
                    path.join(MANIFEST_FILE)
                } else if path.file_name().is_some_and(|name| name == MANIFEST_FILE) {
                    path
                } else {
                    continue;
                };
                if !manifest.is_file() {
                    continue;
                }

                let relative = manifest.strip_prefix(cwd).unwrap_or(&manifest);
                let relative_dir = relative.parent().unwrap_or(relative);
                if excludes
                    .iter()
                    .any(|exclude| exclude.matches_path(relative) || exclude.matches_path(relative_dir))
                {
                    debug!("Excluding {}", relative.display());
                    continue;
                }

                if seen.insert(manifest.clone()) {
                    paths.push(manifest);
                }
            }
        }

        Ok(paths)
    }
}

#[async_trait]
impl WorkspaceAdapter for NpmWorkspace {
    fn name(&self) -> &'static str {
        "npm-workspace"
    }

    async fn discover(&self, ctx: &ReleaseContext) -> Result<Vec<PackageManifest>> {
        let mut manifests = Vec::new();

        for path in self.manifest_paths(ctx.cwd())? {
            let json = read_manifest(&path).await?;

            let Some(name) = json.get("name").and_then(Value::as_str) else {
                debug!("Skipping unnamed package at {}", path.display());
                continue;
            };
            if is_private(&json) {
                debug!("Skipping private package \"{}\"", name);
                continue;
            }

            manifests.push(PackageManifest {
                name: name.to_string(),
                dependencies: dependency_map(&json, DependencyKind::Runtime),
                dev_dependencies: dependency_map(&json, DependencyKind::Dev),
                location: path,
            });
        }

        Ok(manifests)
    }

    async fn apply_patch(&self, patch: &ManifestPatch) -> Result<()> {
        let path = &patch.package.location;
        let mut json = read_manifest(path).await?;
        let root = json.as_object_mut().ok_or_else(|| Error::Manifest {
            path: path.clone(),
            message: "manifest root is not an object".to_string(),
        })?;

        root.insert(
            "version".to_string(),
            Value::String(patch.version.to_string()),
        );
        for (edge, range) in &patch.dependencies {
            let section = root
                .get_mut(section_key(edge.kind))
                .and_then(Value::as_object_mut);
            match section.and_then(|deps| deps.get_mut(&edge.name)) {
                Some(value) => *value = Value::String(range.clone()),
                None => warn!(
                    "\"{}\" is not declared in {} of {}",
                    edge.name,
                    section_key(edge.kind),
                    path.display()
                ),
            }
        }

        let mut content = serde_json::to_string_pretty(&json).map_err(|error| Error::Json {
            error,
            path: path.clone(),
        })?;
        content.push('\n');
        tokio::fs::write(path, content).await?;

        debug!("Updated {}", path.display());
        Ok(())
    }
}

fn compile_pattern(pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern.trim_end_matches('/')).map_err(|e| {
        Error::Configuration(format!("Invalid package pattern \"!{}\": {}", pattern, e))
    })
}

async fn read_manifest(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|error| Error::Json {
        error,
        path: path.to_path_buf(),
    })
}

fn is_private(json: &Value) -> bool {
    match json.get("private") {
        Some(Value::Bool(private)) => *private,
        Some(Value::String(private)) => private == "true",
        _ => false,
    }
}

fn section_key(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::Runtime => "dependencies",
        DependencyKind::Dev => "devDependencies",
    }
}

fn dependency_map(json: &Value, kind: DependencyKind) -> IndexMap<String, String> {
    json.get(section_key(kind))
        .and_then(Value::as_object)
        .map(|deps: &Map<String, Value>| {
            deps.iter()
                .filter_map(|(name, range)| Some((name.clone(), range.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
