//! Release tag templates such as `{name}@{version}`.

use std::fmt;

use monopub_core::error::{Error, Result};
use monopub_core::package::LatestReleases;
use monopub_core::version::Version;
use regex::Regex;

pub const NAME_PLACEHOLDER: &str = "{name}";
pub const VERSION_PLACEHOLDER: &str = "{version}";
pub const DEFAULT_TAG_FORMAT: &str = "{name}@{version}";

const VERSION_GROUP: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

/// A validated tag template with exactly one `{name}` and one `{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    template: String,
}

impl TagFormat {
    /// Validates a tag template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a placeholder is missing or repeated.
    pub fn parse(template: &str) -> Result<Self> {
        for placeholder in [VERSION_PLACEHOLDER, NAME_PLACEHOLDER] {
            match template.matches(placeholder).count() {
                0 => {
                    return Err(Error::Configuration(format!(
                        "no \"{}\" found in tag format \"{}\"",
                        placeholder, template
                    )))
                }
                1 => {}
                _ => {
                    return Err(Error::Configuration(format!(
                        "multiple \"{}\" found in tag format \"{}\"",
                        placeholder, template
                    )))
                }
            }
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Tag name for a release of `name` at `version`.
    pub fn render(&self, name: &str, version: Version) -> String {
        self.template
            .replace(NAME_PLACEHOLDER, name)
            .replace(VERSION_PLACEHOLDER, &version.to_string())
    }

    /// Anchored pattern matching release tags of any of `package_names`.
    ///
    /// Captures `package`, `major`, `minor` and `patch`.
    pub fn regex<S: AsRef<str>>(&self, package_names: &[S]) -> Result<Regex> {
        let names = package_names
            .iter()
            .map(|name| regex::escape(name.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let name_group = format!("(?P<package>{})", names);

        let mut pattern = String::from("^");
        let mut rest = self.template.as_str();
        loop {
            let next = [NAME_PLACEHOLDER, VERSION_PLACEHOLDER]
                .into_iter()
                .filter_map(|placeholder| rest.find(placeholder).map(|idx| (idx, placeholder)))
                .min_by_key(|(idx, _)| *idx);

            let Some((idx, placeholder)) = next else {
                pattern.push_str(&regex::escape(rest));
                break;
            };
            pattern.push_str(&regex::escape(&rest[..idx]));
            pattern.push_str(if placeholder == NAME_PLACEHOLDER {
                name_group.as_str()
            } else {
                VERSION_GROUP
            });
            rest = &rest[idx + placeholder.len()..];
        }
        pattern.push('$');

        Regex::new(&pattern).map_err(|e| {
            Error::Configuration(format!(
                "cannot build tag pattern from \"{}\": {}",
                self.template, e
            ))
        })
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        Self {
            template: DEFAULT_TAG_FORMAT.to_string(),
        }
    }
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Highest released version of every package found among `tags`.
///
/// Every name in `package_names` appears in the result, with `None` when no
/// tag matches it. Tags of other packages and malformed tags are ignored.
pub fn latest_releases<T, S>(
    tags: &[T],
    package_names: &[S],
    format: &TagFormat,
) -> Result<LatestReleases>
where
    T: AsRef<str>,
    S: AsRef<str>,
{
    let mut releases: LatestReleases = package_names
        .iter()
        .map(|name| (name.as_ref().to_string(), None))
        .collect();
    if package_names.is_empty() {
        return Ok(releases);
    }

    let pattern = format.regex(package_names)?;
    for tag in tags {
        let Some(caps) = pattern.captures(tag.as_ref().trim()) else {
            continue;
        };
        let component = |group: &str| caps[group].parse::<u64>().ok();
        let (Some(major), Some(minor), Some(patch)) =
            (component("major"), component("minor"), component("patch"))
        else {
            continue;
        };

        let version = Version::new(major, minor, patch);
        if let Some(latest) = releases.get_mut(&caps["package"]) {
            if latest.map_or(true, |current| version > current) {
                *latest = Some(version);
            }
        }
    }

    Ok(releases)
}
