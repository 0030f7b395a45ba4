//! Version arithmetic and release type computation.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Release version of a package.
///
/// Ordering is lexicographic on `(major, minor, patch)`. "Never released" is
/// modelled as `Option<Version>::None`, which sorts below every concrete version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const FIRST_RELEASE: Version = Version::new(1, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s.trim()).map_err(|e| Error::InvalidVersion {
            version: s.to_string(),
            message: e.to_string(),
        })?;
        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }
}

impl From<semver::Version> for Version {
    fn from(version: semver::Version) -> Self {
        Version::new(version.major, version.minor, version.patch)
    }
}

/// How significant a set of changes is.
///
/// Variants are declared in ascending importance so the derived ordering is
/// `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl ReleaseType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::None => "none",
            ReleaseType::Patch => "patch",
            ReleaseType::Minor => "minor",
            ReleaseType::Major => "major",
        }
    }

    /// Keeps whichever of the two release types is more important.
    #[inline]
    pub fn combine(self, other: ReleaseType) -> ReleaseType {
        self.max(other)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, ReleaseType::None)
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ReleaseType::None),
            "patch" => Ok(ReleaseType::Patch),
            "minor" => Ok(ReleaseType::Minor),
            "major" => Ok(ReleaseType::Major),
            other => Err(Error::Configuration(format!(
                "Unknown release type \"{}\". Expected one of: major, minor, patch, none",
                other
            ))),
        }
    }
}

/// Free-function form of [`ReleaseType::combine`].
#[inline]
pub fn combine_release_type(a: ReleaseType, b: ReleaseType) -> ReleaseType {
    a.combine(b)
}

/// Computes the version following `prior` for the given release type.
///
/// A package that was never released gets `1.0.0` for any release type other
/// than `none`; `none` returns `prior` unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the bumped component overflows.
pub fn next_version(prior: Option<Version>, release_type: ReleaseType) -> Result<Option<Version>> {
    let prior = match (prior, release_type) {
        (prior, ReleaseType::None) => return Ok(prior),
        (None, _) => return Ok(Some(Version::FIRST_RELEASE)),
        (Some(prior), _) => prior,
    };

    let next = match release_type {
        ReleaseType::Major => prior.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
        ReleaseType::Minor => prior
            .minor
            .checked_add(1)
            .map(|minor| Version::new(prior.major, minor, 0)),
        ReleaseType::Patch => prior
            .patch
            .checked_add(1)
            .map(|patch| Version::new(prior.major, prior.minor, patch)),
        ReleaseType::None => Some(prior),
    };

    next.map(Some).ok_or_else(|| Error::InvalidVersion {
        version: prior.to_string(),
        message: format!("a {} release overflows the version number", release_type),
    })
}

/// Whether a package will actually be released with the computed version.
pub fn is_package_changed(
    new_version: Option<Version>,
    old_version: Option<Version>,
    release_type: ReleaseType,
) -> bool {
    match new_version {
        Some(new_version) => !release_type.is_none() && Some(new_version) != old_version,
        None => false,
    }
}

// "1.2.x" style: any patch of a fixed minor.
static ANY_PATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\.\d+\.(x|\*)").expect("valid any-patch pattern"));
// "1.x" style: any minor of a fixed major, not preceded by another component.
static ANY_MINOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[^\d.])\d+\.(x|\*)").expect("valid any-minor pattern"));

/// Reproduces the looseness of `declared_range` against `new_version`.
///
/// `~` and "any patch" patterns keep a tilde range, `^` and "any minor" patterns
/// keep a caret range, everything else (exact pins, `*`, `workspace:*`) pins
/// the new version exactly.
pub fn range_for_bump(declared_range: &str, new_version: &str) -> String {
    if declared_range.contains('~') || ANY_PATCH.is_match(declared_range) {
        return format!("~{}", new_version);
    }
    if declared_range.contains('^') || ANY_MINOR.is_match(declared_range) {
        return format!("^{}", new_version);
    }
    new_version.to_string()
}
