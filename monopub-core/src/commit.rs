//! Conventional commit parsing and release type classification.
//!
//! The header grammar is `type(scope)!: subject`:
//!
//! | group | meaning |
//! |---|---|
//! | `type` | word characters, required |
//! | `scope` | optional, inside parentheses |
//! | `breaking` | optional `!` right before the colon |
//! | `subject` | the rest of the header line |
//!
//! Footer notes start with one of the configured keywords followed by `:` and
//! run until the next note or the end of the message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::version::ReleaseType;

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[\w$.\-* ]*)\))?(?P<breaking>!?): (?P<subject>.*)$")
        .expect("valid commit header pattern")
});

/// A raw commit as returned by a commit extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub committer_name: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            author_name: String::new(),
            committer_name: String::new(),
        }
    }
}

/// A footer note such as `BREAKING CHANGE: ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub text: String,
}

/// Structured view of a commit message.
///
/// Commits whose header does not match the grammar have `commit_type == None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommit {
    pub commit_type: Option<String>,
    pub scope: Option<String>,
    pub breaking_mark: bool,
    pub subject: Option<String>,
    pub header: String,
    pub body: Option<String>,
    pub notes: Vec<Note>,
}

/// Parser for conventional commit messages.
#[derive(Debug, Clone)]
pub struct CommitParser {
    note_pattern: Option<Regex>,
}

impl CommitParser {
    /// Creates a parser recognising notes introduced by `note_keywords`.
    pub fn new<S: AsRef<str>>(note_keywords: &[S]) -> Self {
        let alternatives: Vec<String> = note_keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        let note_pattern = if alternatives.is_empty() {
            None
        } else {
            Regex::new(&format!(
                r"^[\s|*]*(?P<title>{})[:\s]+(?P<text>.*)$",
                alternatives.join("|")
            ))
            .ok()
        };

        Self { note_pattern }
    }

    pub fn parse(&self, message: &str) -> ParsedCommit {
        let message = message.trim();
        let mut lines = message.lines();
        let header = lines.next().unwrap_or_default().trim_end().to_string();

        let mut parsed = ParsedCommit {
            header: header.clone(),
            ..ParsedCommit::default()
        };

        if let Some(caps) = HEADER_PATTERN.captures(&header) {
            parsed.commit_type = caps.name("type").map(|m| m.as_str().to_string());
            parsed.scope = caps
                .name("scope")
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty());
            parsed.breaking_mark = caps.name("breaking").is_some_and(|m| !m.as_str().is_empty());
            parsed.subject = caps.name("subject").map(|m| m.as_str().to_string());
        }

        let mut body_lines = Vec::new();
        for line in lines {
            let note_start = self
                .note_pattern
                .as_ref()
                .and_then(|pattern| pattern.captures(line));

            match note_start {
                Some(caps) => parsed.notes.push(Note {
                    title: caps["title"].to_string(),
                    text: caps["text"].trim().to_string(),
                }),
                None => match parsed.notes.last_mut() {
                    Some(note) => {
                        if !note.text.is_empty() {
                            note.text.push('\n');
                        }
                        note.text.push_str(line);
                    }
                    None => body_lines.push(line),
                },
            }
        }

        for note in &mut parsed.notes {
            note.text = note.text.trim().to_string();
        }

        let body = body_lines.join("\n").trim().to_string();
        if !body.is_empty() {
            parsed.body = Some(body);
        }

        parsed
    }
}

fn default_minor_types() -> Vec<String> {
    vec!["feat".to_string()]
}

fn default_patch_types() -> Vec<String> {
    vec!["fix".to_string(), "perf".to_string()]
}

fn default_breaking_note_keywords() -> Vec<String> {
    vec!["BREAKING CHANGE".to_string(), "BREAKING-CHANGE".to_string()]
}

fn default_deps_bump_release_type() -> ReleaseType {
    ReleaseType::Patch
}

/// Commit classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub major_types: Vec<String>,
    #[serde(default = "default_minor_types")]
    pub minor_types: Vec<String>,
    #[serde(default = "default_patch_types")]
    pub patch_types: Vec<String>,
    #[serde(default = "default_breaking_note_keywords")]
    pub breaking_note_keywords: Vec<String>,
    /// Release type a package receives when only its dependencies changed.
    #[serde(default = "default_deps_bump_release_type")]
    pub deps_bump_release_type: ReleaseType,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            major_types: Vec::new(),
            minor_types: default_minor_types(),
            patch_types: default_patch_types(),
            breaking_note_keywords: default_breaking_note_keywords(),
            deps_bump_release_type: default_deps_bump_release_type(),
        }
    }
}

/// Reduces commits to a single release type.
#[derive(Debug, Clone)]
pub struct CommitClassifier {
    config: ClassifierConfig,
    parser: CommitParser,
}

impl CommitClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let parser = CommitParser::new(&config.breaking_note_keywords);
        Self { config, parser }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies `commits`, seeding with the dependency bump when
    /// `deps_changed` is set. Breaking changes and major types short-circuit.
    pub fn classify(&self, commits: &[Commit], deps_changed: bool) -> ReleaseType {
        let mut release_type = if deps_changed {
            self.config.deps_bump_release_type
        } else {
            ReleaseType::None
        };

        for commit in commits {
            let parsed = self.parser.parse(&commit.message);
            let Some(commit_type) = parsed.commit_type.as_deref() else {
                continue;
            };

            let breaking_note = parsed.notes.iter().any(|note| {
                self.config
                    .breaking_note_keywords
                    .iter()
                    .any(|keyword| keyword.trim() == note.title)
            });
            if parsed.breaking_mark || breaking_note {
                return ReleaseType::Major;
            }

            if contains(&self.config.major_types, commit_type) {
                return ReleaseType::Major;
            } else if contains(&self.config.minor_types, commit_type) {
                release_type = release_type.combine(ReleaseType::Minor);
            } else if contains(&self.config.patch_types, commit_type) {
                release_type = release_type.combine(ReleaseType::Patch);
            }
        }

        release_type
    }
}

impl Default for CommitClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

fn contains(types: &[String], commit_type: &str) -> bool {
    types.iter().any(|t| t == commit_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_without_space_after_colon_is_not_conventional() {
        let parsed = CommitParser::new(&["BREAKING CHANGE"]).parse("feat:missing space");
        assert_eq!(parsed.commit_type, None);
    }

    #[test]
    fn note_continuation_lines_are_joined() {
        let parser = CommitParser::new(&["BREAKING CHANGE"]);
        let parsed = parser.parse("feat: x\n\nBREAKING CHANGE: first\nsecond line");
        assert_eq!(parsed.notes.len(), 1);
        assert_eq!(parsed.notes[0].text, "first\nsecond line");
    }
}
