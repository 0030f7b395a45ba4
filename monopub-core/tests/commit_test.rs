use monopub_core::commit::{ClassifierConfig, Commit, CommitClassifier, CommitParser};
use monopub_core::version::ReleaseType;

fn commits(messages: &[&str]) -> Vec<Commit> {
    messages
        .iter()
        .enumerate()
        .map(|(idx, message)| Commit::new(format!("{:040x}", idx), *message))
        .collect()
}

#[test]
fn test_parse_header() {
    let parser = CommitParser::new(&["BREAKING CHANGE"]);
    let parsed = parser.parse("feat(ui): add dark mode\n\nToggle lives in settings.");

    assert_eq!(parsed.commit_type.as_deref(), Some("feat"));
    assert_eq!(parsed.scope.as_deref(), Some("ui"));
    assert!(!parsed.breaking_mark);
    assert_eq!(parsed.subject.as_deref(), Some("add dark mode"));
    assert_eq!(parsed.header, "feat(ui): add dark mode");
    assert_eq!(parsed.body.as_deref(), Some("Toggle lives in settings."));
    assert!(parsed.notes.is_empty());
}

#[test]
fn test_parse_breaking_mark() {
    let parser = CommitParser::new(&["BREAKING CHANGE"]);

    let parsed = parser.parse("refactor(core)!: drop node 14");
    assert_eq!(parsed.commit_type.as_deref(), Some("refactor"));
    assert!(parsed.breaking_mark);

    let parsed = parser.parse("fix!: x");
    assert_eq!(parsed.scope, None);
    assert!(parsed.breaking_mark);
}

#[test]
fn test_parse_notes() {
    let parser = CommitParser::new(&["BREAKING CHANGE", "BREAKING-CHANGE"]);
    let parsed = parser.parse(
        "feat: new api\n\nSome body.\n\nBREAKING-CHANGE: `run` is async now\nCallers must await it.",
    );

    assert_eq!(parsed.body.as_deref(), Some("Some body."));
    assert_eq!(parsed.notes.len(), 1);
    assert_eq!(parsed.notes[0].title, "BREAKING-CHANGE");
    assert_eq!(parsed.notes[0].text, "`run` is async now\nCallers must await it.");
}

#[test]
fn test_unparseable_header() {
    let parser = CommitParser::new(&["BREAKING CHANGE"]);

    assert_eq!(parser.parse("Merge branch 'main'").commit_type, None);
    assert_eq!(parser.parse("").commit_type, None);
}

#[test]
fn test_breaking_mark_is_major() {
    let classifier = CommitClassifier::default();
    assert_eq!(
        classifier.classify(&commits(&["fix!: x"]), false),
        ReleaseType::Major
    );
}

#[test]
fn test_breaking_note_is_major() {
    let classifier = CommitClassifier::default();
    let result = classifier.classify(
        &commits(&["fix: x\n\nBREAKING CHANGE: y"]),
        false,
    );
    assert_eq!(result, ReleaseType::Major);
}

#[test]
fn test_breaking_note_needs_conventional_header() {
    let classifier = CommitClassifier::default();
    let result = classifier.classify(&commits(&["update stuff\n\nBREAKING CHANGE: y"]), false);
    assert_eq!(result, ReleaseType::None);
}

#[test]
fn test_highest_type_wins() {
    let classifier = CommitClassifier::default();

    assert_eq!(
        classifier.classify(&commits(&["fix: a", "feat: b"]), false),
        ReleaseType::Minor
    );
    assert_eq!(
        classifier.classify(&commits(&["feat: b", "perf: c"]), false),
        ReleaseType::Minor
    );
    assert_eq!(
        classifier.classify(&commits(&["perf: c", "docs: d"]), false),
        ReleaseType::Patch
    );
}

#[test]
fn test_irrelevant_commits_are_none() {
    let classifier = CommitClassifier::default();

    assert_eq!(
        classifier.classify(&commits(&["docs: readme", "chore: bump ci", "wip"]), false),
        ReleaseType::None
    );
    assert_eq!(classifier.classify(&[], false), ReleaseType::None);
}

#[test]
fn test_major_type_anywhere() {
    let classifier = CommitClassifier::new(ClassifierConfig {
        major_types: vec!["feat".to_string()],
        minor_types: vec!["refactor".to_string()],
        ..ClassifierConfig::default()
    });

    let result = classifier.classify(&commits(&["fix: a", "refactor: b", "feat: c"]), false);
    assert_eq!(result, ReleaseType::Major);
}

#[test]
fn test_deps_changed_seeds_result() {
    let classifier = CommitClassifier::default();

    assert_eq!(classifier.classify(&[], true), ReleaseType::Patch);
    assert_eq!(
        classifier.classify(&commits(&["feat: b"]), true),
        ReleaseType::Minor
    );

    let classifier = CommitClassifier::new(ClassifierConfig {
        deps_bump_release_type: ReleaseType::Minor,
        ..ClassifierConfig::default()
    });
    assert_eq!(
        classifier.classify(&commits(&["fix: a"]), true),
        ReleaseType::Minor
    );
}

#[test]
fn test_custom_note_keywords() {
    let classifier = CommitClassifier::new(ClassifierConfig {
        breaking_note_keywords: vec!["INCOMPATIBLE".to_string()],
        ..ClassifierConfig::default()
    });

    assert_eq!(
        classifier.classify(&commits(&["fix: a\n\nINCOMPATIBLE: config renamed"]), false),
        ReleaseType::Major
    );
    assert_eq!(
        classifier.classify(&commits(&["fix: a\n\nBREAKING CHANGE: ignored"]), false),
        ReleaseType::Patch
    );
}

#[test]
fn test_note_keywords_with_surrounding_whitespace() {
    let classifier = CommitClassifier::new(ClassifierConfig {
        breaking_note_keywords: vec![" BREAKING CHANGE ".to_string()],
        ..ClassifierConfig::default()
    });

    assert_eq!(
        classifier.classify(&commits(&["fix: a\n\nBREAKING CHANGE: new defaults"]), false),
        ReleaseType::Major
    );
}

#[test]
fn test_config_defaults_from_json() {
    let config: ClassifierConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ClassifierConfig::default());

    let config: ClassifierConfig =
        serde_json::from_str(r#"{"major_types": ["feat"], "deps_bump_release_type": "none"}"#)
            .unwrap();
    assert_eq!(config.major_types, vec!["feat"]);
    assert_eq!(config.minor_types, vec!["feat"]);
    assert_eq!(config.deps_bump_release_type, ReleaseType::None);
}
