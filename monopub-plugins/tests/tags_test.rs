use monopub_core::version::Version;
use monopub_core::Error;
use monopub_plugins::tags::{latest_releases, TagFormat};

#[test]
fn test_parse_rejects_missing_placeholders() {
    for template in ["v{version}", "{name}-release", "release"] {
        assert!(
            matches!(TagFormat::parse(template), Err(Error::Configuration(_))),
            "template: {}",
            template
        );
    }
}

#[test]
fn test_parse_rejects_repeated_placeholders() {
    let err = TagFormat::parse("{name}@{version}-{version}").unwrap_err();
    assert!(err.to_string().contains("multiple"));

    let err = TagFormat::parse("{name}/{name}@{version}").unwrap_err();
    assert!(err.to_string().contains("multiple"));
}

#[test]
fn test_render() {
    let format = TagFormat::default();
    assert_eq!(format.render("@scope/pkg", Version::new(1, 2, 3)), "@scope/pkg@1.2.3");

    let format = TagFormat::parse("v{version}-{name}").unwrap();
    assert_eq!(format.render("core", Version::new(0, 1, 0)), "v0.1.0-core");
}

#[test]
fn test_regex_escapes_literals_and_names() {
    let format = TagFormat::parse("release/{name}+{version}").unwrap();
    let pattern = format.regex(&["a.b"]).unwrap();

    assert!(pattern.is_match("release/a.b+1.2.3"));
    assert!(!pattern.is_match("release/aXb+1.2.3"));
    assert!(!pattern.is_match("release/a.b1.2.3"));
    assert!(!pattern.is_match("prefix-release/a.b+1.2.3"));
}

#[test]
fn test_latest_releases_picks_highest_version() {
    let tags = [
        "pkg-a@1.0.0",
        "pkg-a@1.10.0",
        "pkg-a@1.9.3",
        "pkg-b@0.1.0",
        "other@9.9.9",
        "pkg-a@not-a-version",
        "v2.0.0",
    ];
    let names = ["pkg-a", "pkg-b", "pkg-c"];

    let releases = latest_releases(&tags, &names, &TagFormat::default()).unwrap();

    assert_eq!(releases.len(), 3);
    assert_eq!(releases["pkg-a"], Some(Version::new(1, 10, 0)));
    assert_eq!(releases["pkg-b"], Some(Version::new(0, 1, 0)));
    assert_eq!(releases["pkg-c"], None);
}

#[test]
fn test_latest_releases_with_scoped_names() {
    let tags = ["@org/ui@2.0.0", "@org/ui-kit@3.0.0"];
    let names = ["@org/ui", "@org/ui-kit"];

    let releases = latest_releases(&tags, &names, &TagFormat::default()).unwrap();

    assert_eq!(releases["@org/ui"], Some(Version::new(2, 0, 0)));
    assert_eq!(releases["@org/ui-kit"], Some(Version::new(3, 0, 0)));
}

#[test]
fn test_latest_releases_without_packages() {
    let names: [&str; 0] = [];
    let releases = latest_releases(&["pkg@1.0.0"], &names, &TagFormat::default()).unwrap();
    assert!(releases.is_empty());
}
