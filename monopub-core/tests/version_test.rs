use monopub_core::version::{
    combine_release_type, is_package_changed, next_version, range_for_bump, ReleaseType, Version,
};
use monopub_core::Error;
use proptest::prelude::*;

fn gen_release_type() -> impl Strategy<Value = ReleaseType> {
    prop_oneof![
        Just(ReleaseType::None),
        Just(ReleaseType::Patch),
        Just(ReleaseType::Minor),
        Just(ReleaseType::Major),
    ]
}

#[test]
fn test_first_release_is_one_zero_zero() {
    for release_type in [ReleaseType::Patch, ReleaseType::Minor, ReleaseType::Major] {
        assert_eq!(next_version(None, release_type).unwrap(), Some(Version::new(1, 0, 0)));
    }
    assert_eq!(next_version(None, ReleaseType::None).unwrap(), None);
}

#[test]
fn test_next_version_bumps() {
    let prior = Some(Version::new(1, 2, 3));

    assert_eq!(next_version(prior, ReleaseType::Major).unwrap(), Some(Version::new(2, 0, 0)));
    assert_eq!(next_version(prior, ReleaseType::Minor).unwrap(), Some(Version::new(1, 3, 0)));
    assert_eq!(next_version(prior, ReleaseType::Patch).unwrap(), Some(Version::new(1, 2, 4)));
    assert_eq!(next_version(prior, ReleaseType::None).unwrap(), prior);
}

#[test]
fn test_next_version_overflow_is_an_error() {
    let prior = Some(Version::new(u64::MAX, u64::MAX, u64::MAX));

    for release_type in [ReleaseType::Major, ReleaseType::Minor, ReleaseType::Patch] {
        assert!(matches!(
            next_version(prior, release_type),
            Err(Error::InvalidVersion { .. })
        ));
    }
    assert_eq!(next_version(prior, ReleaseType::None).unwrap(), prior);
}

#[test]
fn test_next_version_from_zero_major() {
    let prior = Some(Version::new(0, 4, 1));

    assert_eq!(next_version(prior, ReleaseType::Major).unwrap(), Some(Version::new(1, 0, 0)));
    assert_eq!(next_version(prior, ReleaseType::Minor).unwrap(), Some(Version::new(0, 5, 0)));
}

#[test]
fn test_combine_release_type() {
    assert_eq!(
        combine_release_type(ReleaseType::Patch, ReleaseType::Minor),
        ReleaseType::Minor
    );
    assert_eq!(
        combine_release_type(ReleaseType::Major, ReleaseType::Patch),
        ReleaseType::Major
    );
    assert_eq!(
        combine_release_type(ReleaseType::None, ReleaseType::None),
        ReleaseType::None
    );
}

#[test]
fn test_is_package_changed() {
    let old = Some(Version::new(1, 0, 0));

    assert!(is_package_changed(Some(Version::new(1, 0, 1)), old, ReleaseType::Patch));
    assert!(is_package_changed(Some(Version::new(1, 0, 0)), None, ReleaseType::Major));
    assert!(!is_package_changed(old, old, ReleaseType::None));
    assert!(!is_package_changed(None, None, ReleaseType::None));
    assert!(!is_package_changed(old, old, ReleaseType::Patch));
}

#[test]
fn test_range_for_bump_exact() {
    for declared in ["*", "workspace:*", "1.2.3", "x"] {
        assert_eq!(range_for_bump(declared, "2.0.0"), "2.0.0", "declared: {}", declared);
    }
}

#[test]
fn test_range_for_bump_tilde() {
    for declared in ["~1.2.3", "workspace:~", "1.2.x"] {
        assert_eq!(range_for_bump(declared, "2.0.0"), "~2.0.0", "declared: {}", declared);
    }
}

#[test]
fn test_range_for_bump_caret() {
    for declared in ["^1.2.3", "workspace:^", "1.x"] {
        assert_eq!(range_for_bump(declared, "2.0.0"), "^2.0.0", "declared: {}", declared);
    }
}

#[test]
fn test_version_parse_and_display() {
    let version: Version = "1.2.3".parse().unwrap();
    assert_eq!(version, Version::new(1, 2, 3));
    assert_eq!(version.to_string(), "1.2.3");

    assert!("not-a-version".parse::<Version>().is_err());
}

#[test]
fn test_release_type_parse() {
    assert_eq!("minor".parse::<ReleaseType>().unwrap(), ReleaseType::Minor);
    assert_eq!("MAJOR".parse::<ReleaseType>().unwrap(), ReleaseType::Major);
    assert!("huge".parse::<ReleaseType>().is_err());
}

#[test]
fn test_version_ordering() {
    assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
    assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
    assert!(None < Some(Version::new(0, 0, 1)));
}

proptest! {
    #[test]
    fn test_combine_is_commutative(a in gen_release_type(), b in gen_release_type()) {
        prop_assert_eq!(combine_release_type(a, b), combine_release_type(b, a));
    }

    #[test]
    fn test_none_is_identity(a in gen_release_type()) {
        prop_assert_eq!(combine_release_type(a, ReleaseType::None), a);
    }

    #[test]
    fn test_next_version_is_monotonic(
        major in 0u64..100,
        minor in 0u64..100,
        patch in 0u64..100,
        release_type in gen_release_type(),
    ) {
        let prior = Version::new(major, minor, patch);
        let next = next_version(Some(prior), release_type).unwrap().unwrap();
        if release_type.is_none() {
            prop_assert_eq!(next, prior);
        } else {
            prop_assert!(next > prior);
        }
    }
}
