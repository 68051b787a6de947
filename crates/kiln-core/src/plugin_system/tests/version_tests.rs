#![cfg(test)]

use std::cmp::Ordering;
use std::str::FromStr;

use crate::plugin_system::version::{Version, VersionError, VersionMatcher};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn test_parse_accepts_all_four_formats() {
    assert_eq!(v("1.2.3-beta"), Version::with_extension(1, 2, 3, "beta").unwrap());
    assert_eq!(v("1.2.3"), Version::new(1, 2, 3));
    assert_eq!(v("1.2-rc_1"), Version::with_extension(1, 2, 0, "rc_1").unwrap());
    assert_eq!(v("1.2"), Version::new(1, 2, 0));
}

#[test]
fn test_parse_rejects_partial_matches() {
    for input in ["1.2.3extra", "1", "1.2.3.4", "", "1..2", "a.b", "1.2-", "1.2.3-be.ta", " 1.2", "1.2.3 ", "-1.2"] {
        assert!(Version::parse(input).is_err(), "'{}' should not parse", input);
    }
}

#[test]
fn test_parse_out_of_range_component() {
    let err = Version::parse("99999999999.0").unwrap_err();
    assert!(matches!(err, VersionError::OutOfRange { .. }));
}

#[test]
fn test_display_round_trip() {
    let samples = [
        Version::new(0, 0, 0),
        Version::new(4294967295, 1, 2),
        Version::with_extension(1, 0, 0, "rc1").unwrap(),
        Version::with_extension(2, 5, 7, "pre-release_2").unwrap(),
    ];
    for version in samples {
        assert_eq!(Version::parse(&version.to_string()).unwrap(), version);
    }
    assert_eq!(v("1.2").to_string(), "1.2.0");
}

#[test]
fn test_compare_is_numeric_and_ignores_extension() {
    assert_eq!(v("1.9.0").compare(&v("1.10.0")), Ordering::Less);
    assert_eq!(v("2.0").compare(&v("1.99.99")), Ordering::Greater);
    assert_eq!(v("1.0.0-rc1").compare(&v("1.0.0")), Ordering::Equal);
    assert_ne!(v("1.0.0-rc1"), v("1.0.0"));
    assert_ne!(v("1.0.0-RC1"), v("1.0.0-rc1"));
}

#[test]
fn test_partial_ord_consistent_with_eq() {
    assert!(v("1.0.0") < v("1.0.1"));
    assert_eq!(v("1.0.0-a").partial_cmp(&v("1.0.0-b")), None);
    assert_eq!(v("1.0.0-a").partial_cmp(&v("1.0.0-a")), Some(Ordering::Equal));
}

#[test]
fn test_with_extension_validates_token() {
    assert!(Version::with_extension(1, 0, 0, "").is_err());
    assert!(Version::with_extension(1, 0, 0, "a b").is_err());
    assert!(!Version::new(1, 0, 0).is_extended());
    assert!(Version::parse("1.0-rc").unwrap().is_extended());
}

#[test]
fn test_matchers() {
    let req = v("1.2.0");
    assert!(VersionMatcher::Exact.matches(&req, &v("1.2.0")));
    assert!(!VersionMatcher::Exact.matches(&req, &v("1.2.0-beta")));
    assert!(VersionMatcher::Greater.matches(&req, &v("1.2.1")));
    assert!(!VersionMatcher::Greater.matches(&req, &v("1.2.0-beta")));
    assert!(VersionMatcher::AtLeast.matches(&req, &v("1.2.0-beta")));
    assert!(VersionMatcher::Less.matches(&req, &v("1.1.9")));
    assert!(VersionMatcher::AtMost.matches(&req, &v("1.2.0")));
    assert!(!VersionMatcher::AtMost.matches(&req, &v("1.3")));

    assert!(VersionMatcher::Compatible.matches(&req, &v("1.9.0")));
    assert!(!VersionMatcher::Compatible.matches(&req, &v("2.0.0")));
    assert!(!VersionMatcher::Compatible.matches(&req, &v("1.1.0")));
    assert!(VersionMatcher::Compatible.matches(&v("0.3.0"), &v("0.3.5")));
    assert!(!VersionMatcher::Compatible.matches(&v("0.3.0"), &v("0.4.0")));

    assert!(VersionMatcher::Approximately.matches(&req, &v("1.2.9")));
    assert!(!VersionMatcher::Approximately.matches(&req, &v("1.3.0")));
    assert!(VersionMatcher::Any.matches(&req, &v("0.0.1")));
}

#[test]
fn test_matcher_symbols() {
    for symbol in ["=", ">", ">=", "<", "<=", "^", "~", "*"] {
        let matcher = VersionMatcher::from_str(symbol).unwrap();
        assert_eq!(matcher.to_string(), symbol);
    }
    assert!(matches!(VersionMatcher::from_str("=>"), Err(VersionError::UnknownOperator(_))));
}

#[test]
fn test_split_operator() {
    assert_eq!(VersionMatcher::split_operator(">=1.0"), (VersionMatcher::AtLeast, "1.0"));
    assert_eq!(VersionMatcher::split_operator("> 2.0"), (VersionMatcher::Greater, "2.0"));
    assert_eq!(VersionMatcher::split_operator("<=3.1"), (VersionMatcher::AtMost, "3.1"));
    assert_eq!(VersionMatcher::split_operator("1.4"), (VersionMatcher::AtLeast, "1.4"));
    assert_eq!(VersionMatcher::split_operator("*"), (VersionMatcher::Any, ""));
}

#[test]
fn test_parse_requirement() {
    assert_eq!(VersionMatcher::parse_requirement("^1.2").unwrap(), (VersionMatcher::Compatible, Version::new(1, 2, 0)));
    assert_eq!(VersionMatcher::parse_requirement("2.0").unwrap(), (VersionMatcher::AtLeast, Version::new(2, 0, 0)));
    assert_eq!(VersionMatcher::parse_requirement(" * ").unwrap(), (VersionMatcher::Any, Version::new(0, 0, 0)));
    assert!(matches!(VersionMatcher::parse_requirement("*1.0"), Err(VersionError::InvalidFormat(_))));
    assert!(VersionMatcher::parse_requirement(">=").is_err());
}
