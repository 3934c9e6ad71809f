// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

#[yare::parameterized(
    unlabeled      = { "myproject", "myproject", None },
    labeled        = { "my-project--frontend", "my-project", Some("frontend") },
    label_keeps_rest = { "proj--a--b", "proj", Some("a--b") },
    underscore_base  = { "my_proj--x", "my_proj", Some("x") },
)]
fn parse_splits_on_first_separator(name: &str, base: &str, label: Option<&str>) {
    assert_eq!(parse_session_label(name), (base, label));
}

#[test]
fn format_round_trips_labeled_names() {
    for name in ["my-project--frontend", "proj--a--b", "a--b"] {
        let (base, label) = parse_session_label(name);
        assert_eq!(format_session_name(base, label), name);
    }
}

#[test]
fn format_without_label_is_base() {
    assert_eq!(format_session_name("myproject", None), "myproject");
}

#[test]
fn validate_label_accepts_simple_labels() {
    assert!(validate_label("frontend").is_ok());
    assert!(validate_label("a1-b_c").is_ok());
}

#[test]
fn validate_label_rejects_embedded_separator() {
    let err = validate_label("my--label").unwrap_err();
    assert!(matches!(err, SessionNameError::LabelContainsSeparator(_)));
    assert!(err.to_string().contains("separator"));
}

#[test]
fn validate_label_rejects_overlong() {
    let long = "a".repeat(51);
    assert!(matches!(
        validate_label(&long),
        Err(SessionNameError::LabelTooLong(51))
    ));
    assert!(validate_label(&"a".repeat(50)).is_ok());
}

#[yare::parameterized(
    empty        = { "" },
    leading_dash = { "-proj" },
    bad_char     = { "pro j" },
    bad_label    = { "proj---x" },
)]
fn validate_session_name_rejects(name: &str) {
    assert!(validate_session_name(name).is_err());
}

#[test]
fn project_dir_is_shared_across_labels() {
    let base = Path::new("/home/user/projects");
    assert_eq!(
        project_dir(base, "myproject"),
        Path::new("/home/user/projects/myproject")
    );
    assert_eq!(
        project_dir(base, "myproject--frontend"),
        project_dir(base, "myproject")
    );
    assert_eq!(
        project_dir(base, "myproject--backend"),
        project_dir(base, "myproject--frontend")
    );
}

#[test]
fn session_name_accessors() {
    let name = SessionName::new("proj--web").unwrap();
    assert_eq!(name.base(), "proj");
    assert_eq!(name.label(), Some("web"));
    assert_eq!(name.to_string(), "proj--web");
    assert_eq!(
        name.project_dir(Path::new("/p")),
        Path::new("/p/proj").to_path_buf()
    );
}

#[test]
fn session_name_rejects_invalid() {
    assert!(SessionName::new("--nope").is_err());
    assert!("ok--yes".parse::<SessionName>().is_ok());
}
