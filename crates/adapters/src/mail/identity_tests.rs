// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::mail::MailError;
use tempfile::TempDir;

fn store() -> (TempDir, IdentityStore) {
    let tmp = TempDir::new().unwrap();
    let store = IdentityStore::new(tmp.path().join("state").join("identities.json"));
    (tmp, store)
}

#[test]
fn save_and_load_round_trip() {
    let (_tmp, store) = store();
    let identity = AgentIdentity::new("/home/u/projects/p", "BlueLake").with_model("opus");
    store.save("proj", &identity).unwrap();

    let loaded = store.load("proj", Some("/home/u/projects/p")).unwrap();
    assert_eq!(loaded, identity);
    assert_eq!(loaded.program, "ntm");
}

#[test]
fn load_without_project_key_is_strict() {
    let (_tmp, store) = store();
    store
        .save("proj", &AgentIdentity::new("/p/one", "BlueLake"))
        .unwrap();

    // One identity: unambiguous, loads fine.
    assert_eq!(store.load("proj", None).unwrap().agent_name, "BlueLake");

    // Two identities: refuse to guess.
    store
        .save("proj", &AgentIdentity::new("/p/two", "RedFox"))
        .unwrap();
    let err = store.load("proj", None).unwrap_err();
    assert!(matches!(err, MailError::AmbiguousIdentity { .. }));

    // A project_key still disambiguates.
    assert_eq!(
        store.load("proj", Some("/p/two")).unwrap().agent_name,
        "RedFox"
    );
}

#[test]
fn unknown_session_and_key_error() {
    let (_tmp, store) = store();
    assert!(matches!(
        store.load("ghost", None).unwrap_err(),
        MailError::UnknownIdentity { .. }
    ));

    store
        .save("proj", &AgentIdentity::new("/p", "BlueLake"))
        .unwrap();
    assert!(matches!(
        store.load("proj", Some("/other")).unwrap_err(),
        MailError::UnknownIdentity { .. }
    ));
}

#[test]
fn forget_removes_session() {
    let (_tmp, store) = store();
    store
        .save("proj", &AgentIdentity::new("/p", "BlueLake"))
        .unwrap();
    store.forget("proj").unwrap();
    assert!(store.load("proj", None).is_err());
    // Forgetting again is a no-op.
    store.forget("proj").unwrap();
}
