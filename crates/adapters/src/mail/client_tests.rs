// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_config::AgentMailConfig;
use serde_json::json;

fn disabled_client() -> MailClient {
    MailClient::new(&AgentMailConfig {
        enabled: false,
        ..Default::default()
    })
}

#[tokio::test]
async fn disabled_client_short_circuits() {
    let client = disabled_client();
    let err = client.ensure_project("/p").await.unwrap_err();
    assert!(matches!(err, MailError::Disabled));

    let err = client.overseer_send("/p", "BlueLake", "hi").await.unwrap_err();
    assert!(matches!(err, MailError::Disabled));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Reserved TEST-NET address; nothing listens there.
    let client = MailClient::new(&AgentMailConfig {
        enabled: true,
        url: "http://192.0.2.1:1".to_string(),
        short_timeout_secs: 1,
        long_timeout_secs: 1,
        ..Default::default()
    });
    let err = client.ensure_project("/p").await.unwrap_err();
    assert!(matches!(err, MailError::Transport { .. }), "got {err:?}");
}

#[test]
fn reservation_outcome_partitions_request() {
    let result = json!({
        "granted": ["src/a.rs", "src/b.rs"],
        "conflicts": [
            { "path": "src/c.rs", "holders": ["RedFox", "GreenHill"] },
        ],
    });
    let outcome = parse_reservation_outcome(&result).unwrap();
    assert_eq!(outcome.granted, ["src/a.rs", "src/b.rs"]);
    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(outcome.conflicts[0].holders, ["RedFox", "GreenHill"]);
    assert_eq!(outcome.total(), 3);
}

#[test]
fn empty_reservation_result_is_empty_outcome() {
    let outcome = parse_reservation_outcome(&json!({})).unwrap();
    assert!(outcome.granted.is_empty());
    assert!(outcome.all_granted());
}
