// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

/// Random prefix for this test run to avoid conflicts with parallel test runs.
static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("ntm{:04x}", nanos & 0xFFFF)
});

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_name(suffix: &str) -> String {
    let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", *TEST_PREFIX, suffix, id)
}

fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! fail_if_no_tmux {
    () => {
        if !tmux_available() {
            panic!("tmux is required but not available");
        }
    };
}

#[tokio::test]
#[serial(tmux)]
async fn create_session_then_has_session() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let name = unique_name("create");

    client.create_session(&name, Path::new("/tmp")).await.unwrap();
    assert!(client.has_session(&name).await.unwrap());

    client.kill_session(&name).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!client.has_session(&name).await.unwrap());
}

#[tokio::test]
#[serial(tmux)]
async fn list_panes_reports_title_and_pid() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let name = unique_name("panes");

    client.create_session(&name, Path::new("/tmp")).await.unwrap();
    client
        .set_pane_title(&format!("{name}:0"), "proj__cc_1")
        .await
        .unwrap();

    let panes = client.list_panes(&name).await.unwrap();
    assert_eq!(panes.len(), 1);
    assert_eq!(panes[0].title, "proj__cc_1");
    assert!(panes[0].shell_pid > 0);

    let _ = client.kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn split_window_returns_new_pane_id() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let name = unique_name("split");

    client.create_session(&name, Path::new("/tmp")).await.unwrap();
    let pane_id = client.split_window(&name, Path::new("/tmp")).await.unwrap();
    assert!(pane_id.starts_with('%'), "unexpected pane id {pane_id:?}");

    let panes = client.list_panes(&name).await.unwrap();
    assert_eq!(panes.len(), 2);

    let _ = client.kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn send_line_echoes_into_capture() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let name = unique_name("send");

    client.create_session(&name, Path::new("/tmp")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    client
        .send_line(&format!("{name}:0"), "echo ntm-$((40+2))")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let captured = client
        .capture_pane(&format!("{name}:0"), CaptureRange::LastLines(20))
        .await
        .unwrap();
    assert!(captured.contains("ntm-42"), "capture was: {captured}");

    let _ = client.kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn pipe_pane_attach_and_cancel() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let name = unique_name("pipe");

    client.create_session(&name, Path::new("/tmp")).await.unwrap();
    let target = format!("{name}:0");

    let sink = std::env::temp_dir().join(format!("{name}.out"));
    let command = format!(
        "cat >> {}",
        crate::mux::shell_quote(&sink.to_string_lossy())
    );
    client.pipe_pane(&target, &command).await.unwrap();

    client.send_line(&target, "echo piped-$((1+1))").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    client.pipe_pane_cancel(&target).await.unwrap();

    let contents = std::fs::read_to_string(&sink).unwrap_or_default();
    assert!(contents.contains("piped-2"), "pipe sink was: {contents:?}");

    let _ = std::fs::remove_file(&sink);
    let _ = client.kill_session(&name).await;
}

#[tokio::test]
#[serial(tmux)]
async fn kill_nonexistent_session_succeeds() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    assert!(client.kill_session("ntm-definitely-not-there").await.is_ok());
}

#[tokio::test]
#[serial(tmux)]
async fn send_to_nonexistent_target_errors() {
    fail_if_no_tmux!();
    let client = TmuxClient::default();
    let result = client.send_keys("ntm-definitely-not-there", "x").await;
    assert!(result.is_err());
}

#[test]
fn render_command_includes_ssh_host() {
    let client = TmuxClient::new("tmux", Some("user@host".to_string()));
    let rendered = client.render_command(&["list-panes", "-t", "s"]);
    assert_eq!(rendered, "ssh user@host tmux list-panes -t s");
}
