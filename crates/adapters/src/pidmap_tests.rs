// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple          = { "42 (bash) S 1 42 42 0 -1", Some(1) },
    spaces_in_comm  = { "77 (my agent) R 33 77 77 0 -1", Some(33) },
    parens_in_comm  = { "9 (a (weird) name) S 7 9 9 0 -1", Some(7) },
    trailing_paren  = { "13 (cat)) Z 12 13", Some(12) },
    no_comm         = { "nonsense", None },
    missing_fields  = { "5 (x)", None },
)]
fn stat_parsing(line: &str, expected: Option<u32>) {
    assert_eq!(parse_stat_line(line), expected);
}

fn pane(id: &str, index: u32, title: &str, shell_pid: u32) -> PaneInfo {
    PaneInfo {
        id: id.to_string(),
        index,
        title: title.to_string(),
        shell_pid,
    }
}

#[test]
fn refresh_builds_all_three_views() {
    // shell 100 -> agent 200 -> helper 300; shell 110 with no children
    let table = ProcessTable::from_pairs(&[(200, 100), (300, 200), (110, 1), (100, 1)]);
    let map = PidMap::new();
    map.refresh(
        "proj",
        &[
            pane("%1", 0, "proj__cc_1", 100),
            pane("%2", 1, "", 110),
        ],
        &table,
    );

    assert_eq!(map.shell_pid("proj__cc_1"), Some(100));
    assert_eq!(map.shell_pid("proj:1"), Some(110));

    assert_eq!(map.pane_for_pid(300).as_deref(), Some("proj__cc_1"));
    assert_eq!(map.pane_for_pid(100).as_deref(), Some("proj__cc_1"));
    assert_eq!(map.pane_for_pid(110).as_deref(), Some("proj:1"));
    assert_eq!(map.pane_for_pid(999), None);

    let pids = map.all_pids_for_pane("proj__cc_1");
    assert_eq!(pids, vec![100, 200, 300]);
}

#[test]
fn refresh_replaces_previous_state() {
    let map = PidMap::new();
    let table = ProcessTable::from_pairs(&[(100, 1)]);
    map.refresh("proj", &[pane("%1", 0, "a", 100)], &table);
    assert!(map.shell_pid("a").is_some());

    map.refresh("proj", &[pane("%2", 0, "b", 200)], &table);
    assert!(map.shell_pid("a").is_none());
    assert_eq!(map.shell_pid("b"), Some(200));
}

#[test]
fn descendants_handle_diamond_free_trees() {
    let table = ProcessTable::from_pairs(&[(2, 1), (3, 1), (4, 2), (5, 4)]);
    assert_eq!(table.descendants_of(1), vec![1, 2, 3, 4, 5]);
    assert_eq!(table.descendants_of(4), vec![4, 5]);
    assert_eq!(table.descendants_of(99), vec![99]);
}

#[test]
fn missing_proc_degrades_to_empty_table() {
    let table = ProcessTable::sample_from(std::path::Path::new("/nonexistent-proc-xyz"));
    assert!(table.is_empty());
    assert_eq!(table.descendants_of(42), vec![42]);
}

#[cfg(target_os = "linux")]
#[test]
fn sampling_real_proc_is_nonempty() {
    let table = ProcessTable::sample();
    assert!(!table.is_empty());
    // This process has a parent, so it appears in the descendant walk of
    // some root; at minimum its own entry resolves.
    let me = std::process::id();
    assert!(table.descendants_of(me).contains(&me));
}
