// Lovi - tests/e2e_tail.rs
//
// End-to-end tests for the tail engine.
//
// Real files in a temp directory are driven through TailReader,
// MonitorSession, MonitorRegistry and the scheduler thread. No mocks.

use lovi::app::registry::MonitorRegistry;
use lovi::app::scheduler::MonitorManager;
use lovi::app::tail::TailReader;
use lovi::core::classify::{classify, render, FilterMarkers};
use lovi::core::model::{LineClass, MonitorProgress, Rotation};
use lovi::platform::config::MonitorSettings;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn append(path: &Path, content: &str) {
    let mut f = fs::OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

fn lines_of(count: usize, width: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{i:0>width$}", width = width.max(6)))
        .collect()
}

fn write_lines(path: &Path, lines: &[String]) {
    let mut content = String::new();
    for l in lines {
        content.push_str(l);
        content.push('\n');
    }
    fs::write(path, content).unwrap();
}

// =============================================================================
// Reference scenario
// =============================================================================

/// Backlog, classification, append and the changed flag in one walk.
#[test]
fn e2e_backlog_classify_append_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "start\nan error occurred\ndone\n").unwrap();
    let markers = FilterMarkers::default();

    let mut reader = TailReader::open(&path).unwrap();
    let backlog = reader.initial_backlog(10).unwrap();
    assert_eq!(backlog, ["start", "an error occurred", "done"]);
    assert_eq!(classify(&backlog[1], &markers), LineClass::Error);

    append(&path, "warning: low disk\n");
    let delta = reader.poll_delta().unwrap();
    assert_eq!(delta.lines, ["warning: low disk"]);
    assert_eq!(classify(&delta.lines[0], &markers), LineClass::Warning);
    assert!(reader.is_changed_since_last_check());
    assert!(!reader.is_changed_since_last_check());
}

/// Markup escapes angle brackets whatever the class.
#[test]
fn e2e_markup_is_escaped_for_every_class() {
    for class in [LineClass::Normal, LineClass::Warning, LineClass::Error] {
        let out = render("<script>alert(1)</script>", class);
        assert!(out.contains("&lt;script&gt;"), "{class}: {out}");
        assert!(!out.contains("<script>"), "{class}: {out}");
    }
}

// =============================================================================
// Rotation through the registry
// =============================================================================

/// After the file is replaced, the next lines come from the new file only.
#[cfg(unix)]
#[test]
fn e2e_rotation_by_rename_reads_new_file_from_start() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("syslog");
    fs::write(&path, "old 1\nold 2\n").unwrap();

    let mut reg = MonitorRegistry::new(MonitorSettings::default(), FilterMarkers::default());
    let id = reg.open(&path).unwrap();
    reg.tick(id).unwrap();
    assert_eq!(reg.new_rendered_lines(id).unwrap().len(), 2);

    fs::rename(&path, dir.path().join("syslog.1")).unwrap();
    fs::write(&path, "new 1\nnew 2 failed\n").unwrap();

    reg.tick(id).unwrap();
    reg.tick(id).unwrap();
    let texts: Vec<_> = reg
        .new_rendered_lines(id)
        .unwrap()
        .into_iter()
        .map(|l| (l.text, l.class))
        .collect();
    assert_eq!(
        texts,
        [
            ("new 1".to_string(), LineClass::Normal),
            ("new 2 failed".to_string(), LineClass::Error)
        ]
    );
    assert_eq!(reg.session(id).unwrap().rotations(), 1);
}

/// copytruncate-style rotation is picked up too.
#[test]
fn e2e_truncation_in_place_restarts_from_beginning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "a fairly long first line\nand a second one\n").unwrap();

    let mut reader = TailReader::open(&path).unwrap();
    reader.initial_backlog(10).unwrap();

    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(0)
        .unwrap();
    append(&path, "x\n");

    let first = reader.poll_delta().unwrap();
    assert_eq!(first.rotation, Some(Rotation::Truncated));
    let second = reader.poll_delta().unwrap();
    assert_eq!(second.lines, ["x"]);
}

/// One file disappearing never stops the others.
#[test]
fn e2e_deleted_file_does_not_stop_siblings() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.log");
    let b = dir.path().join("b.log");
    fs::write(&a, "").unwrap();
    fs::write(&b, "").unwrap();

    let mut reg = MonitorRegistry::new(MonitorSettings::default(), FilterMarkers::default());
    reg.open(&a).unwrap();
    let idb = reg.open(&b).unwrap();
    reg.tick_all();

    fs::remove_file(&a).unwrap();
    append(&b, "still here\n");
    reg.tick_all();
    assert_eq!(reg.new_rendered_lines(idb).unwrap()[0].text, "still here");
    assert_eq!(reg.collect_changes(), ["b.log"]);
}

// =============================================================================
// Scheduler thread
// =============================================================================

/// Lines appended to two files reach the UI side and both files are named
/// in change notices. A change check may fall between the two appends, so
/// names are gathered across batches.
#[test]
fn e2e_scheduler_reports_changes_for_both_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.log");
    let b = dir.path().join("b.log");
    fs::write(&a, "").unwrap();
    fs::write(&b, "").unwrap();

    let settings = MonitorSettings {
        poll_interval: Duration::from_millis(20),
        change_check_interval: Duration::from_millis(200),
        ..MonitorSettings::default()
    };
    let mut mgr = MonitorManager::new();
    mgr.start(settings, FilterMarkers::default());
    let ida = mgr.open(&a).unwrap();
    let idb = mgr.open(&b).unwrap();
    append(&a, "one\n");
    append(&b, "two\n");

    let mut texts = BTreeSet::new();
    let mut names = BTreeSet::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while (texts.len() < 2 || names.len() < 2) && Instant::now() < deadline {
        for msg in mgr.poll_progress() {
            match msg {
                MonitorProgress::Lines { id, lines } => {
                    assert!(id == ida || id == idb);
                    texts.extend(lines.into_iter().map(|l| l.text));
                }
                MonitorProgress::Changed { names: batch } => names.extend(batch),
                _ => {}
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(texts, BTreeSet::from(["one".to_string(), "two".to_string()]));
    assert_eq!(
        names,
        BTreeSet::from(["a.log".to_string(), "b.log".to_string()])
    );
    mgr.stop();
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    /// The backlog is exactly the last `max` lines (or all of them), in order.
    #[test]
    fn backlog_is_the_last_lines_in_order(
        count in 0usize..300,
        width in 1usize..200,
        max in 1usize..120,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.log");
        let lines = lines_of(count, width);
        write_lines(&path, &lines);

        let mut reader = TailReader::open(&path).unwrap();
        let backlog = reader.initial_backlog(max).unwrap();
        let expected = &lines[count.saturating_sub(max)..];
        prop_assert_eq!(backlog.as_slice(), expected);
    }

    /// Writes split at arbitrary byte offsets still yield each line once.
    #[test]
    fn split_writes_yield_each_line_once(
        text in "[a-z ]{1,20}(\n[a-z ]{1,20}){0,8}\n",
        split in 0usize..200,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.log");
        fs::write(&path, "").unwrap();
        let mut reader = TailReader::open(&path).unwrap();
        reader.initial_backlog(10).unwrap();

        let cut = split.min(text.len());
        let mut seen = Vec::new();
        append(&path, &text[..cut]);
        seen.extend(reader.poll_delta().unwrap().lines);
        append(&path, &text[cut..]);
        seen.extend(reader.poll_delta().unwrap().lines);

        let expected: Vec<&str> = text.lines().collect();
        prop_assert_eq!(seen, expected);
        prop_assert!(reader.poll_delta().unwrap().lines.is_empty());
    }
}
