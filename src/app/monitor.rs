// Lovi - app/monitor.rs
//
// MonitorSession: one monitored file. Polls its TailReader on every tick,
// classifies and renders each new line, and keeps the most recent lines in
// a fixed-capacity ring buffer.
//
// State machine:
//   Idle --first tick--> Active --(rotation seen)--> Rotated --> Active
//   any --close()--> Closed (terminal, handle released)
//
// Rendered lines are also queued for the UI until retrieved with
// `take_new_lines`. That queue is bounded by the same capacity as the ring,
// so a view that stops retrieving never makes a session grow without bound.

use crate::app::tail::TailReader;
use crate::core::classify::{render_line, FilterMarkers};
use crate::core::model::{RenderedLine, SessionId, SessionState};
use crate::platform::config::MonitorSettings;
use crate::platform::fs::display_name;
use crate::util::error::MonitorError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct MonitorSession {
    id: SessionId,
    path: PathBuf,
    /// `None` once the session is closed.
    reader: Option<TailReader>,
    state: SessionState,
    markers: Arc<FilterMarkers>,
    rendered: VecDeque<RenderedLine>,
    unread: VecDeque<RenderedLine>,
    capacity: usize,
    changed: bool,
    rotations: u64,
}

impl MonitorSession {
    /// Wrap an already opened reader.
    pub fn new(
        id: SessionId,
        reader: TailReader,
        markers: Arc<FilterMarkers>,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            path: reader.path().to_path_buf(),
            reader: Some(reader),
            state: SessionState::Idle,
            markers,
            rendered: VecDeque::with_capacity(capacity.min(1024)),
            unread: VecDeque::new(),
            capacity,
            changed: false,
            rotations: 0,
        }
    }

    /// Open `path` and create a session using `settings`.
    pub fn open(
        id: SessionId,
        path: impl Into<PathBuf>,
        markers: Arc<FilterMarkers>,
        settings: &MonitorSettings,
    ) -> Result<Self, MonitorError> {
        let reader =
            TailReader::open(path)?.with_limits(settings.backlog_lines, settings.batch_lines);
        Ok(Self::new(id, reader, markers, settings.max_lines))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the monitored file.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of rotations observed since the session was opened.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Whether new lines arrived and have not yet been acknowledged through
    /// `consume_changed`, as of the last tick.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Most recent rendered lines, oldest first.
    pub fn rendered_lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.rendered.iter()
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Replace the marker snapshot. Applies to lines read from now on only.
    pub fn set_markers(&mut self, markers: Arc<FilterMarkers>) {
        self.markers = markers;
    }

    /// Advance one poll cycle. Returns the number of new lines rendered.
    ///
    /// Ticking a closed session is a no-op.
    pub fn tick(&mut self) -> Result<usize, MonitorError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };

        let delta = reader.poll_delta()?;

        if let Some(kind) = delta.rotation {
            self.state = SessionState::Rotated;
            self.rotations += 1;
            tracing::info!(
                session = %self.id,
                file = %self.path.display(),
                ?kind,
                rotations = self.rotations,
                "Monitor: rotation detected"
            );
        }
        self.state = SessionState::Active;

        let count = delta.lines.len();
        for text in delta.lines {
            let line = render_line(text, &self.markers);
            push_bounded(&mut self.unread, line.clone(), self.capacity);
            push_bounded(&mut self.rendered, line, self.capacity);
        }
        self.changed = reader.is_dirty();

        if count > 0 {
            tracing::trace!(session = %self.id, count, "Monitor: new lines");
        }
        Ok(count)
    }

    /// Rendered lines produced since the previous call, oldest first.
    pub fn take_new_lines(&mut self) -> Vec<RenderedLine> {
        self.unread.drain(..).collect()
    }

    /// Read-and-clear the changed flag of the underlying reader.
    pub fn consume_changed(&mut self) -> bool {
        self.changed = false;
        self.reader
            .as_mut()
            .is_some_and(|r| r.is_changed_since_last_check())
    }

    /// Forget the rendered history. The file position is unaffected.
    pub fn clear(&mut self) {
        self.rendered.clear();
        self.unread.clear();
    }

    /// Transition to `Closed` and release the file handle.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.reader = None;
        self.state = SessionState::Closed;
        self.changed = false;
        tracing::info!(session = %self.id, file = %self.path.display(), "Monitor: closed");
    }
}

fn push_bounded(buf: &mut VecDeque<RenderedLine>, line: RenderedLine, capacity: usize) {
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LineClass;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &Path, content: &str) {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn session(path: &Path, capacity: usize) -> MonitorSession {
        let settings = MonitorSettings {
            max_lines: capacity,
            ..MonitorSettings::default()
        };
        MonitorSession::open(
            SessionId(1),
            path,
            Arc::new(FilterMarkers::default()),
            &settings,
        )
        .unwrap()
    }

    #[test]
    fn test_lifecycle_states() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "start\n").unwrap();
        let mut s = session(&path, 100);
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.tick().unwrap(), 1);
        assert_eq!(s.state(), SessionState::Active);
        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        append(&path, "more\n");
        assert_eq!(s.tick().unwrap(), 0);
        assert!(!s.consume_changed());
    }

    #[test]
    fn test_lines_are_classified_and_rendered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "start\nan error occurred\n<b>unable</b>\n").unwrap();
        let mut s = session(&path, 100);
        s.tick().unwrap();
        let lines = s.take_new_lines();
        let classes: Vec<_> = lines.iter().map(|l| l.class).collect();
        assert_eq!(
            classes,
            [LineClass::Normal, LineClass::Error, LineClass::Warning]
        );
        assert_eq!(
            lines[2].markup,
            "<font color=\"blue\">&lt;b&gt;unable&lt;/b&gt;</font>"
        );
        assert!(s.take_new_lines().is_empty());
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "").unwrap();
        let mut s = session(&path, 3);
        s.tick().unwrap();
        append(&path, "1\n2\n3\n4\n5\n");
        s.tick().unwrap();
        let texts: Vec<_> = s.rendered_lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["3", "4", "5"]);
        assert_eq!(s.take_new_lines().len(), 3);
    }

    #[test]
    fn test_changed_mirrors_reader_and_clears_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "").unwrap();
        let mut s = session(&path, 10);
        s.tick().unwrap();
        assert!(!s.changed());

        append(&path, "x\n");
        s.tick().unwrap();
        assert!(s.changed());
        assert!(s.consume_changed());
        assert!(!s.changed());
        assert!(!s.consume_changed());
    }

    #[test]
    fn test_new_markers_do_not_rerender_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "kernel panic\n").unwrap();
        let mut s = session(&path, 10);
        s.tick().unwrap();
        s.set_markers(Arc::new(FilterMarkers::new(["panic"], [""; 0])));
        append(&path, "another panic\n");
        s.tick().unwrap();
        let classes: Vec<_> = s.rendered_lines().map(|l| l.class).collect();
        assert_eq!(classes, [LineClass::Normal, LineClass::Error]);
    }

    #[test]
    fn test_clear_keeps_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "a\nb\n").unwrap();
        let mut s = session(&path, 10);
        s.tick().unwrap();
        s.clear();
        assert!(s.is_empty());
        assert!(s.take_new_lines().is_empty());
        append(&path, "c\n");
        s.tick().unwrap();
        assert_eq!(s.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_rotation_is_counted_and_session_stays_active() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "old\n").unwrap();
        let mut s = session(&path, 10);
        s.tick().unwrap();
        std::fs::rename(&path, dir.path().join("a.log.1")).unwrap();
        std::fs::write(&path, "fresh\n").unwrap();

        assert_eq!(s.tick().unwrap(), 0);
        assert_eq!(s.rotations(), 1);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.tick().unwrap(), 1);
        let texts: Vec<_> = s.rendered_lines().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["old", "fresh"]);
    }
}
