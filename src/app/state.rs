// Lovi - app/state.rs
//
// GUI-facing application state: one tab per monitored file, each with its
// own bounded view buffer, the status bar message and its timeout, and the
// editable filter strings and the view font. Owned by the eframe::App implementation.
//
// Panels never talk to the scheduler directly. They set the `pending_*`
// request fields, which the App drains once per frame.

use crate::app::persist::{self, SessionData};
use crate::core::classify::FilterMarkers;
use crate::core::model::{RenderedLine, SessionId, ViewFont};
use crate::platform::fs::display_name;
use crate::util::constants::{
    APP_NAME, DEFAULT_OPEN_DIR, MAX_FONT_SIZE, MIN_FONT_SIZE, STATUS_TIMEOUT_SECS,
};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One monitored file as shown in the tab strip.
#[derive(Debug)]
pub struct MonitorTab {
    pub id: SessionId,
    pub path: PathBuf,
    pub name: String,
    /// Rendered lines currently in the view, oldest first.
    pub lines: VecDeque<RenderedLine>,
}

impl MonitorTab {
    /// Plain text of the view, one line per row.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

/// Message shown in the status bar until it times out.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    /// Show the bell marker (set for change notices).
    pub bell: bool,
    /// Wall-clock time the message was raised.
    pub at: DateTime<Local>,
    shown_at: Instant,
}

#[derive(Debug)]
pub struct AppState {
    pub tabs: Vec<MonitorTab>,

    /// Index into `tabs` of the tab being viewed.
    pub current: Option<usize>,

    /// View buffer capacity per tab.
    pub max_lines: usize,

    pub status: Option<StatusMessage>,
    pub status_timeout: Duration,

    /// Markers in effect; the filter inputs below are edited copies.
    pub markers: FilterMarkers,
    pub error_markers_input: String,
    pub warning_markers_input: String,

    pub show_filters: bool,
    pub show_font: bool,
    pub show_about: bool,

    /// Directory the open dialog starts in.
    pub last_dir: PathBuf,

    /// Log view font size in points, within the configurable range.
    pub font_size: f32,
    pub font: ViewFont,

    /// Stick the current view to its newest line.
    pub follow_tail: bool,

    pub debug_mode: bool,

    /// Where the file list is persisted. `None` disables persistence.
    pub session_path: Option<PathBuf>,

    /// Files a panel asked to open.
    pub pending_open: Vec<PathBuf>,
    /// Session a panel asked to close.
    pub pending_close: Option<SessionId>,
    /// Markers a panel asked to apply.
    pub pending_filters: Option<FilterMarkers>,
}

impl AppState {
    pub fn new(max_lines: usize, markers: FilterMarkers, font_size: f32, debug_mode: bool) -> Self {
        let error_markers_input = markers.errors().join(", ");
        let warning_markers_input = markers.warnings().join(", ");
        Self {
            tabs: Vec::new(),
            current: None,
            max_lines: max_lines.max(1),
            status: None,
            status_timeout: Duration::from_secs(STATUS_TIMEOUT_SECS),
            markers,
            error_markers_input,
            warning_markers_input,
            show_filters: false,
            show_font: false,
            show_about: false,
            last_dir: PathBuf::from(DEFAULT_OPEN_DIR),
            font_size: font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            font: ViewFont::default(),
            follow_tail: true,
            debug_mode,
            session_path: None,
            pending_open: Vec::new(),
            pending_close: None,
            pending_filters: None,
        }
    }

    // ---- Tabs ---------------------------------------------------------------

    /// Add a tab for a newly opened session and make it current.
    pub fn add_tab(&mut self, id: SessionId, path: PathBuf) {
        let name = display_name(&path);
        self.tabs.push(MonitorTab {
            id,
            path,
            name,
            lines: VecDeque::new(),
        });
        self.current = Some(self.tabs.len() - 1);
        self.follow_tail = true;
    }

    /// Remove the tab of a closed session. The current tab stays on the
    /// same file where possible, otherwise moves to a neighbour.
    pub fn remove_tab(&mut self, id: SessionId) -> Option<MonitorTab> {
        let idx = self.tabs.iter().position(|t| t.id == id)?;
        let tab = self.tabs.remove(idx);
        self.current = match self.current {
            _ if self.tabs.is_empty() => None,
            Some(cur) if cur > idx => Some(cur - 1),
            Some(cur) => Some(cur.min(self.tabs.len() - 1)),
            None => None,
        };
        Some(tab)
    }

    pub fn current_tab(&self) -> Option<&MonitorTab> {
        self.current.and_then(|i| self.tabs.get(i))
    }

    pub fn current_tab_mut(&mut self) -> Option<&mut MonitorTab> {
        self.current.and_then(|i| self.tabs.get_mut(i))
    }

    pub fn select_tab(&mut self, idx: usize) {
        if idx < self.tabs.len() {
            self.current = Some(idx);
        }
    }

    /// Append rendered lines to a tab, evicting the oldest beyond
    /// `max_lines`. Lines for unknown sessions are dropped.
    pub fn append_lines(&mut self, id: SessionId, lines: Vec<RenderedLine>) -> bool {
        let cap = self.max_lines;
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        for line in lines {
            if tab.lines.len() == cap {
                tab.lines.pop_front();
            }
            tab.lines.push_back(line);
        }
        true
    }

    /// Empty the current view. Monitoring continues.
    pub fn clear_current(&mut self) {
        if let Some(tab) = self.current_tab_mut() {
            tab.lines.clear();
        }
    }

    /// Plain text of the current view for the clipboard.
    pub fn current_text(&self) -> Option<String> {
        self.current_tab().map(MonitorTab::text)
    }

    /// Window title for the current tab.
    pub fn caption(&self) -> String {
        let name = self.current_tab().map_or("(none)", |t| t.name.as_str());
        format!("{APP_NAME} - {name}")
    }

    // ---- Status bar ---------------------------------------------------------

    pub fn set_status(&mut self, text: impl Into<String>, bell: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            bell,
            at: Local::now(),
            shown_at: Instant::now(),
        });
    }

    /// Announce a batch of changed files.
    pub fn notify_changes(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.set_status(format!("Change to {}", names.join(", ")), true);
    }

    /// Drop the status message once it has been shown long enough.
    /// Returns `true` if a message was removed.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        let expired = self
            .status
            .as_ref()
            .is_some_and(|s| now.saturating_duration_since(s.shown_at) >= self.status_timeout);
        if expired {
            self.status = None;
        }
        expired
    }

    /// Time left before the current status message expires.
    pub fn status_remaining(&self, now: Instant) -> Option<Duration> {
        self.status.as_ref().map(|s| {
            self.status_timeout
                .saturating_sub(now.saturating_duration_since(s.shown_at))
        })
    }

    // ---- Filters ------------------------------------------------------------

    /// Parse the edited marker strings into a new snapshot.
    pub fn edited_markers(&self) -> FilterMarkers {
        FilterMarkers::from_csv(&self.error_markers_input, &self.warning_markers_input)
    }

    /// Record markers that were applied and show them normalised.
    pub fn apply_markers(&mut self, markers: FilterMarkers) {
        self.error_markers_input = markers.errors().join(", ");
        self.warning_markers_input = markers.warnings().join(", ");
        self.markers = markers;
    }

    /// Restore the edit fields to the markers in effect.
    pub fn revert_marker_inputs(&mut self) {
        self.error_markers_input = self.markers.errors().join(", ");
        self.warning_markers_input = self.markers.warnings().join(", ");
    }

    // ---- Font ---------------------------------------------------------------

    /// Set the view font size, clamped to the configurable range. Non-finite
    /// sizes are ignored.
    pub fn set_font_size(&mut self, size: f32) {
        if size.is_finite() {
            self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
    }

    /// Apply the font saved by a previous run, where there is one.
    pub fn restore_font(&mut self, data: &SessionData) {
        if let Some(font) = data.font {
            self.font = font;
        }
        if let Some(size) = data.font_size {
            self.set_font_size(size);
        }
    }

    // ---- Persistence --------------------------------------------------------

    /// Remember the directory of a file picked in the open dialog.
    pub fn remember_dir(&mut self, file: &Path) {
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.last_dir = parent.to_path_buf();
        }
    }

    pub fn session_data(&self) -> SessionData {
        let mut data = SessionData::new(
            self.tabs.iter().map(|t| t.path.clone()).collect(),
            Some(self.last_dir.clone()),
        );
        data.font = Some(self.font);
        data.font_size = Some(self.font_size);
        data
    }

    /// Persist the file list. Failures are logged only.
    pub fn save_session(&self) {
        let Some(ref path) = self.session_path else {
            return;
        };
        if let Err(e) = persist::save(&self.session_data(), path) {
            tracing::warn!(error = %e, "Could not save file list");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LineClass;
    use tempfile::TempDir;

    fn state() -> AppState {
        AppState::new(3, FilterMarkers::default(), 14.0, false)
    }

    fn line(text: &str) -> RenderedLine {
        RenderedLine {
            text: text.to_string(),
            class: LineClass::Normal,
            markup: text.to_string(),
        }
    }

    #[test]
    fn test_caption_follows_current_tab() {
        let mut s = state();
        assert_eq!(s.caption(), "Lovi - (none)");
        s.add_tab(SessionId(1), PathBuf::from("/var/log/syslog"));
        s.add_tab(SessionId(2), PathBuf::from("/var/log/auth.log"));
        assert_eq!(s.caption(), "Lovi - auth.log");
        s.select_tab(0);
        assert_eq!(s.caption(), "Lovi - syslog");
    }

    #[test]
    fn test_remove_tab_keeps_selection_sensible() {
        let mut s = state();
        for i in 1..=3 {
            s.add_tab(SessionId(i), PathBuf::from(format!("/tmp/{i}.log")));
        }
        s.select_tab(2);
        s.remove_tab(SessionId(1)).unwrap();
        assert_eq!(s.current_tab().unwrap().id, SessionId(3));

        s.remove_tab(SessionId(3)).unwrap();
        assert_eq!(s.current_tab().unwrap().id, SessionId(2));

        s.remove_tab(SessionId(2)).unwrap();
        assert!(s.current.is_none());
        assert_eq!(s.caption(), "Lovi - (none)");
        assert!(s.remove_tab(SessionId(2)).is_none());
    }

    #[test]
    fn test_view_buffer_is_bounded() {
        let mut s = state();
        s.add_tab(SessionId(1), PathBuf::from("/tmp/a.log"));
        assert!(s.append_lines(SessionId(1), ["a", "b", "c", "d"].map(line).to_vec()));
        assert_eq!(s.current_text().unwrap(), "b\nc\nd\n");
        assert!(!s.append_lines(SessionId(9), vec![line("x")]));
    }

    #[test]
    fn test_clear_only_touches_current_tab() {
        let mut s = state();
        s.add_tab(SessionId(1), PathBuf::from("/tmp/a.log"));
        s.append_lines(SessionId(1), vec![line("a")]);
        s.add_tab(SessionId(2), PathBuf::from("/tmp/b.log"));
        s.append_lines(SessionId(2), vec![line("b")]);
        s.clear_current();
        assert!(s.tabs[1].lines.is_empty());
        assert_eq!(s.tabs[0].lines.len(), 1);
    }

    #[test]
    fn test_change_notice_rings_and_expires() {
        let mut s = state();
        s.notify_changes(&[]);
        assert!(s.status.is_none());

        s.notify_changes(&["a.log".to_string(), "b.log".to_string()]);
        let status = s.status.clone().unwrap();
        assert_eq!(status.text, "Change to a.log, b.log");
        assert!(status.bell);

        let now = Instant::now();
        assert!(!s.expire_status(now));
        assert!(s.expire_status(now + Duration::from_secs(STATUS_TIMEOUT_SECS)));
        assert!(s.status.is_none());
    }

    #[test]
    fn test_marker_edit_round_trip_normalises() {
        let mut s = state();
        s.error_markers_input = " Panic , ,oops,panic".to_string();
        s.warning_markers_input = "Slow".to_string();
        let markers = s.edited_markers();
        s.apply_markers(markers);
        assert_eq!(s.error_markers_input, "panic, oops");
        assert_eq!(s.warning_markers_input, "slow");

        s.error_markers_input = "typo".to_string();
        s.revert_marker_inputs();
        assert_eq!(s.error_markers_input, "panic, oops");
    }

    #[test]
    fn test_session_saved_with_tab_order_and_last_dir() {
        let dir = TempDir::new().unwrap();
        let mut s = state();
        s.session_path = Some(persist::session_path(dir.path()));
        s.add_tab(SessionId(1), PathBuf::from("/srv/app/a.log"));
        s.add_tab(SessionId(2), PathBuf::from("/srv/app/b.log"));
        s.remember_dir(Path::new("/srv/app/b.log"));
        s.save_session();

        let data = persist::load(s.session_path.as_deref().unwrap()).unwrap();
        assert_eq!(
            data.files,
            [PathBuf::from("/srv/app/a.log"), PathBuf::from("/srv/app/b.log")]
        );
        assert_eq!(data.last_dir, Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn test_font_size_is_clamped() {
        let mut s = state();
        s.set_font_size(100.0);
        assert_eq!(s.font_size, MAX_FONT_SIZE);
        s.set_font_size(1.0);
        assert_eq!(s.font_size, MIN_FONT_SIZE);
        s.set_font_size(f32::NAN);
        assert_eq!(s.font_size, MIN_FONT_SIZE);
        s.set_font_size(18.0);
        assert_eq!(s.font_size, 18.0);
    }

    #[test]
    fn test_font_choice_survives_a_restart() {
        let dir = TempDir::new().unwrap();
        let mut s = state();
        s.session_path = Some(persist::session_path(dir.path()));
        s.font = ViewFont::Proportional;
        s.set_font_size(20.0);
        s.save_session();

        let data = persist::load(s.session_path.as_deref().unwrap()).unwrap();
        let mut restored = state();
        restored.restore_font(&data);
        assert_eq!(restored.font, ViewFont::Proportional);
        assert_eq!(restored.font_size, 20.0);
    }
}
