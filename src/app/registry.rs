// Lovi - app/registry.rs
//
// MonitorRegistry: the set of open monitor sessions behind opaque handles.
// This is the surface the view layer talks to (directly in tests and
// headless use, or through the scheduler thread in the GUI):
//
//   open(path)              -> SessionId | OpenError
//   tick(id) / tick_all()   advance sessions
//   new_rendered_lines(id)  lines produced since last retrieval
//   consume_changed(id)     read-and-clear changed flag
//   collect_changes()       names of all changed files, rebuilt each call
//   close(id)
//   set_filters(markers)    applies to later classifications only
//   file_name(id)
//
// Sessions never share mutable state; the only shared value is the
// immutable marker snapshot.

use crate::app::monitor::MonitorSession;
use crate::core::classify::FilterMarkers;
use crate::core::model::{RenderedLine, SessionId};
use crate::platform::config::MonitorSettings;
use crate::util::error::MonitorError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct MonitorRegistry {
    sessions: BTreeMap<SessionId, MonitorSession>,
    next_id: u64,
    markers: Arc<FilterMarkers>,
    settings: MonitorSettings,
}

impl MonitorRegistry {
    pub fn new(settings: MonitorSettings, markers: FilterMarkers) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            markers: Arc::new(markers),
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn markers(&self) -> &FilterMarkers {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Handles of all open sessions in opening order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Start monitoring `path`. On failure no session is created.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<SessionId, MonitorError> {
        let path = path.into();
        let id = SessionId(self.next_id);
        let session = MonitorSession::open(id, &path, Arc::clone(&self.markers), &self.settings)
            .map_err(|e| {
                tracing::warn!(error = %e, "Monitor: open failed");
                e
            })?;
        self.next_id += 1;
        self.sessions.insert(id, session);
        tracing::info!(session = %id, file = %path.display(), "Monitor: opened");
        Ok(id)
    }

    pub fn session(&self, id: SessionId) -> Result<&MonitorSession, MonitorError> {
        self.sessions
            .get(&id)
            .ok_or(MonitorError::UnknownSession { id: id.0 })
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut MonitorSession, MonitorError> {
        self.sessions
            .get_mut(&id)
            .ok_or(MonitorError::UnknownSession { id: id.0 })
    }

    /// Advance one session. Returns the number of new lines.
    pub fn tick(&mut self, id: SessionId) -> Result<usize, MonitorError> {
        self.session_mut(id)?.tick()
    }

    /// Advance every session in turn. A failing session does not stop the
    /// others; its error is returned alongside its handle.
    pub fn tick_all(&mut self) -> Vec<(SessionId, MonitorError)> {
        let mut failures = Vec::new();
        for (id, session) in &mut self.sessions {
            if let Err(e) = session.tick() {
                failures.push((*id, e));
            }
        }
        failures
    }

    pub fn new_rendered_lines(&mut self, id: SessionId) -> Result<Vec<RenderedLine>, MonitorError> {
        Ok(self.session_mut(id)?.take_new_lines())
    }

    pub fn consume_changed(&mut self, id: SessionId) -> Result<bool, MonitorError> {
        Ok(self.session_mut(id)?.consume_changed())
    }

    /// Consume every session's changed flag and return the base names of the
    /// files that had changed, in opening order.
    pub fn collect_changes(&mut self) -> Vec<String> {
        self.sessions
            .values_mut()
            .filter_map(|s| s.consume_changed().then(|| s.file_name()))
            .collect()
    }

    pub fn file_name(&self, id: SessionId) -> Result<String, MonitorError> {
        Ok(self.session(id)?.file_name())
    }

    pub fn path(&self, id: SessionId) -> Result<&Path, MonitorError> {
        Ok(self.session(id)?.path())
    }

    /// Forget the rendered history of one session.
    pub fn clear(&mut self, id: SessionId) -> Result<(), MonitorError> {
        self.session_mut(id)?.clear();
        Ok(())
    }

    /// Close a session and release its file handle.
    pub fn close(&mut self, id: SessionId) -> Result<(), MonitorError> {
        let mut session = self
            .sessions
            .remove(&id)
            .ok_or(MonitorError::UnknownSession { id: id.0 })?;
        session.close();
        Ok(())
    }

    /// Replace the marker snapshot for every session.
    pub fn set_filters(&mut self, markers: FilterMarkers) {
        tracing::info!(
            errors = ?markers.errors(),
            warnings = ?markers.warnings(),
            "Monitor: filters updated"
        );
        self.markers = Arc::new(markers);
        for session in self.sessions.values_mut() {
            session.set_markers(Arc::clone(&self.markers));
        }
    }

    /// Close every session.
    pub fn close_all(&mut self) {
        for (_, mut session) in std::mem::take(&mut self.sessions) {
            session.close();
        }
    }
}
