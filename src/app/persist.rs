// Lovi - app/persist.rs
//
// Remembers the monitored file list, the last directory used in the open
// dialog and the view font between runs.
//
// - Saved atomically (write temp, then rename) so an interrupted save keeps
//   the previous file intact.
// - Any load problem means "start with no files"; it is logged, never shown.
// - Only paths are stored. Each file is re-tailed from its backlog on start.

use crate::core::model::ViewFont;
use crate::util::constants::SESSION_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bump when `SessionData` changes incompatibly. Mismatches are discarded.
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub version: u32,

    /// Files being monitored when the app last exited, in tab order.
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Directory the open dialog last showed.
    #[serde(default)]
    pub last_dir: Option<PathBuf>,

    /// Font chosen in the font window. `None` falls back to `[ui]` config.
    #[serde(default)]
    pub font: Option<ViewFont>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

impl SessionData {
    pub fn new(files: Vec<PathBuf>, last_dir: Option<PathBuf>) -> Self {
        Self {
            version: SESSION_VERSION,
            files,
            last_dir,
            font: None,
            font_size: None,
        }
    }
}

/// Location of the session file inside the platform data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Write `data` to `path`, creating parent directories as needed.
///
/// The error string is meant for a `tracing::warn!`; callers normally log
/// it and carry on.
pub fn save(data: &SessionData, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "cannot create session directory '{}': {e}",
                parent.display()
            )
        })?;
    }

    let json = serde_json::to_string_pretty(data)
        .map_err(|e| format!("failed to serialise file list: {e}"))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())
        .map_err(|e| format!("failed to write '{}': {e}", tmp.display()))?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to replace '{}': {e}", path.display())
    })?;

    tracing::debug!(path = %path.display(), files = data.files.len(), "File list saved");
    Ok(())
}

/// Read the saved file list. `None` when missing, malformed or from another
/// version.
pub fn load(path: &Path) -> Option<SessionData> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read session file");
            }
        })
        .ok()?;

    let data: SessionData = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Session file is malformed, ignoring it");
        })
        .ok()?;

    if data.version != SESSION_VERSION {
        tracing::warn!(
            found = data.version,
            expected = SESSION_VERSION,
            "Session file version mismatch, ignoring it"
        );
        return None;
    }

    tracing::info!(path = %path.display(), files = data.files.len(), "File list restored");
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SessionData {
        SessionData::new(
            vec![
                PathBuf::from("/var/log/syslog"),
                PathBuf::from("/var/log/auth.log"),
            ],
            Some(PathBuf::from("/var/log")),
        )
    }

    #[test]
    fn test_saved_list_is_restored_in_order() {
        let dir = TempDir::new().unwrap();
        let path = session_path(dir.path());
        save(&sample(), &path).unwrap();
        assert_eq!(load(&path), Some(sample()));
    }

    #[test]
    fn test_missing_file_means_fresh_start() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("nope.json")).is_none());
    }

    #[test]
    fn test_garbage_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = session_path(dir.path());
        std::fs::write(&path, "{ files: oops").unwrap();
        assert!(load(&path).is_none());
    }

    #[test]
    fn test_other_version_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = session_path(dir.path());
        let mut data = sample();
        data.version = SESSION_VERSION + 1;
        save(&data, &path).unwrap();
        assert!(load(&path).is_none());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let dir = TempDir::new().unwrap();
        let path = session_path(dir.path());
        std::fs::write(&path, format!("{{\"version\": {SESSION_VERSION}}}")).unwrap();
        let data = load(&path).unwrap();
        assert!(data.files.is_empty());
        assert!(data.last_dir.is_none());
        assert!(data.font.is_none());
        assert!(data.font_size.is_none());
    }

    #[test]
    fn test_save_creates_directories_and_replaces_stale_temp() {
        let dir = TempDir::new().unwrap();
        let path = session_path(&dir.path().join("nested").join("lovi"));
        save(&sample(), &path).unwrap();
        std::fs::write(path.with_extension("json.tmp"), "junk").unwrap();

        let updated = SessionData::new(vec![PathBuf::from("/tmp/x.log")], None);
        save(&updated, &path).unwrap();
        assert_eq!(load(&path), Some(updated));
    }
}
