// Lovi - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Line classification
// =============================================================================

/// Classification of a single log line, decided by marker substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LineClass {
    #[default]
    Normal,
    Warning,
    Error,
}

impl LineClass {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            LineClass::Normal => "Normal",
            LineClass::Warning => "Warning",
            LineClass::Error => "Error",
        }
    }
}

impl fmt::Display for LineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A line read from a monitored file together with its classification and
/// its escaped, colour-wrapped markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Line content as read, without the line terminator.
    pub text: String,

    /// Classification at the time the line was read. Never re-evaluated when
    /// the filter markers change afterwards.
    pub class: LineClass,

    /// Markup-safe display form (see `core::classify::render`).
    ///
    /// The egui view colours `text` by `class` itself and never draws this;
    /// it is kept for markup-aware consumers of the registry.
    pub markup: String,
}

// =============================================================================
// View font
// =============================================================================

/// Font family of the log view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewFont {
    /// Fixed-width font, so columns in the log line up.
    #[default]
    Fixed,
    /// The UI's regular proportional font.
    Proportional,
}

impl ViewFont {
    pub fn label(&self) -> &'static str {
        match self {
            ViewFont::Fixed => "Fixed width",
            ViewFont::Proportional => "Proportional",
        }
    }

    /// Parse a config value (`"fixed"` or `"proportional"`, any case).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fixed" | "monospace" => Some(ViewFont::Fixed),
            "proportional" | "default" => Some(ViewFont::Proportional),
            _ => None,
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Opaque handle identifying one monitor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a monitor session.
///
/// `Rotated` is transient: it is entered and left within a single tick when
/// the reader notices that the file behind the path has been replaced or
/// truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; the backlog has not been produced yet.
    Idle,
    /// Backlog produced; steady-state polling.
    Active,
    /// Rotation detected during the current tick.
    Rotated,
    /// Terminal. The file handle has been released.
    Closed,
}

/// How a monitored file was found to have rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// The path now refers to a different file on disk.
    Replaced,
    /// Same file, cut back in place (copytruncate), possibly regrown since.
    Truncated,
}

// =============================================================================
// Scheduler progress messages
// =============================================================================

/// Messages sent from the scheduler thread to the UI thread.
#[derive(Debug)]
pub enum MonitorProgress {
    /// The scheduler thread is running.
    Started,

    /// New rendered lines for one session, oldest first.
    Lines {
        id: SessionId,
        lines: Vec<RenderedLine>,
    },

    /// A poll failed. Sent once per failure streak.
    ReadFailed {
        id: SessionId,
        path: PathBuf,
        message: String,
    },

    /// Base names of the files that received new lines since the previous
    /// change check. Never empty.
    Changed { names: Vec<String> },

    /// A session was closed and its handle released.
    Closed { id: SessionId },

    /// The scheduler thread has exited.
    Stopped,
}
