// Lovi - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Every bound that protects memory or responsiveness is named here.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Lovi";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "lovi";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Backlog recovery
// =============================================================================

/// Number of recent lines recovered when monitoring of a file begins.
pub const DEFAULT_BACKLOG_LINES: usize = 400;

/// Minimum user-configurable backlog size.
pub const MIN_BACKLOG_LINES: usize = 1;

/// Maximum user-configurable backlog size.
pub const MAX_BACKLOG_LINES: usize = 100_000;

/// Initial estimate of the average line length used to decide how far back
/// from the end of the file the backlog read starts.
pub const BACKLOG_SEED_BYTES_PER_LINE: f64 = 75.0;

/// Multiplier applied to the bytes-per-line estimate each time a backlog
/// read did not yield enough lines.
pub const BACKLOG_GROWTH_FACTOR: f64 = 1.3;

// =============================================================================
// Incremental polling
// =============================================================================

/// Maximum number of complete lines consumed from one file in a single poll.
/// Keeps one burst of appended content from starving the other monitored
/// files that share the same tick.
pub const DEFAULT_MAX_LINES_PER_POLL: usize = 500;

/// Minimum user-configurable per-poll line cap.
pub const MIN_MAX_LINES_PER_POLL: usize = 1;

/// Maximum user-configurable per-poll line cap.
pub const ABSOLUTE_MAX_LINES_PER_POLL: usize = 100_000;

/// How often every monitored file is polled for new content (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Minimum user-configurable poll interval (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Maximum user-configurable poll interval (ms).
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

/// How often the changed flags of all sessions are aggregated into a single
/// notification batch (ms).
pub const DEFAULT_CHANGE_CHECK_INTERVAL_MS: u64 = 3_000;

/// Minimum user-configurable change-check interval (ms).
pub const MIN_CHANGE_CHECK_INTERVAL_MS: u64 = 500;

/// Maximum user-configurable change-check interval (ms).
pub const MAX_CHANGE_CHECK_INTERVAL_MS: u64 = 60_000; // 60 s

/// How often the scheduler thread wakes to drain commands and check the
/// cancel flag within one poll interval (ms).
pub const SCHEDULER_SLICE_MS: u64 = 50;

// =============================================================================
// Rendered history
// =============================================================================

/// Default capacity of a session's rendered-line ring buffer.
pub const DEFAULT_MAX_RENDERED_LINES: usize = 5_000;

/// Minimum user-configurable ring capacity.
pub const MIN_MAX_RENDERED_LINES: usize = 100;

/// Maximum user-configurable ring capacity.
pub const ABSOLUTE_MAX_RENDERED_LINES: usize = 1_000_000;

// =============================================================================
// Classification
// =============================================================================

/// Substrings marking a line as an error (case-insensitive).
pub const DEFAULT_ERROR_MARKERS: &[&str] = &["error", "fail", "badness"];

/// Substrings marking a line as a warning (case-insensitive).
pub const DEFAULT_WARNING_MARKERS: &[&str] = &["warning", "cannot", "can't", "unable"];

/// Markup colour wrapped around error lines.
pub const ERROR_MARKUP_COLOUR: &str = "red";

/// Markup colour wrapped around warning lines.
pub const WARNING_MARKUP_COLOUR: &str = "blue";

// =============================================================================
// UI defaults
// =============================================================================

/// How long a status-bar message stays visible (seconds).
pub const STATUS_TIMEOUT_SECS: u64 = 10;

/// Directory the open dialog starts in before the user has picked a file.
pub const DEFAULT_OPEN_DIR: &str = "/var/log";

/// Default monospace font size for the log view (points).
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Minimum user-configurable font size (points).
pub const MIN_FONT_SIZE: f32 = 8.0;

/// Maximum user-configurable font size (points).
pub const MAX_FONT_SIZE: f32 = 32.0;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Session persistence file name (stored in the platform data directory).
pub const SESSION_FILE_NAME: &str = "session.json";
