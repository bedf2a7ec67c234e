// Lovi - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::classify::FilterMarkers;
use crate::core::model::ViewFont;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for Lovi data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/lovi/ or %APPDATA%\lovi\config\)
    pub config_dir: PathBuf,

    /// Data directory for the persisted session.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[monitor]` section.
    pub monitor: MonitorSection,
    /// `[filters]` section.
    pub filters: FiltersSection,
    /// `[ui]` section.
    pub ui: UiSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[monitor]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    pub poll_interval_ms: Option<u64>,
    pub change_check_interval_ms: Option<u64>,
    pub backlog_lines: Option<usize>,
    /// Ring-buffer capacity per session.
    pub max_lines: Option<usize>,
    /// Per-poll line cap.
    pub batch_lines: Option<usize>,
}

/// `[filters]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FiltersSection {
    pub errors: Option<Vec<String>>,
    pub warnings: Option<Vec<String>>,
}

/// `[ui]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Log view font size in points.
    pub font_size: Option<f32>,
    /// Log view font family: "fixed" or "proportional".
    pub font: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Tail-engine settings shared by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Lines recovered from the end of a file when monitoring begins.
    pub backlog_lines: usize,
    /// Capacity of each session's rendered-line ring buffer.
    pub max_lines: usize,
    /// Maximum complete lines consumed per poll.
    pub batch_lines: usize,
    pub poll_interval: Duration,
    pub change_check_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            backlog_lines: constants::DEFAULT_BACKLOG_LINES,
            max_lines: constants::DEFAULT_MAX_RENDERED_LINES,
            batch_lines: constants::DEFAULT_MAX_LINES_PER_POLL,
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
            change_check_interval: Duration::from_millis(
                constants::DEFAULT_CHANGE_CHECK_INTERVAL_MS,
            ),
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub monitor: MonitorSettings,
    pub markers: FilterMarkers,
    pub font_size: f32,
    pub font: ViewFont,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings::default(),
            markers: FilterMarkers::default(),
            font_size: constants::DEFAULT_FONT_SIZE,
            font: ViewFont::default(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Record an out-of-range value as a warning and report whether it was valid.
fn check_range<T>(
    warnings: &mut Vec<String>,
    field: &str,
    value: T,
    range: std::ops::RangeInclusive<T>,
    default: T,
) -> bool
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if range.contains(&value) {
        return true;
    }
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: format!("{}-{}", range.start(), range.end()),
    };
    warnings.push(format!("{err}. Using default ({default})."));
    false
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unparseable, returns defaults with a warning; the
/// application still starts but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let (config, mut more) = parse_config(&content, config_path);
    warnings.append(&mut more);
    (config, warnings)
}

/// Parse and validate config.toml content. `origin` is only used in messages.
pub fn parse_config(content: &str, origin: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            let err = ConfigError::TomlParse {
                path: origin.to_path_buf(),
                source: e,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %origin.display(), "Loaded config.toml");

    let mut config = AppConfig::default();
    let defaults = MonitorSettings::default();

    // -- Monitor --
    if let Some(ms) = raw.monitor.poll_interval_ms {
        if check_range(
            &mut warnings,
            "[monitor] poll_interval_ms",
            ms,
            constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS,
            constants::DEFAULT_POLL_INTERVAL_MS,
        ) {
            config.monitor.poll_interval = Duration::from_millis(ms);
        }
    }
    if let Some(ms) = raw.monitor.change_check_interval_ms {
        if check_range(
            &mut warnings,
            "[monitor] change_check_interval_ms",
            ms,
            constants::MIN_CHANGE_CHECK_INTERVAL_MS..=constants::MAX_CHANGE_CHECK_INTERVAL_MS,
            constants::DEFAULT_CHANGE_CHECK_INTERVAL_MS,
        ) {
            config.monitor.change_check_interval = Duration::from_millis(ms);
        }
    }
    if let Some(n) = raw.monitor.backlog_lines {
        if check_range(
            &mut warnings,
            "[monitor] backlog_lines",
            n,
            constants::MIN_BACKLOG_LINES..=constants::MAX_BACKLOG_LINES,
            defaults.backlog_lines,
        ) {
            config.monitor.backlog_lines = n;
        }
    }
    if let Some(n) = raw.monitor.max_lines {
        if check_range(
            &mut warnings,
            "[monitor] max_lines",
            n,
            constants::MIN_MAX_RENDERED_LINES..=constants::ABSOLUTE_MAX_RENDERED_LINES,
            defaults.max_lines,
        ) {
            config.monitor.max_lines = n;
        }
    }
    if let Some(n) = raw.monitor.batch_lines {
        if check_range(
            &mut warnings,
            "[monitor] batch_lines",
            n,
            constants::MIN_MAX_LINES_PER_POLL..=constants::ABSOLUTE_MAX_LINES_PER_POLL,
            defaults.batch_lines,
        ) {
            config.monitor.batch_lines = n;
        }
    }

    // -- Filters --
    // A missing list keeps its default; an explicitly empty list disables it.
    if raw.filters.errors.is_some() || raw.filters.warnings.is_some() {
        let defaults = FilterMarkers::default();
        let errors = raw
            .filters
            .errors
            .unwrap_or_else(|| defaults.errors().to_vec());
        let warns = raw
            .filters
            .warnings
            .unwrap_or_else(|| defaults.warnings().to_vec());
        config.markers = FilterMarkers::new(errors, warns);
    }

    // -- UI: font_size --
    if let Some(size) = raw.ui.font_size {
        if check_range(
            &mut warnings,
            "[ui] font_size",
            size,
            constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE,
            constants::DEFAULT_FONT_SIZE,
        ) {
            config.font_size = size;
        }
    }

    // -- UI: font --
    if let Some(ref name) = raw.ui.font {
        match ViewFont::from_name(name) {
            Some(font) => config.font = font,
            None => warnings.push(format!(
                "[ui] font = \"{name}\" is not recognised. \
                 Valid values: fixed, proportional. Using default (fixed).",
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(PathBuf::from(file));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}
