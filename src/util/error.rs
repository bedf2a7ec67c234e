// Lovi - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors carry the path they relate to so messages shown to the user
// always name the file involved.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Lovi operations.
#[derive(Debug)]
pub enum LoviError {
    /// Opening, polling, or addressing a monitored file failed.
    Monitor(MonitorError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LoviError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monitor(e) => write!(f, "Monitor error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LoviError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Monitor(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor errors
// ---------------------------------------------------------------------------

/// Errors raised while monitoring a file.
///
/// A path that is briefly missing during rotation is not an error: the poll
/// reports no change and the check is repeated on the next tick.
#[derive(Debug)]
pub enum MonitorError {
    /// The file could not be opened for reading. No session is created.
    Open { path: PathBuf, source: io::Error },

    /// An I/O failure occurred while polling an open file.
    Read { path: PathBuf, source: io::Error },

    /// The session handle does not refer to an open session.
    UnknownSession { id: u64 },

    /// The scheduler thread has exited and can no longer accept commands.
    SchedulerStopped,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => write!(
                f,
                "Cannot open file for monitoring: '{}': {source}",
                path.display()
            ),
            Self::Read { path, source } => {
                write!(f, "Read error on '{}': {source}", path.display())
            }
            Self::UnknownSession { id } => write!(f, "No open monitor session with id {id}"),
            Self::SchedulerStopped => write!(f, "The monitor scheduler is not running"),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<MonitorError> for LoviError {
    fn from(e: MonitorError) -> Self {
        Self::Monitor(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LoviError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for Lovi results.
pub type Result<T> = std::result::Result<T, LoviError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_open_error_names_the_file() {
        let err = MonitorError::Open {
            path: PathBuf::from("/var/log/missing.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/missing.log"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_monitor_error_wraps_into_top_level() {
        let err: LoviError = MonitorError::UnknownSession { id: 7 }.into();
        assert!(matches!(err, LoviError::Monitor(MonitorError::UnknownSession { id: 7 })));
        assert!(err.to_string().contains("7"));
    }
}
