// Lovi - platform/fs.rs
//
// Filesystem helpers that differ between platforms: the on-disk identity of
// an open file (used for rotation detection) and expansion of command-line
// path arguments.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// Value that uniquely identifies a file on disk, independent of its path.
///
/// On Unix this is the device + inode pair. Elsewhere the creation time is
/// used, which changes when a log is rotated by rename-and-recreate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        let created = meta
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            dev: 0,
            ino: created,
        }
    }

    /// Identity of whatever file `path` currently names.
    pub fn of_path(path: &Path) -> io::Result<Self> {
        std::fs::metadata(path).map(|m| Self::from_metadata(&m))
    }
}

/// Expand command-line file arguments.
///
/// Arguments containing glob metacharacters are expanded (Windows shells do
/// not do this for us); a pattern that matches nothing is kept literally so
/// the open failure names it. Plain paths pass through untouched.
pub fn expand_paths<I, S>(args: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if !arg.contains(['*', '?', '[']) {
            out.push(PathBuf::from(arg));
            continue;
        }
        match glob::glob(arg) {
            Ok(paths) => {
                let before = out.len();
                for entry in paths {
                    match entry {
                        Ok(p) if p.is_file() => out.push(p),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(pattern = arg, error = %e, "Skipping unreadable glob match");
                        }
                    }
                }
                if out.len() == before {
                    out.push(PathBuf::from(arg));
                }
            }
            Err(e) => {
                tracing::warn!(pattern = arg, error = %e, "Invalid glob pattern; using it as a path");
                out.push(PathBuf::from(arg));
            }
        }
    }
    out
}

/// Base name of `path` for tab titles and change notices.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
