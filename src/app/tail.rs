// Lovi - app/tail.rs
//
// TailReader: follows one growing text file.
//
// Architecture:
//   - One exclusively owned read handle plus a byte cursor that always sits
//     on a line boundary. Only newline-terminated lines are ever reported;
//     an incomplete trailing line is left unread and picked up on a later
//     poll once its newline arrives.
//   - The first poll produces a bounded backlog of the most recent lines
//     without reading the whole file: it seeks back from the end by an
//     estimated number of bytes and widens the estimate until enough lines
//     have been read or the start of the file is reached.
//   - Later polls read forward from the cursor, at most `batch_lines` lines
//     per call, so a huge burst in one file cannot stall the others sharing
//     the same tick.
//   - Rotation: once the available complete lines are exhausted the identity
//     of the file now at `path` is compared with the identity of the open
//     handle. A different identity means the file was replaced: the path is
//     reopened and the cursor reset to 0, and the new content is read from
//     its beginning on the next poll. Unread bytes at the end of the old file
//     are dropped. A path that is momentarily missing is not a rotation.
//   - A file truncated in place keeps its identity. Before reading forward
//     each poll checks that the byte just before the cursor is still a
//     newline; if the file is shorter than the cursor or that byte changed,
//     the cursor is reset to 0 and the file re-read from its beginning.
//
// Encoding: lines are decoded as lossy UTF-8.

use crate::core::model::Rotation;
use crate::platform::fs::{display_name, FileIdentity};
use crate::util::constants::{
    BACKLOG_GROWTH_FACTOR, BACKLOG_SEED_BYTES_PER_LINE, DEFAULT_BACKLOG_LINES,
    DEFAULT_MAX_LINES_PER_POLL,
};
use crate::util::error::MonitorError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Result of one incremental poll.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TailDelta {
    /// Complete lines read during this poll, oldest first, with the line
    /// terminator (`\n` or `\r\n`) removed.
    pub lines: Vec<String>,

    /// Set when this poll detected that the file was rotated. The cursor has
    /// already been reset; the new content arrives with the next poll.
    pub rotation: Option<Rotation>,
}

/// Follows one file by path. See the module documentation.
#[derive(Debug)]
pub struct TailReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Offset of the first byte not yet consumed. Always on a line boundary.
    cursor: u64,
    identity: FileIdentity,
    started: bool,
    dirty: bool,
    backlog_lines: usize,
    batch_lines: usize,
}

impl TailReader {
    /// Open `path` for reading, positioned at the start of the file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let (reader, identity) = open_handle(&path).map_err(|source| MonitorError::Open {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(file = %path.display(), ?identity, "Tail: opened");
        Ok(Self {
            path,
            reader,
            cursor: 0,
            identity,
            started: false,
            dirty: false,
            backlog_lines: DEFAULT_BACKLOG_LINES,
            batch_lines: DEFAULT_MAX_LINES_PER_POLL,
        })
    }

    /// Override the backlog size used by the bootstrapping poll and the
    /// per-poll line cap. Both are clamped to at least 1.
    pub fn with_limits(mut self, backlog_lines: usize, batch_lines: usize) -> Self {
        self.backlog_lines = backlog_lines.max(1);
        self.batch_lines = batch_lines.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the monitored file.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    /// Byte offset of the next unread line.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn identity(&self) -> FileIdentity {
        self.identity
    }

    /// Whether the backlog has been produced.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Current value of the changed flag, without clearing it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return up to `max_lines` of the most recent complete lines, oldest
    /// first, and position the cursor just past the last of them.
    ///
    /// A trailing line without a newline is not returned; it stays unread so
    /// the next poll reports it once complete.
    pub fn initial_backlog(&mut self, max_lines: usize) -> Result<Vec<String>, MonitorError> {
        // At least one line is located even for a zero-line backlog so the
        // cursor still ends up on the last line boundary.
        let want = max_lines.max(1);
        let mut bytes_per_line = BACKLOG_SEED_BYTES_PER_LINE;
        let mut attempts = 0u32;

        let (start, buf) = loop {
            attempts += 1;
            let end = self
                .reader
                .seek(SeekFrom::End(0))
                .map_err(|e| self.read_error(e))?;
            // Float-to-int casts saturate, so a runaway estimate just means
            // "from the start of the file".
            let span = (bytes_per_line * want as f64) as u64;
            let start = end.saturating_sub(span);
            self.reader
                .seek(SeekFrom::Start(start))
                .map_err(|e| self.read_error(e))?;
            let mut buf = Vec::with_capacity((end - start) as usize);
            self.reader
                .read_to_end(&mut buf)
                .map_err(|e| self.read_error(e))?;

            let newlines = buf.iter().filter(|&&b| b == b'\n').count();
            // The first segment may be the tail of a line cut by the seek, so
            // one more newline than requested is needed.
            if newlines > want || start == 0 {
                break (start, buf);
            }
            bytes_per_line *= BACKLOG_GROWTH_FACTOR;
        };

        let consumed = buf
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);

        let mut segments: Vec<&[u8]> = buf[..consumed].split(|&b| b == b'\n').collect();
        // `split` yields an empty segment after the final newline.
        segments.pop();
        let skip_partial_head = usize::from(start > 0 && !segments.is_empty());
        let complete = &segments[skip_partial_head..];
        let keep_from = complete.len().saturating_sub(max_lines);
        let lines: Vec<String> = complete[keep_from..]
            .iter()
            .map(|seg| decode_line(seg))
            .collect();

        self.cursor = start + consumed as u64;
        self.reader
            .seek(SeekFrom::Start(self.cursor))
            .map_err(|e| self.read_error(e))?;
        self.started = true;

        tracing::debug!(
            file = %self.path.display(),
            lines = lines.len(),
            attempts,
            cursor = self.cursor,
            "Tail: backlog produced"
        );
        Ok(lines)
    }

    /// Return the complete lines appended since the previous poll.
    ///
    /// The first call produces the backlog instead. Rotation handling never
    /// raises an error; only genuine I/O failures on the open handle do.
    pub fn poll_delta(&mut self) -> Result<TailDelta, MonitorError> {
        if !self.started {
            let lines = self.initial_backlog(self.backlog_lines)?;
            return Ok(TailDelta {
                lines,
                rotation: None,
            });
        }

        if !self.boundary_intact().map_err(|e| self.read_error(e))? {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.cursor,
                "Tail: file truncated; resetting offset to 0"
            );
            self.cursor = 0;
            return Ok(TailDelta {
                lines: Vec::new(),
                rotation: Some(Rotation::Truncated),
            });
        }

        // The cursor moves only once the whole batch has been read, so a
        // failure part way through re-reads the same lines next time.
        let (lines, cursor, exhausted) =
            read_batch(&mut self.reader, self.cursor, self.batch_lines)
                .map_err(|e| self.read_error(e))?;
        self.cursor = cursor;

        if !lines.is_empty() {
            self.dirty = true;
        }

        let rotation = if exhausted {
            self.check_rotation()?
        } else {
            None
        };

        Ok(TailDelta { lines, rotation })
    }

    /// Read-and-clear the changed flag.
    pub fn is_changed_since_last_check(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn check_rotation(&mut self) -> Result<Option<Rotation>, MonitorError> {
        let handle_meta = self
            .reader
            .get_ref()
            .metadata()
            .map_err(|e| self.read_error(e))?;

        let current = match FileIdentity::of_path(&self.path) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(
                    file = %self.path.display(),
                    error = %e,
                    "Tail: path temporarily unavailable; retrying next poll"
                );
                FileIdentity::from_metadata(&handle_meta)
            }
        };

        if current != self.identity {
            return match open_handle(&self.path) {
                Ok((reader, identity)) => {
                    tracing::info!(
                        file = %self.path.display(),
                        dropped_from = self.cursor,
                        "Tail: file replaced; reopening from the start"
                    );
                    self.reader = reader;
                    self.identity = identity;
                    self.cursor = 0;
                    Ok(Some(Rotation::Replaced))
                }
                Err(e) => {
                    tracing::debug!(
                        file = %self.path.display(),
                        error = %e,
                        "Tail: replacement not openable yet; retrying next poll"
                    );
                    Ok(None)
                }
            };
        }

        if handle_meta.len() < self.cursor {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.cursor,
                new_size = handle_meta.len(),
                "Tail: file truncated; resetting offset to 0"
            );
            self.cursor = 0;
            return Ok(Some(Rotation::Truncated));
        }

        Ok(None)
    }

    /// Whether the byte just before the cursor is still the `\n` that ended
    /// the last line read. A file truncated in place and regrown past the old
    /// cursor fails this check even though its length alone looks fine.
    fn boundary_intact(&mut self) -> io::Result<bool> {
        if self.cursor == 0 {
            return Ok(true);
        }
        self.reader.seek(SeekFrom::Start(self.cursor - 1))?;
        let mut byte = [0u8; 1];
        let n = self.reader.read(&mut byte)?;
        Ok(n == 1 && byte[0] == b'\n')
    }

    fn read_error(&self, source: io::Error) -> MonitorError {
        MonitorError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

fn open_handle(path: &Path) -> io::Result<(BufReader<File>, FileIdentity)> {
    let file = File::open(path)?;
    let identity = FileIdentity::from_metadata(&file.metadata()?);
    Ok((BufReader::new(file), identity))
}

/// Read up to `limit` complete lines starting at `cursor`.
///
/// Returns the lines, the offset just past the last of them, and whether the
/// available data ran out before the limit was reached.
fn read_batch<R: BufRead + Seek>(
    reader: &mut R,
    cursor: u64,
    limit: usize,
) -> io::Result<(Vec<String>, u64, bool)> {
    reader.seek(SeekFrom::Start(cursor))?;
    let mut next = cursor;
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    while lines.len() < limit {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 || buf.last() != Some(&b'\n') {
            // End of data, or a line still being written. It is left for
            // a later poll.
            return Ok((lines, next, true));
        }
        next += n as u64;
        lines.push(decode_line(&buf[..n - 1]));
    }
    Ok((lines, next, false))
}

/// Decode one line without its `\n`, also dropping a trailing `\r`.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
