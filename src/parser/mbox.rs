//! Streaming MBOX splitter.
//!
//! Reads line by line through a 1 MB buffer and hands each message's raw
//! bytes to a callback. The whole archive is never held in memory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{LeadError, Result};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Default maximum message size in bytes (256 MB).
const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Report progress at most every 4 MB.
const PROGRESS_INTERVAL: u64 = 4 * 1024 * 1024;

/// Splits an MBOX file into messages.
///
/// Tolerates:
/// - mixed `\n` and `\r\n` line endings
/// - `From ` lines not preceded by a blank line (logs a warning)
/// - a truncated last message
/// - a UTF-8 BOM at the start of the file
///
/// `>From ` lines inside bodies are escaped separators and stay in the message.
pub struct MboxParser {
    path: PathBuf,
    file_size: u64,
    max_message_size: usize,
}

impl MboxParser {
    /// Open a parser for the given file. Only checks that the file exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|e| LeadError::open(&path, e))?;
        Ok(Self {
            path,
            file_size: metadata.len(),
            max_message_size: MAX_MESSAGE_SIZE,
        })
    }

    /// Override the per-message size cap. Longer messages are truncated.
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Total size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Walk the archive, calling `on_message(offset, raw_bytes)` per message.
    ///
    /// The callback returns `false` to stop early. `progress(done, total)` is
    /// called every few megabytes and once at the end.
    ///
    /// Returns the number of messages delivered.
    pub fn parse(
        &self,
        on_message: &mut dyn FnMut(u64, &[u8]) -> bool,
        progress: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64> {
        if self.file_size == 0 {
            return Ok(0);
        }

        let file = File::open(&self.path).map_err(|e| LeadError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut count: u64 = 0;
        let mut offset: u64 = 0;
        let mut message: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut message_start: u64 = 0;
        let mut prev_blank = true;
        let mut truncated = false;
        let mut last_progress: u64 = 0;
        let mut line: Vec<u8> = Vec::with_capacity(4096);

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| LeadError::io(&self.path, e))?;
            if read == 0 {
                break;
            }

            if is_mbox_separator(&line) {
                if !prev_blank {
                    warn!(offset, "Found 'From ' separator without preceding blank line");
                }
                if !message.is_empty() {
                    if !on_message(message_start, &message) {
                        return Ok(count);
                    }
                    count += 1;
                }
                message.clear();
                message_start = offset;
                truncated = false;
                message.extend_from_slice(&line);
            } else if message.len() + line.len() <= self.max_message_size {
                message.extend_from_slice(&line);
            } else if !truncated {
                warn!(
                    offset = message_start,
                    max_size = self.max_message_size,
                    "Message exceeds maximum size, truncating body"
                );
                truncated = true;
            }

            prev_blank = is_blank_line(&line);
            offset += read as u64;

            if let Some(cb) = progress {
                if offset - last_progress >= PROGRESS_INTERVAL {
                    cb(offset, self.file_size);
                    last_progress = offset;
                }
            }
        }

        if !message.is_empty() && on_message(message_start, &message) {
            count += 1;
        }

        if let Some(cb) = progress {
            cb(self.file_size, self.file_size);
        }

        Ok(count)
    }
}

/// A separator is a line starting with `From ` (after an optional BOM).
fn is_mbox_separator(line: &[u8]) -> bool {
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

/// Empty or only whitespace / CR / LF.
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}
