//! Newline framing and JSON decoding
//!
//! The wire format is one JSON value per `\n`-terminated line. There is no
//! length prefix and no state carried from one line to the next: each line is
//! decoded on its own and anything that is not valid JSON is dropped.

use crate::types::Record;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};

/// Reads one line at a time from a byte stream
pub struct LineFramer<R> {
    reader: BufReader<R>,
    /// Bytes of the current line received before a read timeout
    pending: Vec<u8>,
}

impl<R: Read> LineFramer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pending: Vec::new(),
        }
    }

    /// Block until a full line is available
    ///
    /// Returns the line without its terminator, decoded as UTF-8 with invalid
    /// sequences replaced. `Ok(None)` means the stream has ended.
    ///
    /// On a timeout the bytes received so far are kept and the next call
    /// continues the same line. Any other error discards them.
    pub fn read_next(&mut self) -> io::Result<Option<String>> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(None),
            Ok(_) => Ok(Some(self.take_line())),
            Err(e) => {
                if !is_transient(&e) {
                    self.pending.clear();
                }
                Err(e)
            }
        }
    }

    /// Bytes buffered for an incomplete line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.pending.clear();
        line
    }
}

/// Whether a read error just means "no data yet"
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Decode one line as a JSON value
///
/// Empty lines and anything `serde_json` rejects yield `None`.
pub fn decode_line(line: &str) -> Option<Record> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}
