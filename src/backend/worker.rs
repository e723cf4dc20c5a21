//! Serial read loop and command writer
//!
//! This module contains the loop that runs on the reader thread and the
//! shared write handle used by the UI thread to send commands.
//!
//! # Responsibilities
//!
//! The reader thread handles:
//!
//! - **Opening the port**: a failure here ends the thread; the UI keeps running
//! - **Framing**: one line at a time through [`LineFramer`]
//! - **Decoding**: strict JSON per line, invalid lines dropped silently
//! - **Hand-off**: decoded records go to the UI with `try_send`, so the reader
//!   never waits on the UI
//! - **Statistics**: periodic [`LinkStats`] updates
//!
//! # Stopping
//!
//! [`CommandWriter::close`] and the shared running flag are flipped from the UI
//! thread. The read loop notices the flag after its current read returns, which
//! the port's read timeout bounds.

use crate::backend::framer::{decode_line, is_transient, LineFramer};
use crate::backend::port::PortOpener;
use crate::backend::BackendMessage;
use crate::config::SerialConfig;
use crate::error::{MonitorError, Result};
use crate::types::{ConnectionStatus, LinkStats, Record};
use crossbeam_channel::{Sender, TrySendError};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pause after a non-timeout read error so a dead device does not spin the loop
const READ_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Minimum interval between statistics updates sent to the UI
const STATS_INTERVAL: Duration = Duration::from_millis(500);

enum WriterState {
    /// The port has not been opened yet
    Pending,
    Open(Box<dyn Write + Send>),
    /// Stopped, or the port failed to open
    Closed,
}

/// Write half of the serial link, shared between the reader and UI threads
///
/// Sending is fire-and-forget: when the link is not open a send is a no-op.
#[derive(Clone)]
pub struct CommandWriter {
    state: Arc<Mutex<WriterState>>,
}

impl Default for CommandWriter {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(WriterState::Pending)),
        }
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter")
            .field("open", &self.is_open())
            .finish()
    }
}

impl CommandWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        // A panic while holding the lock cannot leave the state half-updated
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install the write handle once the port is open
    ///
    /// Returns `false` (and drops the handle) if the writer was closed first.
    pub fn attach(&self, writer: Box<dyn Write + Send>) -> bool {
        let mut state = self.lock();
        match *state {
            WriterState::Pending => {
                *state = WriterState::Open(writer);
                true
            }
            WriterState::Open(_) | WriterState::Closed => false,
        }
    }

    /// Close the write handle
    ///
    /// Returns `true` only for the call that actually closed an open handle.
    pub fn close(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lock(), WriterState::Closed);
        matches!(previous, WriterState::Open(_))
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.lock(), WriterState::Open(_))
    }

    /// Send a command followed by a newline
    ///
    /// Returns whether the bytes were written. A closed or never-opened link is
    /// not an error; write failures are logged.
    pub fn send(&self, command: &str) -> bool {
        match self.write_line(command) {
            Ok(()) => {
                tracing::info!("Sent command: {}", command);
                true
            }
            Err(MonitorError::NotConnected) => {
                tracing::debug!("Serial link not open, dropping command {:?}", command);
                false
            }
            Err(e) => {
                tracing::warn!("Failed to send command {:?}: {}", command, e);
                false
            }
        }
    }

    /// Write `line` and a terminating newline, then flush
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut state = self.lock();
        let WriterState::Open(writer) = &mut *state else {
            return Err(MonitorError::NotConnected);
        };

        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// The loop that owns the read half of the serial link
pub struct SerialWorker {
    config: SerialConfig,
    opener: Box<dyn PortOpener>,
    message_tx: Sender<BackendMessage>,
    writer: CommandWriter,
    running: Arc<AtomicBool>,
    stats: LinkStats,
    last_stats_time: Instant,
}

impl SerialWorker {
    pub fn new(
        config: SerialConfig,
        opener: Box<dyn PortOpener>,
        message_tx: Sender<BackendMessage>,
        writer: CommandWriter,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            opener,
            message_tx,
            writer,
            running,
            stats: LinkStats::default(),
            last_stats_time: Instant::now(),
        }
    }

    /// Open the port and read until stopped
    pub fn run(&mut self) {
        self.send_status(ConnectionStatus::Connecting);

        let link = match self.opener.open(&self.config) {
            Ok(link) => link,
            Err(e) => {
                tracing::error!("Could not open serial port: {}", e);
                self.writer.close();
                self.send(BackendMessage::ConnectionError(e.to_string()));
                self.send_status(ConnectionStatus::Error);
                return;
            }
        };

        if !self.writer.attach(link.writer) {
            tracing::debug!("Stopped before the serial port finished opening");
            self.send_status(ConnectionStatus::Disconnected);
            return;
        }

        tracing::info!(
            "Opened serial {} @ {}",
            self.config.port,
            self.config.baud_rate
        );
        self.send_status(ConnectionStatus::Connected);

        self.read_loop(link.reader);

        self.writer.close();
        self.send(BackendMessage::Stats(self.stats));
        self.send_status(ConnectionStatus::Disconnected);
        tracing::info!("Serial reader stopped");
    }

    fn read_loop(&mut self, reader: Box<dyn Read + Send>) {
        let mut framer = LineFramer::new(reader);

        while self.running.load(Ordering::SeqCst) {
            match framer.read_next() {
                Ok(Some(line)) => {
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    self.handle_line(&line);
                }
                Ok(None) => {
                    tracing::info!("Serial stream ended");
                    break;
                }
                Err(e) if is_transient(&e) => {}
                Err(e) => {
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    self.stats.read_errors += 1;
                    tracing::warn!("Error reading serial: {}", e);
                    std::thread::sleep(READ_ERROR_PAUSE);
                }
            }

            if !self.publish_stats_if_due() {
                tracing::debug!("UI receiver gone, stopping reader");
                break;
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        self.stats.lines_received += 1;

        match decode_line(line) {
            Some(record) => self.emit(record),
            None => {
                self.stats.lines_rejected += 1;
                tracing::trace!("Dropping non-JSON line ({} bytes)", line.len());
            }
        }
    }

    fn emit(&mut self, record: Record) {
        match self.message_tx.try_send(BackendMessage::Record(record)) {
            Ok(()) => self.stats.records_emitted += 1,
            Err(TrySendError::Full(_)) => {
                self.stats.records_dropped += 1;
                tracing::debug!("UI queue full, dropping record");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Returns `false` once the UI side has hung up
    fn publish_stats_if_due(&mut self) -> bool {
        if self.last_stats_time.elapsed() < STATS_INTERVAL {
            return true;
        }
        self.last_stats_time = Instant::now();
        !matches!(
            self.message_tx.try_send(BackendMessage::Stats(self.stats)),
            Err(TrySendError::Disconnected(_))
        )
    }

    fn send_status(&self, status: ConnectionStatus) {
        self.send(BackendMessage::ConnectionStatus(status));
    }

    fn send(&self, msg: BackendMessage) {
        let _ = self.message_tx.try_send(msg);
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}
