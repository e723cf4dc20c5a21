//! Backend module for serial communication
//!
//! This module handles all serial I/O in a separate thread to keep the UI
//! responsive. It uses crossbeam channels for thread-safe communication with
//! the frontend.
//!
//! # Architecture
//!
//! The reader runs in its own thread, communicating with the UI through:
//!
//! - [`BackendMessage`] - Messages sent from the reader to the UI (records, status)
//! - [`FrontendReceiver`] - UI-side handle for draining messages and sending commands
//! - [`SerialBackend`] - Entry point that owns the reader and spawns its thread
//! - [`BackendHandle`] - Join handle with a bounded wait for shutdown
//!
//! Commands do not go through a channel: the UI writes them directly through
//! the shared [`CommandWriter`], which holds the write half of the port.
//!
//! # Components
//!
//! - [`LineFramer`] / [`decode_line`] - Newline framing and JSON decoding
//! - [`SerialWorker`] - The read loop
//! - [`PortOpener`] / [`SystemPortOpener`] - Opening the device
//!
//! # Example
//!
//! ```ignore
//! use serial_json_monitor::backend::SerialBackend;
//! use serial_json_monitor::config::SerialConfig;
//!
//! let (backend, frontend) = SerialBackend::new(SerialConfig::default());
//! let handle = backend.spawn();
//!
//! frontend.send_command("STAT?");
//! for msg in frontend.drain() {
//!     if let BackendMessage::Record(record) = msg {
//!         // Render the record
//!     }
//! }
//!
//! frontend.stop();
//! handle.join_timeout(std::time::Duration::from_millis(1500));
//! ```

pub mod framer;
pub mod port;
pub mod worker;

pub use framer::{decode_line, LineFramer};
pub use port::{available_ports, PortOpener, SerialLink, SystemPortOpener};
pub use worker::{CommandWriter, SerialWorker};

use crate::config::SerialConfig;
use crate::types::{ConnectionStatus, LinkStats, Record};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Capacity of the reader-to-UI queue. Records beyond this are dropped.
pub const MESSAGE_QUEUE_CAPACITY: usize = 1024;

/// How long shutdown waits for the reader thread
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1500);

/// Message sent from the reader to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// The port could not be opened
    ConnectionError(String),
    /// A decoded JSON line
    Record(Record),
    /// Statistics update
    Stats(LinkStats),
}

/// Frontend side of the backend: message queue plus command writer
pub struct FrontendReceiver {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Write half of the serial link
    pub commands: CommandWriter,
    running: Arc<AtomicBool>,
}

impl FrontendReceiver {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        self.receiver.try_iter().collect()
    }

    /// Send a command line to the device; a no-op when the link is not open
    pub fn send_command(&self, command: &str) -> bool {
        self.commands.send(command)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the reader and close the port
    ///
    /// Safe to call while a read is in flight and safe to call repeatedly.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if self.commands.close() {
            tracing::info!("Serial port closed");
        }
    }
}

/// The serial backend that runs in a separate thread
pub struct SerialBackend {
    worker: SerialWorker,
}

impl SerialBackend {
    /// Create a backend for a real serial device
    pub fn new(config: SerialConfig) -> (Self, FrontendReceiver) {
        Self::with_opener(config, Box::new(SystemPortOpener))
    }

    /// Create a backend with a custom way of opening the link
    pub fn with_opener(
        config: SerialConfig,
        opener: Box<dyn PortOpener>,
    ) -> (Self, FrontendReceiver) {
        let (msg_tx, msg_rx) = bounded(MESSAGE_QUEUE_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let commands = CommandWriter::new();

        let backend = Self {
            worker: SerialWorker::new(config, opener, msg_tx, commands.clone(), running.clone()),
        };

        let frontend = FrontendReceiver {
            receiver: msg_rx,
            commands,
            running,
        };

        (backend, frontend)
    }

    /// Run the read loop on the current thread
    pub fn run(mut self) {
        self.worker.run();
    }

    /// Run the read loop on a new thread
    pub fn spawn(self) -> BackendHandle {
        let (done_tx, done_rx) = bounded::<()>(1);
        let thread = std::thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || {
                self.run();
                let _ = done_tx.send(());
            });

        match thread {
            Ok(thread) => BackendHandle {
                thread: Some(thread),
                done: done_rx,
            },
            Err(e) => {
                tracing::error!("Failed to spawn serial reader thread: {}", e);
                BackendHandle {
                    thread: None,
                    done: done_rx,
                }
            }
        }
    }
}

/// Handle to the reader thread
pub struct BackendHandle {
    thread: Option<JoinHandle<()>>,
    done: Receiver<()>,
}

impl BackendHandle {
    /// Wait for the reader thread to finish, up to `timeout`
    ///
    /// Returns `false` if the thread is still running when the timeout expires;
    /// it is then detached.
    pub fn join_timeout(mut self, timeout: Duration) -> bool {
        let Some(thread) = self.thread.take() else {
            return true;
        };

        match self.done.recv_timeout(timeout) {
            // The sender is dropped without sending if the thread panicked
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    tracing::warn!("Serial reader thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Serial reader did not stop within {:?}, detaching",
                    timeout
                );
                false
            }
        }
    }
}

/// Stop the reader and wait for it with the default timeout
pub fn shutdown(frontend: &FrontendReceiver, handle: BackendHandle) -> bool {
    frontend.stop();
    handle.join_timeout(SHUTDOWN_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use port::MockPortOpener;
    use std::io::Cursor;

    #[test]
    fn test_backend_creation() {
        let (_backend, frontend) = SerialBackend::new(SerialConfig::default());
        assert!(frontend.is_running());
        assert!(frontend.try_recv().is_none());
        assert!(!frontend.send_command("PING"));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_backend, frontend) = SerialBackend::new(SerialConfig::default());
        frontend.stop();
        frontend.stop();
        assert!(!frontend.is_running());
    }

    #[test]
    fn test_spawned_backend_delivers_records() {
        let mut opener = MockPortOpener::new();
        opener.expect_open().returning(|_| {
            Ok(SerialLink::new(
                Cursor::new(b"{\"temp\": 21.5}\n".to_vec()),
                std::io::sink(),
            ))
        });

        let (backend, frontend) = SerialBackend::with_opener(SerialConfig::default(), Box::new(opener));
        let handle = backend.spawn();
        assert!(handle.join_timeout(SHUTDOWN_TIMEOUT));

        let records: Vec<_> = frontend
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                BackendMessage::Record(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(records, vec![serde_json::json!({ "temp": 21.5 })]);
    }

    #[test]
    fn test_open_failure_keeps_frontend_usable() {
        let mut opener = MockPortOpener::new();
        opener
            .expect_open()
            .returning(|_| Err(MonitorError::Config("busy".into())));

        let (backend, frontend) = SerialBackend::with_opener(SerialConfig::default(), Box::new(opener));
        let handle = backend.spawn();
        assert!(handle.join_timeout(SHUTDOWN_TIMEOUT));

        assert!(!frontend.send_command("PING"));
        assert!(frontend
            .drain()
            .iter()
            .any(|m| matches!(m, BackendMessage::ConnectionError(_))));
    }
}
