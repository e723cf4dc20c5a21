//! Core data types shared by the backend and the frontend
//!
//! # Main Types
//!
//! - [`ConnectionStatus`] - State of the serial link as seen by the UI
//! - [`LinkStats`] - Counters maintained by the read loop
//! - [`Record`] - One decoded JSON line

use serde::{Deserialize, Serialize};

/// One decoded input line. Object keys keep their wire order.
pub type Record = serde_json::Value;

/// Connection status of the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Not connected (initial state, or the reader has exited)
    #[default]
    Disconnected,
    /// Opening the port
    Connecting,
    /// Port open, read loop running
    Connected,
    /// Port could not be opened
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Counters for the serial read loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Lines received, including ones that failed to decode
    pub lines_received: u64,
    /// Lines that decoded to JSON and were handed to the UI
    pub records_emitted: u64,
    /// Lines dropped because they were empty or not valid JSON
    pub lines_rejected: u64,
    /// Records dropped because the UI queue was full
    pub records_dropped: u64,
    /// Read errors other than timeouts
    pub read_errors: u64,
}

impl LinkStats {
    /// Fraction of received lines that decoded successfully, as a percentage
    pub fn decode_rate(&self) -> f64 {
        if self.lines_received == 0 {
            100.0
        } else {
            (self.records_emitted + self.records_dropped) as f64 / self.lines_received as f64
                * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_decode_rate() {
        let mut stats = LinkStats::default();
        assert_eq!(stats.decode_rate(), 100.0);

        stats.lines_received = 4;
        stats.records_emitted = 3;
        stats.lines_rejected = 1;
        assert!((stats.decode_rate() - 75.0).abs() < 1e-9);
    }
}
