//! Serial port access
//!
//! [`PortOpener`] is the seam between the read loop and the hardware. The
//! production implementation, [`SystemPortOpener`], opens the device with the
//! `serialport` crate and splits it into independent read and write handles
//! (two file descriptors for the same device), so the UI thread can write
//! while the read loop is blocked in a read.

use crate::config::SerialConfig;
use crate::error::{Result, ResultExt};
use serialport::SerialPort;
use std::io::{Read, Write};

/// An open serial device, split into its two directions
pub struct SerialLink {
    /// Owned by the read loop
    pub reader: Box<dyn Read + Send>,
    /// Shared with the UI thread through the command writer
    pub writer: Box<dyn Write + Send>,
}

impl SerialLink {
    pub fn new(reader: impl Read + Send + 'static, writer: impl Write + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink").finish_non_exhaustive()
    }
}

/// Opens the serial link described by a [`SerialConfig`]
#[cfg_attr(test, mockall::automock)]
pub trait PortOpener: Send {
    fn open(&self, config: &SerialConfig) -> Result<SerialLink>;
}

/// Opens real devices through the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(&self, config: &SerialConfig) -> Result<SerialLink> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .with_context(|| {
                format!(
                    "Failed to open serial port '{}' @ {} baud",
                    config.port, config.baud_rate
                )
            })?;

        let writer = port
            .try_clone()
            .with_context(|| format!("Failed to clone serial port '{}'", config.port))?;

        Ok(SerialLink::new(PortHalf(port), PortHalf(writer)))
    }
}

/// Adapts a boxed [`SerialPort`] to plain `Read`/`Write`
struct PortHalf(Box<dyn SerialPort>);

impl Read for PortHalf {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for PortHalf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

/// List serial devices present on the system, for diagnostics
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
