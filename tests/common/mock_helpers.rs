//! Mock serial links for driving the backend without hardware

use serial_json_monitor::backend::{PortOpener, SerialLink};
use serial_json_monitor::config::SerialConfig;
use serial_json_monitor::error::{MonitorError, Result};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A writer whose contents stay inspectable after it moves into a link
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replays scripted chunks, then times out forever like an idle port
pub struct IdlePortReader {
    chunks: VecDeque<Vec<u8>>,
    idle: Duration,
}

impl IdlePortReader {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            idle: Duration::from_millis(5),
        }
    }
}

impl Read for IdlePortReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None => {
                std::thread::sleep(self.idle);
                Err(io::Error::new(ErrorKind::TimedOut, "no data"))
            }
        }
    }
}

/// Opens a link that replays chunks and then stays idle until stopped
pub struct ScriptedOpener {
    chunks: Mutex<Option<Vec<Vec<u8>>>>,
    pub output: SharedBuffer,
}

impl ScriptedOpener {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            chunks: Mutex::new(Some(
                chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            )),
            output: SharedBuffer::default(),
        }
    }
}

impl PortOpener for ScriptedOpener {
    fn open(&self, _config: &SerialConfig) -> Result<SerialLink> {
        let chunks = self
            .chunks
            .lock()
            .unwrap()
            .take()
            .ok_or(MonitorError::NotConnected)?;
        Ok(SerialLink::new(IdlePortReader::new(chunks), self.output.clone()))
    }
}

/// Fails every open attempt
pub struct FailingOpener;

impl PortOpener for FailingOpener {
    fn open(&self, config: &SerialConfig) -> Result<SerialLink> {
        Err(MonitorError::Config(format!("{} is busy", config.port)))
    }
}
