//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock serial port for testing
    #[derive(Clone, Debug, Default)]
    pub struct MockSerialPort {
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
        pub flushes: Arc<Mutex<usize>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub flush_error: Arc<Mutex<Option<io::ErrorKind>>>,
        /// Fail every write after this many successful ones
        pub fail_after: Arc<Mutex<Option<usize>>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        /// Everything written so far, concatenated as text.
        pub fn written_text(&self) -> String {
            let data = self.written_data.lock().unwrap();
            data.iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect()
        }

        /// Written chunks as text, one entry per command.
        pub fn written_commands(&self) -> Vec<String> {
            let data = self.written_data.lock().unwrap();
            data.iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect()
        }

        pub fn flush_count(&self) -> usize {
            *self.flushes.lock().unwrap()
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock().unwrap() = Some(error);
        }

        pub fn set_flush_error(&self, error: io::ErrorKind) {
            *self.flush_error.lock().unwrap() = Some(error);
        }

        pub fn set_fail_after(&self, writes: usize) {
            *self.fail_after.lock().unwrap() = Some(writes);
        }
    }

    #[async_trait]
    impl SerialPortIO for MockSerialPort {
        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock write error"));
            }
            let mut written = self.written_data.lock().unwrap();
            if let Some(limit) = *self.fail_after.lock().unwrap() {
                if written.len() >= limit {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Mock write error"));
                }
            }
            written.push(data.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            if let Some(error) = *self.flush_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock flush error"));
            }
            *self.flushes.lock().unwrap() += 1;
            Ok(())
        }
    }
}
