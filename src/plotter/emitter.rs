//! # Plotter Command Emitter
//!
//! Writes commands to the serial transport, one write and one flush per
//! command. Each command reaches the transport before the next tick; the
//! transport applies XON/XOFF flow control on its own.

use bytes::BytesMut;
use tracing::trace;

use super::command::PlotterCommand;
use crate::error::{JoyplotError, Result};
use crate::serial::port_trait::SerialPortIO;

/// Sends [`PlotterCommand`]s over a [`SerialPortIO`].
#[derive(Debug)]
pub struct PlotterEmitter<P: SerialPortIO> {
    port: P,
    buf: BytesMut,
    sent: u64,
}

impl<P: SerialPortIO> PlotterEmitter<P> {
    #[must_use]
    pub fn new(port: P) -> Self {
        Self {
            port,
            buf: BytesMut::with_capacity(32),
            sent: 0,
        }
    }

    /// Renders `command`, writes it and flushes.
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the write or the flush fails. Nothing is retried.
    pub async fn emit(&mut self, command: PlotterCommand) -> Result<()> {
        self.buf.clear();
        command.encode(&mut self.buf);

        self.port
            .write_all(&self.buf)
            .await
            .map_err(|e| JoyplotError::Serial(format!("Failed to write {}: {}", command, e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| JoyplotError::Serial(format!("Failed to flush serial port: {}", e)))?;

        self.sent += 1;
        trace!("Sent {}", command);
        Ok(())
    }

    /// Number of commands sent so far.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::mocks::MockSerialPort;
    use std::io;

    #[test]
    fn test_emit_writes_one_chunk_per_command() {
        let mock = MockSerialPort::new();
        let mut emitter = PlotterEmitter::new(mock.clone());

        tokio_test::block_on(async {
            emitter.emit(PlotterCommand::Init).await.unwrap();
            emitter
                .emit(PlotterCommand::MoveAbsolute { x: 5180, y: 3800 })
                .await
                .unwrap();
        });

        assert_eq!(
            mock.get_written_data(),
            vec![b"IN;".to_vec(), b"PA5180,3800;".to_vec()]
        );
        assert_eq!(emitter.sent(), 2);
        assert_eq!(mock.flush_count(), 2);
    }

    #[tokio::test]
    async fn test_write_error_is_reported() {
        let mock = MockSerialPort::new();
        mock.set_write_error(io::ErrorKind::BrokenPipe);
        let mut emitter = PlotterEmitter::new(mock.clone());

        let result = emitter.emit(PlotterCommand::PenDown).await;
        match result {
            Err(JoyplotError::Serial(msg)) => assert!(msg.contains("PD;")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
        assert_eq!(emitter.sent(), 0);
    }

    #[tokio::test]
    async fn test_flush_error_is_reported() {
        let mock = MockSerialPort::new();
        mock.set_flush_error(io::ErrorKind::TimedOut);
        let mut emitter = PlotterEmitter::new(mock);

        let result = emitter.emit(PlotterCommand::PenUp).await;
        assert!(matches!(result, Err(JoyplotError::Serial(_))));
    }
}
