//! # Boiler Serial Communication
//!
//! The service port is request/response: the host writes a two-character
//! command terminated by CR and the boiler answers with a raw binary block.
//! Responses carry no length or terminator, so a response ends when the line
//! stays quiet for the configured idle gap.

use crate::config::SerialSettings;
use crate::constants::{MAX_RESPONSE_LEN, STALE_INPUT_QUIET_MS};
use crate::error::IntergasError;
use crate::protocol::command::Command;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;

/// Byte stream the handle can talk over: a real port or a mock.
pub trait SerialPort: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPort for T {}

/// Sends one command and returns the raw response bytes.
#[async_trait]
pub trait BoilerTransport: Send {
    async fn request(&mut self, command: Command) -> Result<Vec<u8>, IntergasError>;
}

/// Handle to the boiler's service port.
pub struct BoilerSerialHandle<P: SerialPort = tokio_serial::SerialStream> {
    port: P,
    response_timeout: Duration,
    idle_gap: Duration,
}

impl BoilerSerialHandle<tokio_serial::SerialStream> {
    /// Opens the configured port at 8N1.
    pub async fn connect(settings: &SerialSettings) -> Result<Self, IntergasError> {
        let port = tokio_serial::new(&settings.port, settings.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(settings.response_timeout())
            .open_native_async()
            .map_err(|e| IntergasError::SerialPortError(format!("{}: {e}", settings.port)))?;

        log::info!("opened {} at {} baud", settings.port, settings.baudrate);
        Ok(Self::new(port, settings))
    }
}

impl<P: SerialPort> BoilerSerialHandle<P> {
    pub fn new(port: P, settings: &SerialSettings) -> Self {
        BoilerSerialHandle {
            port,
            response_timeout: settings.response_timeout(),
            idle_gap: settings.idle_gap(),
        }
    }

    /// Reads and drops whatever is already waiting on the line.
    ///
    /// Replies carry no framing, so a reply that arrived after its timeout
    /// would otherwise be read as the start of the next response.
    pub async fn discard_stale_input(&mut self) -> Result<usize, IntergasError> {
        let quiet = Duration::from_millis(STALE_INPUT_QUIET_MS);
        let mut chunk = [0u8; MAX_RESPONSE_LEN];
        let mut discarded = 0;

        loop {
            match timeout(quiet, self.port.read(&mut chunk)).await {
                Err(_) | Ok(Ok(0)) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        if discarded > 0 {
            log::debug!("discarded {discarded} stale bytes");
        }
        Ok(discarded)
    }

    /// Writes the command text, including its CR terminator, after
    /// discarding stale input.
    pub async fn send_command(&mut self, command: Command) -> Result<(), IntergasError> {
        self.discard_stale_input().await?;
        log::debug!("sending {command}");
        self.port.write_all(command.as_bytes()).await?;
        self.port.flush().await?;
        Ok(())
    }

    /// Collects one response.
    ///
    /// The first byte must arrive within the response timeout; after that
    /// the response ends at the first idle gap or at `MAX_RESPONSE_LEN`.
    pub async fn recv_response(&mut self, command: Command) -> Result<Vec<u8>, IntergasError> {
        let mut buf = Vec::with_capacity(MAX_RESPONSE_LEN);
        let mut chunk = [0u8; MAX_RESPONSE_LEN];

        let n = timeout(self.response_timeout, self.port.read(&mut chunk))
            .await
            .map_err(|_| IntergasError::Timeout(command))??;
        if n == 0 {
            return Err(IntergasError::EmptyResponse(command));
        }
        buf.extend_from_slice(&chunk[..n]);

        while buf.len() < MAX_RESPONSE_LEN {
            let room = MAX_RESPONSE_LEN - buf.len();
            match timeout(self.idle_gap, self.port.read(&mut chunk[..room])).await {
                Err(_) | Ok(Ok(0)) => break,
                Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        log::debug!("{command}: received {} bytes", buf.len());
        Ok(buf)
    }

    /// Gives back the underlying port.
    pub fn into_inner(self) -> P {
        self.port
    }
}

#[async_trait]
impl<P: SerialPort> BoilerTransport for BoilerSerialHandle<P> {
    async fn request(&mut self, command: Command) -> Result<Vec<u8>, IntergasError> {
        self.send_command(command).await?;
        self.recv_response(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial_mock::MockSerialPort;

    fn settings() -> SerialSettings {
        SerialSettings {
            response_timeout_ms: 100,
            idle_gap_ms: 20,
            ..SerialSettings::default()
        }
    }

    #[tokio::test]
    async fn test_request_writes_command_and_reads_reply() {
        let mock = MockSerialPort::new();
        mock.script(Command::Status2, &[0x11; 20]);
        let mut handle = BoilerSerialHandle::new(mock.clone(), &settings());

        let reply = handle.request(Command::Status2).await.unwrap();
        assert_eq!(reply, vec![0x11; 20]);
        assert_eq!(mock.get_tx_data(), b"S2\r".to_vec());
    }

    #[tokio::test]
    async fn test_silent_port_times_out() {
        let mock = MockSerialPort::new();
        let mut handle = BoilerSerialHandle::new(mock, &settings());

        let err = handle.request(Command::Status1).await.unwrap_err();
        assert!(matches!(err, IntergasError::Timeout(Command::Status1)));
    }

    #[tokio::test]
    async fn test_response_capped_at_max_len() {
        let mock = MockSerialPort::new();
        mock.queue_rx_data(&[0xAA; 100]);
        let mut handle = BoilerSerialHandle::new(mock.clone(), &settings());

        let reply = handle.recv_response(Command::Statistics).await.unwrap();
        assert_eq!(reply.len(), MAX_RESPONSE_LEN);
        assert_eq!(mock.rx_pending(), 100 - MAX_RESPONSE_LEN);
    }

    #[tokio::test]
    async fn test_late_reply_is_not_glued_to_next_response() {
        let mock = MockSerialPort::new();
        mock.script(Command::Status2, &[0x22; 20]);
        let mut handle = BoilerSerialHandle::new(mock.clone(), &settings());

        // S? answered after the handle had already given up on it
        assert!(handle.request(Command::Status1).await.is_err());
        mock.queue_rx_data(&[0x8A; 30]);

        let reply = handle.request(Command::Status2).await.unwrap();
        assert_eq!(reply, vec![0x22; 20]);
        assert_eq!(mock.rx_pending(), 0);
    }

    #[tokio::test]
    async fn test_discard_stale_input_on_quiet_line() {
        let mock = MockSerialPort::new();
        let mut handle = BoilerSerialHandle::new(mock.clone(), &settings());
        assert_eq!(handle.discard_stale_input().await.unwrap(), 0);

        mock.queue_rx_data(&[0x01; 100]);
        assert_eq!(handle.discard_stale_input().await.unwrap(), 100);
        assert_eq!(mock.rx_pending(), 0);
    }

    #[tokio::test]
    async fn test_io_error_maps_to_serial_error() {
        let mock = MockSerialPort::new();
        mock.set_next_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"));
        let mut handle = BoilerSerialHandle::new(mock, &settings());

        let err = handle.request(Command::Status1).await.unwrap_err();
        assert!(matches!(err, IntergasError::SerialPortError(_)));
    }
}
