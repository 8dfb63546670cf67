//! Serial transport for servo controllers attached over USB/UART

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::discovery::serial_port_present;
use crate::error::TransportError;
use crate::types::{BaudRate, ConnectionParams, TransportDeviceInfo};
use crate::Transport;

/// Write timeout for a single frame
const WRITE_TIMEOUT_MS: u64 = 1000;

/// Serial transport
///
/// Writes raw frames to the port. While open, the port is also expected to
/// stay in the enumerated port list so a physically unplugged adapter is
/// noticed even before the next write fails. Headless runs (CI, virtual
/// ports) disable that check with [`SerialTransport::with_port_listing_check`].
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
    info: TransportDeviceInfo,
    check_port_listing: bool,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`
    pub fn open(port_name: &str, baud_rate: BaudRate) -> Result<Self, TransportError> {
        let params = ConnectionParams::serial(port_name, baud_rate);
        params.validate()?;

        debug!("Opening serial port {} at {} baud", port_name, baud_rate);
        let port = serialport::new(port_name, baud_rate.as_u32())
            .timeout(Duration::from_millis(WRITE_TIMEOUT_MS))
            .open()?;
        info!("Opened serial port {}", port_name);

        Ok(Self {
            port: Some(port),
            port_name: port_name.to_string(),
            info: TransportDeviceInfo::from_params(&params),
            check_port_listing: true,
        })
    }

    /// Enable or disable the port listing liveness check
    pub fn with_port_listing_check(mut self, enabled: bool) -> Self {
        self.check_port_listing = enabled;
        self
    }

    /// Name of the underlying port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Disconnected)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some() && (!self.check_port_listing || serial_port_present(&self.port_name))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.port_name);
        }
        Ok(())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialTransport::open("/dev/servo-animation-missing-port", BaudRate::B115200);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_rejects_placeholder_port() {
        let result = SerialTransport::open("NONE", BaudRate::B115200);
        assert!(matches!(result, Err(TransportError::PortNotFound(_))));
    }

    #[test]
    #[ignore] // Requires a serial device (run with: SERVO_PORT=/dev/ttyUSB0 cargo test -- --ignored)
    fn test_open_real_port() {
        let port = std::env::var("SERVO_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".into());
        let mut transport = SerialTransport::open(&port, BaudRate::B115200).unwrap();
        assert!(transport.is_open());
        transport.write(&crate::command::encode(0, 375)).unwrap();
        transport.close().unwrap();
        assert!(!transport.is_open());
    }
}
