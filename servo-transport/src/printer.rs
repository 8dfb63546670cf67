//! PrinterTransport middleware for monitoring outgoing frames
//!
//! Wraps any [`Transport`] and prints every frame passing through it before
//! forwarding the bytes unchanged.
//!
//! # Example
//!
//! ```ignore
//! use servo_transport::{PrinterConfig, PrinterTransport, SerialTransport, BaudRate};
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0", BaudRate::B115200)?;
//! let monitored = PrinterTransport::wrap(Box::new(transport), PrinterConfig::default());
//! ```

use std::io::Write;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::command::{ServoCommand, COMMAND_LEN};
use crate::{BoxedTransport, Transport, TransportDeviceInfo, TransportError};

/// Output format for the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Frame filter for selective display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PacketFilter {
    #[default]
    All,
    Servo(u8),
}

impl FromStr for PacketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            s if s.starts_with("servo=") || s.starts_with("id=") => {
                let id = s.split_once('=').map(|(_, v)| v).unwrap_or_default();
                id.parse::<u8>()
                    .map(Self::Servo)
                    .map_err(|e| format!("Invalid servo ID: {}", e))
            }
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// Configuration for the PrinterTransport
#[derive(Debug, Clone, Default)]
pub struct PrinterConfig {
    /// Show raw hex dump alongside decoded output
    pub show_hex: bool,
    /// Filter for selective display
    pub filter: PacketFilter,
    /// Output format
    pub format: OutputFormat,
}

impl PrinterConfig {
    /// Create config with hex output setting
    pub fn with_hex(mut self, show: bool) -> Self {
        self.show_hex = show;
        self
    }

    /// Create config with filter
    pub fn with_filter(mut self, filter: PacketFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Create config with output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    target: &'a str,
    servo_id: u8,
    position: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
}

/// Transport middleware that prints all outgoing frames
pub struct PrinterTransport {
    inner: BoxedTransport,
    config: PrinterConfig,
    out: Mutex<Box<dyn Write + Send>>,
}

impl PrinterTransport {
    /// Wrap a transport, printing to stderr
    pub fn wrap(transport: BoxedTransport, config: PrinterConfig) -> BoxedTransport {
        Box::new(Self::with_output(
            transport,
            config,
            Box::new(std::io::stderr()),
        ))
    }

    /// Wrap a transport, printing to `out`
    pub fn with_output(
        transport: BoxedTransport,
        config: PrinterConfig,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            inner: transport,
            config,
            out: Mutex::new(out),
        }
    }

    fn should_show(&self, cmd: &ServoCommand) -> bool {
        match self.config.filter {
            PacketFilter::All => true,
            PacketFilter::Servo(id) => id == cmd.servo_id,
        }
    }

    fn format_frame(&self, cmd: &ServoCommand, raw: &[u8]) -> String {
        let hex = self.config.show_hex.then(|| format!("{:02x?}", raw));
        match self.config.format {
            OutputFormat::Text => {
                let mut line = format!(
                    ">>> {}  servo {:3}  position {:5}",
                    self.inner.device_info().address,
                    cmd.servo_id,
                    cmd.position
                );
                if let Some(hex) = hex {
                    line.push_str("  HEX ");
                    line.push_str(&hex);
                }
                line
            }
            OutputFormat::Json => {
                let frame = JsonFrame {
                    target: &self.inner.device_info().address,
                    servo_id: cmd.servo_id,
                    position: cmd.position,
                    hex,
                };
                serde_json::to_string(&frame).unwrap_or_default()
            }
        }
    }

    fn print_bytes(&self, bytes: &[u8]) {
        for raw in bytes.chunks(COMMAND_LEN) {
            let line = match ServoCommand::parse(raw) {
                Ok(cmd) if self.should_show(&cmd) => self.format_frame(&cmd, raw),
                Ok(_) => continue,
                Err(e) => format!(">>> UNKNOWN {:02x?} ({})", raw, e),
            };

            let mut out = self.out.lock();
            if let Err(e) = writeln!(out, "{}", line) {
                debug!("Printer output failed: {}", e);
            }
        }
    }
}

impl Transport for PrinterTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.print_bytes(bytes);
        self.inner.write(bytes)
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        self.inner.device_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::encode;
    use crate::types::{BaudRate, ConnectionParams};
    use std::sync::Arc;

    /// Sink shared between the printer and the test
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Recorder {
        written: Arc<Mutex<Vec<u8>>>,
        info: TransportDeviceInfo,
    }

    impl Transport for Recorder {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.written.lock().extend_from_slice(bytes);
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn device_info(&self) -> &TransportDeviceInfo {
            &self.info
        }
    }

    fn recorder() -> (Recorder, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let info = TransportDeviceInfo::from_params(&ConnectionParams::serial(
            "/dev/ttyTEST",
            BaudRate::B115200,
        ));
        (
            Recorder {
                written: Arc::clone(&written),
                info,
            },
            written,
        )
    }

    #[test]
    fn test_packet_filter_parse() {
        assert_eq!(PacketFilter::from_str("all").unwrap(), PacketFilter::All);
        assert_eq!(
            PacketFilter::from_str("servo=3").unwrap(),
            PacketFilter::Servo(3)
        );
        assert_eq!(PacketFilter::from_str("id=12").unwrap(), PacketFilter::Servo(12));
        assert!(PacketFilter::from_str("servo=300").is_err());
        assert!(PacketFilter::from_str("events").is_err());
    }

    #[test]
    fn test_forwards_bytes_unchanged() {
        let (inner, written) = recorder();
        let sink = SharedBuf::default();
        let mut printer = PrinterTransport::with_output(
            Box::new(inner),
            PrinterConfig::default(),
            Box::new(sink.clone()),
        );

        printer.write(&encode(2, 400)).unwrap();

        assert_eq!(*written.lock(), encode(2, 400).to_vec());
        let text = String::from_utf8(sink.0.lock().clone()).unwrap();
        assert!(text.contains("/dev/ttyTEST"));
        assert!(text.contains("servo   2"));
        assert!(text.contains("position   400"));
    }

    #[test]
    fn test_filter_hides_other_servos() {
        let (inner, written) = recorder();
        let sink = SharedBuf::default();
        let config = PrinterConfig::default().with_filter(PacketFilter::Servo(1));
        let mut printer =
            PrinterTransport::with_output(Box::new(inner), config, Box::new(sink.clone()));

        printer.write(&encode(2, 400)).unwrap();
        printer.write(&encode(1, 401)).unwrap();

        assert_eq!(written.lock().len(), 10);
        let text = String::from_utf8(sink.0.lock().clone()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("401"));
    }

    #[test]
    fn test_json_output_with_hex() {
        let (inner, _) = recorder();
        let sink = SharedBuf::default();
        let config = PrinterConfig::default()
            .with_format(OutputFormat::Json)
            .with_hex(true);
        let mut printer =
            PrinterTransport::with_output(Box::new(inner), config, Box::new(sink.clone()));

        printer.write(&encode(5, 258)).unwrap();

        let text = String::from_utf8(sink.0.lock().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["servo_id"], 5);
        assert_eq!(value["position"], 258);
        assert_eq!(value["hex"], "[3c, 05, 01, 02, 3e]");
    }
}
