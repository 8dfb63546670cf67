//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (ports, check, positions)
//! - `live`: commands that drive servos (live, send, calibrate)
//! - `export`: file export
//! - `utility`: config file helpers (init)

pub mod export;
pub mod live;
pub mod query;
pub mod utility;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use servo_animation::config::AppConfig;
use servo_live::LiveController;
use servo_transport::{OutputFormat, PacketFilter, PrinterConfig, SystemConnector};

use crate::cli::MonitorFormat;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Setup Ctrl+C handler and return running flag.
/// The handler also asks `controller` to cut a running jump ramp short.
pub fn setup_interrupt_handler(controller: Arc<LiveController>) -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
        controller.request_stop();
    })
    .ok();

    running
}

/// Create printer config from CLI flags
pub fn create_printer_config(
    monitor: bool,
    hex: bool,
    filter: Option<&str>,
    format: MonitorFormat,
) -> anyhow::Result<Option<PrinterConfig>> {
    if !monitor {
        return Ok(None);
    }

    let filter = match filter {
        Some(f) => f.parse::<PacketFilter>().map_err(anyhow::Error::msg)?,
        None => PacketFilter::All,
    };
    let format = match format {
        MonitorFormat::Text => OutputFormat::Text,
        MonitorFormat::Json => OutputFormat::Json,
    };

    Ok(Some(
        PrinterConfig::default()
            .with_hex(hex)
            .with_filter(filter)
            .with_format(format),
    ))
}

/// Connector for the real backends.
/// If `printer_config` is Some, every opened transport is wrapped with the printer.
pub fn system_connector(
    config: &AppConfig,
    printer_config: Option<PrinterConfig>,
) -> SystemConnector {
    let connector = SystemConnector::new().with_port_listing_check(!config.live.headless);
    match printer_config {
        Some(printer) => connector.with_printer_config(printer),
        None => connector,
    }
}

/// Live controller tuned from the config
pub fn live_controller(config: &AppConfig, printer_config: Option<PrinterConfig>) -> LiveController {
    let controller = LiveController::new(system_connector(config, printer_config));
    controller.set_settings(config.live_settings());
    controller
}
