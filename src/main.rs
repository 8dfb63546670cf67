//! Servo Animation CLI
//!
//! Streams keyframed bone rotations to servo controllers over serial or
//! socket connections, and exports them to files.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use servo_animation::config::AppConfig;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);

    if let Commands::Init { force } = cli.command {
        return commands::utility::init(&config_path, force);
    }

    info!("Loading config from {:?}", config_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(port) = &cli.port {
        config.live.serial_port = port.clone();
    }

    // Create printer config if monitoring is enabled
    let printer_config = commands::create_printer_config(
        cli.monitor,
        cli.hex,
        cli.filter.as_deref(),
        cli.monitor_format,
    )?;

    match cli.command {
        Commands::Ports => commands::query::ports(),
        Commands::Check => commands::query::check(&config),
        Commands::Positions { frame, precision } => {
            commands::query::positions(&config, frame, precision)
        }
        Commands::Live {
            start,
            end,
            loop_playback,
            no_jump_handling,
        } => {
            if no_jump_handling {
                config.live.position_jump_handling = false;
            }
            commands::live::live(&config, printer_config, start, end, loop_playback)
        }
        Commands::Send { servo_id, position } => {
            commands::live::send(&config, printer_config, servo_id, position)
        }
        Commands::Calibrate {
            servo_id,
            min,
            max,
            hold,
            dry_run,
        } => {
            let options = commands::live::CalibrateOptions {
                min,
                max,
                hold: std::time::Duration::from_millis(hold),
            };
            commands::live::calibrate(&mut config, printer_config, servo_id, &options)?;
            if dry_run {
                Ok(())
            } else {
                config.save(&config_path)?;
                info!("Saved config to {:?}", config_path);
                Ok(())
            }
        }
        Commands::Export {
            file,
            format,
            precision,
            skip_duplicates,
            indent,
        } => commands::export::export(
            &config,
            &file,
            format,
            precision,
            skip_duplicates,
            indent,
        ),
        Commands::Init { .. } => Ok(()),
    }
}
