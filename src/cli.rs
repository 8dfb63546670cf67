// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "servo-animation")]
#[command(author, version, about = "Stream bone animation to servo controllers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/servo-animation/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Enable transport monitoring (prints every command sent)
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Show raw hex alongside decoded commands
    #[arg(long, global = true)]
    pub hex: bool,

    /// Filter monitor output (all, servo=N)
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Monitor output format
    #[arg(long, global = true, value_enum, default_value_t = MonitorFormat::Text)]
    pub monitor_format: MonitorFormat,

    /// Override the serial port from the config
    #[arg(long, global = true)]
    pub port: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MonitorFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FileFormat {
    /// Concatenated 5-byte servo commands
    Bin,
    /// Positions with scene metadata
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List serial ports
    #[command(visible_alias = "list")]
    Ports,

    /// Validate the config: channels, duplicate servo IDs, frame range
    Check,

    /// Print the servo positions of one frame
    #[command(visible_alias = "pos")]
    Positions {
        /// Frame to evaluate (default: scene start)
        #[arg(short, long)]
        frame: Option<i32>,

        /// Decimal digits kept
        #[arg(short, long, default_value = "0")]
        precision: u32,
    },

    /// Play the scene in live mode
    Live {
        /// First frame to play (default: scene start)
        #[arg(long)]
        start: Option<i32>,

        /// Last frame to play (default: scene end)
        #[arg(long)]
        end: Option<i32>,

        /// Restart at the first frame after the last one
        #[arg(short, long = "loop")]
        loop_playback: bool,

        /// Disable ramping of large position jumps
        #[arg(long)]
        no_jump_handling: bool,
    },

    /// Send one position to a servo
    Send {
        /// Servo ID (0-255)
        servo_id: u8,
        /// Raw servo position
        position: u16,
    },

    /// Move a servo to its bounds and store them in the config
    #[command(visible_alias = "cal")]
    Calibrate {
        /// Servo ID (0-255)
        servo_id: u8,

        /// New min position
        #[arg(long)]
        min: Option<u16>,

        /// New max position
        #[arg(long)]
        max: Option<u16>,

        /// Time to hold each bound in milliseconds
        #[arg(long, default_value = "1000")]
        hold: u64,

        /// Show the result without saving the config
        #[arg(long)]
        dry_run: bool,
    },

    /// Export the positions of every frame to a file
    Export {
        /// Output file
        file: PathBuf,

        /// Output format (default: from the file extension, else bin)
        #[arg(short, long, value_enum)]
        format: Option<FileFormat>,

        /// Decimal digits kept (bin needs 0)
        #[arg(short, long, default_value = "0")]
        precision: u32,

        /// Leave out servos whose position did not change
        #[arg(long)]
        skip_duplicates: bool,

        /// JSON indentation, 0 for compact
        #[arg(long, default_value = "2")]
        indent: usize,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}
