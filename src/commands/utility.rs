//! Utility command handlers.

use std::path::PathBuf;

use anyhow::bail;
use servo_animation::config::AppConfig;

use super::CommandResult;

/// Write a default config file
pub fn init(path: &PathBuf, force: bool) -> CommandResult {
    if path.exists() && !force {
        bail!(
            "Config {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    AppConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
