//! Export command handler.

use std::path::Path;

use servo_animation::config::AppConfig;
use servo_animation::host::HeadlessHost;
use servo_animation::scene::KeyframeScene;
use servo_live::{ExportFormat, ExportOptions, Exporter};

use super::CommandResult;
use crate::cli::FileFormat;

/// Output format from the flag, else from the file extension
fn resolve_format(file: &Path, format: Option<FileFormat>) -> ExportFormat {
    match format {
        Some(FileFormat::Bin) => ExportFormat::Binary,
        Some(FileFormat::Json) => ExportFormat::Json,
        None => file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default(),
    }
}

/// Export every frame of the scene to `file`
pub fn export(
    config: &AppConfig,
    file: &Path,
    format: Option<FileFormat>,
    precision: u32,
    skip_duplicates: bool,
    indent: usize,
) -> CommandResult {
    let mut scene = KeyframeScene::from_config(config);
    let host = HeadlessHost::new(true);
    let options = ExportOptions {
        format: resolve_format(file, format),
        precision,
        skip_duplicates,
        indent: (indent > 0).then_some(indent),
    };

    let summary = Exporter::new().export(&mut scene, &host, file, &options)?;
    println!(
        "Wrote {} frames ({} bytes) to {}",
        summary.frames,
        summary.bytes,
        file.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            resolve_format(Path::new("out.json"), None),
            ExportFormat::Json
        );
        assert_eq!(
            resolve_format(Path::new("out.bin"), None),
            ExportFormat::Binary
        );
        assert_eq!(resolve_format(Path::new("out"), None), ExportFormat::Binary);
        assert_eq!(
            resolve_format(Path::new("out.json"), Some(FileFormat::Bin)),
            ExportFormat::Binary
        );
    }
}
