//! Frame-scan export of servo positions
//!
//! Every frame of the scene is evaluated and converted; any out-of-range
//! position or invalid channel aborts the whole export before a file is
//! written.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use servo_transport::encode;
use tracing::{debug, info, warn};

use crate::controller::LiveController;
use crate::converter::{calculate_position, round_to};
use crate::error::LiveError;
use crate::host::{Host, ReportLevel};
use crate::registry::{active_channels, SceneGraph};

/// Servo ID to position for one frame
pub type FramePositions = BTreeMap<u8, f64>;

/// Evaluate every frame and collect positions
///
/// With `skip_duplicates`, a servo is left out of a frame when its position
/// equals the one last recorded for it. The scene is returned to its
/// original frame afterwards, also on failure.
pub fn calculate_positions<S, H>(
    scene: &mut S,
    host: &H,
    precision: u32,
    skip_duplicates: bool,
) -> Result<Vec<FramePositions>, LiveError>
where
    S: SceneGraph + ?Sized,
    H: Host + ?Sized,
{
    let original_frame = scene.current_frame();
    let result = scan_frames(scene, host, precision, skip_duplicates);
    scene.set_frame(original_frame);
    result
}

fn scan_frames<S, H>(
    scene: &mut S,
    host: &H,
    precision: u32,
    skip_duplicates: bool,
) -> Result<Vec<FramePositions>, LiveError>
where
    S: SceneGraph + ?Sized,
    H: Host + ?Sized,
{
    let bones = active_channels(scene);
    for bone in &bones {
        bone.channel.validate()?;
    }

    let (start, end) = scene.frame_range();
    let mut positions = Vec::new();
    let mut last_positions: BTreeMap<u8, f64> = BTreeMap::new();

    host.progress_begin(i64::from(start), i64::from(end) + 1);

    for frame in start..=end {
        scene.set_frame(frame);
        let mut frame_positions = FramePositions::new();

        for bone in &bones {
            let channel = &bone.channel;
            let rotation = scene.bone_rotation(bone, channel.rotation_axis);
            let result = match calculate_position(rotation, channel, precision) {
                Ok(result) => result,
                Err(e) => {
                    host.progress_end();
                    return Err(e.into());
                }
            };

            if !result.in_range {
                host.progress_end();
                return Err(LiveError::OutOfRange {
                    servo_id: channel.servo_id,
                    position: result.position,
                    frame,
                });
            }

            if skip_duplicates && last_positions.get(&channel.servo_id) == Some(&result.position) {
                continue;
            }

            frame_positions.insert(channel.servo_id, result.position);
            last_positions.insert(channel.servo_id, result.position);
        }

        positions.push(frame_positions);
        host.progress_update(i64::from(frame));
    }

    host.progress_end();
    Ok(positions)
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Concatenated 5-byte commands, frame by frame
    #[default]
    Binary,
    /// Positions with scene metadata
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Binary => "bin",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bin" | "binary" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Decimal digits kept; binary output needs 0
    pub precision: u32,
    pub skip_duplicates: bool,
    /// JSON indentation in spaces, `None` for compact output
    pub indent: Option<usize>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Binary,
            precision: 0,
            skip_duplicates: false,
            indent: Some(2),
        }
    }
}

/// Highest precision accepted for export
pub const MAX_PRECISION: u32 = 6;

/// Result of a finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub frames: usize,
    pub bytes: usize,
    pub duration: Duration,
}

/// Timing metadata of a scene: fps, frame count, rounded seconds
pub fn time_meta<S: SceneGraph + ?Sized>(scene: &S) -> (u32, u32, u32) {
    let fps = scene.fps();
    let (start, end) = scene.frame_range();
    let frames = u32::try_from(end - start + 1).unwrap_or(0);
    let seconds = if fps == 0 {
        0
    } else {
        round_to(f64::from(frames) / f64::from(fps), 0) as u32
    };
    (fps, frames, seconds)
}

/// Binary output: one 5-byte command per servo per frame
pub fn binary_content(positions: &[FramePositions]) -> Result<Vec<u8>, LiveError> {
    let mut bytes = Vec::new();
    for frame in positions {
        for (&servo_id, &position) in frame {
            if position.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&position) {
                return Err(LiveError::Export(format!(
                    "position {position} of servo {servo_id} does not fit a binary command"
                )));
            }
            bytes.extend_from_slice(&encode(servo_id, position as u16));
        }
    }
    Ok(bytes)
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    description: &'static str,
    fps: u32,
    frames: u32,
    seconds: u32,
    bones: usize,
    scene: &'a str,
    positions: Vec<BTreeMap<u8, serde_json::Value>>,
}

/// JSON output with scene metadata
///
/// Whole numbers are written as integers when `precision` is 0.
pub fn json_content<S: SceneGraph + ?Sized>(
    scene: &S,
    positions: &[FramePositions],
    precision: u32,
    indent: Option<usize>,
) -> Result<Vec<u8>, LiveError> {
    let (fps, frames, seconds) = time_meta(scene);
    let document = JsonDocument {
        description: "Servo Animation Positions",
        fps,
        frames,
        seconds,
        bones: positions.first().map_or(0, |frame| frame.len()),
        scene: scene.name(),
        positions: positions
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|(&id, &pos)| {
                        let value = if precision == 0 {
                            serde_json::Value::from(pos as i64)
                        } else {
                            serde_json::Value::from(pos)
                        };
                        (id, value)
                    })
                    .collect()
            })
            .collect(),
    };

    match indent {
        Some(width) => {
            let indent = vec![b' '; width];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut out = Vec::new();
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            document.serialize(&mut serializer)?;
            Ok(out)
        }
        None => Ok(serde_json::to_vec(&document)?),
    }
}

/// Runs exports, pausing live mode around the frame scan
pub struct Exporter<'a> {
    controller: Option<&'a LiveController>,
}

impl<'a> Exporter<'a> {
    /// Exporter without a live controller
    pub fn new() -> Self {
        Self { controller: None }
    }

    /// Pause `controller` while exporting, if it is connected
    pub fn with_live_controller(controller: &'a LiveController) -> Self {
        Self {
            controller: Some(controller),
        }
    }

    /// Scan the scene and write `path`
    ///
    /// Live mode is stopped for the scan and restarted with the same
    /// parameters afterwards, whether or not the export succeeded.
    pub fn export<S, H>(
        &self,
        scene: &mut S,
        host: &H,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<ExportSummary, LiveError>
    where
        S: SceneGraph + ?Sized,
        H: Host + ?Sized,
    {
        if options.precision > MAX_PRECISION {
            return Err(LiveError::Export(format!(
                "precision {} exceeds {}",
                options.precision, MAX_PRECISION
            )));
        }
        if options.format == ExportFormat::Binary && options.precision != 0 {
            return Err(LiveError::Export(
                "binary export requires precision 0".into(),
            ));
        }

        let started = Instant::now();
        let paused = self.pause(host);

        let result = calculate_positions(scene, host, options.precision, options.skip_duplicates)
            .and_then(|positions| {
                let content = match options.format {
                    ExportFormat::Binary => binary_content(&positions)?,
                    ExportFormat::Json => {
                        json_content(&*scene, &positions, options.precision, options.indent)?
                    }
                };
                std::fs::write(path, &content)?;
                Ok(ExportSummary {
                    frames: positions.len(),
                    bytes: content.len(),
                    duration: started.elapsed(),
                })
            });

        if let (Some(controller), Some(params)) = (self.controller, paused) {
            debug!("Resuming live mode after export");
            if let Err(e) = controller.start(params, &*scene, host) {
                warn!("Could not resume live mode: {}", e);
            }
        }

        match &result {
            Ok(summary) => {
                info!(
                    "Exported {} frames to {} in {:?}",
                    summary.frames,
                    path.display(),
                    summary.duration
                );
                host.report(
                    ReportLevel::Info,
                    &format!(
                        "Animation servo positions exported after {} seconds",
                        summary.duration.as_secs()
                    ),
                );
            }
            Err(e) => host.report(ReportLevel::Error, &e.to_string()),
        }

        result
    }

    fn pause<H: Host + ?Sized>(&self, host: &H) -> Option<servo_transport::ConnectionParams> {
        let controller = self.controller?;
        if !controller.is_connected() {
            return None;
        }
        let params = controller.connection_params()?;
        debug!("Pausing live mode for export");
        controller.stop(host, false).ok()?;
        Some(params)
    }
}

impl Default for Exporter<'_> {
    fn default() -> Self {
        Self::new()
    }
}
