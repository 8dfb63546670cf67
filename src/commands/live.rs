//! Command handlers that drive servos.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use servo_animation::config::AppConfig;
use servo_animation::host::HeadlessHost;
use servo_animation::scene::KeyframeScene;
use servo_live::{CalibrationSession, Connector, DriveOutcome, SceneGraph};
use servo_transport::{PrinterConfig, ServoCommand, Transport};
use tracing::{debug, info, warn};

use super::{live_controller, setup_interrupt_handler, system_connector, CommandResult};

/// Play the scene in live mode until the last frame or Ctrl+C
pub fn live(
    config: &AppConfig,
    printer_config: Option<PrinterConfig>,
    start: Option<i32>,
    end: Option<i32>,
    loop_playback: bool,
) -> CommandResult {
    let params = config.connection_params()?;
    let controller = Arc::new(live_controller(config, printer_config));
    let host = HeadlessHost::new(config.live.headless);
    let mut scene = KeyframeScene::from_config(config);

    let (scene_start, scene_end) = scene.frame_range();
    let first = start.unwrap_or(scene_start);
    let last = end.unwrap_or(scene_end);
    if last < first {
        bail!("Last frame {} is before first frame {}", last, first);
    }
    if config.scene.fps == 0 {
        bail!("scene.fps must be greater than 0");
    }
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(config.scene.fps));

    scene.set_frame(first);
    controller.start(params, &scene, &host)?;

    let running = setup_interrupt_handler(Arc::clone(&controller));
    println!(
        "Playing frames {}..={} at {} fps (Ctrl+C to stop)",
        first, last, config.scene.fps
    );

    host.start_playback();
    let mut frame = first;
    while running.load(Ordering::SeqCst) {
        let frame_started = Instant::now();
        scene.set_frame(frame);

        match controller.handle_update(&scene, &host) {
            DriveOutcome::Disconnected => bail!("Connection lost at frame {}", frame),
            DriveOutcome::Smoothed { steps, .. } => {
                debug!("Frame {}: ramped {} steps", frame, steps);
            }
            _ => {}
        }
        if !controller.is_connected() {
            break;
        }
        if host.playback_cancelled() {
            // Jump ramp stopped playback; pick it up again from here
            host.start_playback();
        }

        frame += 1;
        if frame > last {
            if !loop_playback {
                break;
            }
            frame = first;
        }

        if let Some(remaining) = frame_time.checked_sub(frame_started.elapsed()) {
            thread::sleep(remaining);
        }
    }
    host.stop_playback();

    if controller.is_connected() {
        controller.stop(&host, false)?;
    }
    Ok(())
}

/// Send one position to a servo
pub fn send(
    config: &AppConfig,
    printer_config: Option<PrinterConfig>,
    servo_id: u8,
    position: u16,
) -> CommandResult {
    let params = config.connection_params()?;
    let connector = system_connector(config, printer_config);

    let mut transport = connector
        .open(&params)
        .with_context(|| format!("Failed to open {}", params))?;
    let result = transport.send_command(&ServoCommand::new(servo_id, position));
    if let Err(e) = transport.close() {
        warn!("Error closing {}: {}", params, e);
    }
    result?;

    println!("Sent position {} to servo {}", position, servo_id);
    Ok(())
}

/// Bounds to move to during calibration
pub struct CalibrateOptions {
    pub min: Option<u16>,
    pub max: Option<u16>,
    /// Time each bound is held before moving on
    pub hold: Duration,
}

/// Calibrate a servo's min/max and write them into `config`
pub fn calibrate(
    config: &mut AppConfig,
    printer_config: Option<PrinterConfig>,
    servo_id: u8,
    options: &CalibrateOptions,
) -> CommandResult {
    if config.servo(servo_id).is_none() {
        bail!("No servo with ID {} in the config", servo_id);
    }
    if options.min.is_none() && options.max.is_none() {
        bail!("Nothing to calibrate: pass --min and/or --max");
    }

    let params = config.connection_params()?;
    let controller = live_controller(config, printer_config);
    let host = HeadlessHost::new(config.live.headless);
    let scene = KeyframeScene::from_config(config);

    // Drives the current pose, so the servo has a last position
    controller.start(params, &scene, &host)?;

    let calibrated = {
        let mut session = CalibrationSession::begin(&controller, &scene, &host, servo_id)?;
        if let Some(min) = options.min {
            session.send_min(min)?;
            info!("Servo {} at min position {}", servo_id, session.position_min());
            thread::sleep(options.hold);
        }
        if let Some(max) = options.max {
            session.send_max(max)?;
            info!("Servo {} at max position {}", servo_id, session.position_max());
            thread::sleep(options.hold);
        }

        let entry = config
            .servo(servo_id)
            .with_context(|| format!("No servo with ID {} in the config", servo_id))?;
        let mut channel = entry.channel.clone();
        if options.min.is_some() {
            channel.position_min = session.position_min();
        }
        if options.max.is_some() {
            channel.position_max = session.position_max();
        }
        session.finish();
        channel
    };

    if controller.is_connected() {
        controller.stop(&host, false)?;
    }

    calibrated.validate()?;
    println!(
        "Servo {}: min {} max {}",
        servo_id, calibrated.position_min, calibrated.position_max
    );
    if let Some(entry) = config.servo_mut(servo_id) {
        entry.channel = calibrated;
    }
    Ok(())
}
