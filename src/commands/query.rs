//! Read-only command handlers.

use anyhow::bail;
use servo_animation::config::AppConfig;
use servo_animation::scene::KeyframeScene;
use servo_live::{active_channels, calculate_position, duplicate_servo_ids, SceneGraph};
use servo_transport::{discover_serial_ports, transport_available, TransportType};

use super::CommandResult;

/// List serial ports
pub fn ports() -> CommandResult {
    if !transport_available(TransportType::Serial) {
        println!("Serial support is not compiled in");
        return Ok(());
    }

    let ports = discover_serial_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("Serial ports:");
    for port in ports {
        println!("  {:<24} {}", port.name, port.kind);
    }
    Ok(())
}

/// Validate the config
pub fn check(config: &AppConfig) -> CommandResult {
    let scene = KeyframeScene::from_config(config);
    let mut problems = config.problems();
    problems.extend(
        duplicate_servo_ids(&scene)
            .into_iter()
            .map(|e| e.to_string()),
    );

    match config.connection_params() {
        Ok(params) => println!("Live mode target: {}", params),
        Err(e) => println!("Live mode target: not usable ({})", e),
    }
    println!(
        "Scene '{}': frames {}..={} at {} fps, {} active bones",
        config.scene.name,
        config.scene.frame_start,
        config.scene.frame_end,
        config.scene.fps,
        scene.active_bones().len()
    );

    if problems.is_empty() {
        println!("Config OK");
        return Ok(());
    }

    for problem in &problems {
        println!("  - {}", problem);
    }
    bail!("{} problem(s) found", problems.len())
}

/// Print the positions of one frame
pub fn positions(config: &AppConfig, frame: Option<i32>, precision: u32) -> CommandResult {
    let mut scene = KeyframeScene::from_config(config);
    if let Some(frame) = frame {
        scene.set_frame(frame);
    }

    println!("Frame {}:", scene.current_frame());
    for bone in active_channels(&scene) {
        let channel = &bone.channel;
        let rotation = scene.bone_rotation(&bone, channel.rotation_axis);
        match calculate_position(rotation, channel, precision) {
            Ok(result) => println!(
                "  servo {:3}  {:<20} {:>8.*}  angle {:>7.2}{}",
                channel.servo_id,
                bone.label(),
                precision as usize,
                result.position,
                result.angle,
                if result.in_range { "" } else { "  (out of range)" }
            ),
            Err(e) => println!("  servo {:3}  {:<20} {}", channel.servo_id, bone.label(), e),
        }
    }
    Ok(())
}
