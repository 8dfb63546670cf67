//! Shared test doubles: recording transport, connector, host and scene.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use servo_live::{
    ActiveBone, ConnectionParams, Connector, Host, LiveController, LiveSettings, ReportLevel,
    RotationAxis, SceneGraph, ServoChannel, TransportType,
};
use servo_transport::{
    BoxedTransport, ServoCommand, Transport, TransportDeviceInfo, TransportError,
};

#[derive(Default)]
struct WireState {
    frames: Vec<Vec<u8>>,
    fail_after: Option<usize>,
    open: bool,
    closes: usize,
    opens: usize,
}

/// The far end of a mock transport, shared with the test
#[derive(Clone, Default)]
pub struct Wire(Arc<Mutex<WireState>>);

impl Wire {
    /// Every command written so far
    pub fn commands(&self) -> Vec<ServoCommand> {
        self.0
            .lock()
            .frames
            .iter()
            .map(|frame| ServoCommand::parse(frame).unwrap())
            .collect()
    }

    /// Positions written for one servo, in order
    pub fn positions(&self, servo_id: u8) -> Vec<u16> {
        self.commands()
            .into_iter()
            .filter(|cmd| cmd.servo_id == servo_id)
            .map(|cmd| cmd.position)
            .collect()
    }

    pub fn frame_count(&self) -> usize {
        self.0.lock().frames.len()
    }

    pub fn raw_frames(&self) -> Vec<Vec<u8>> {
        self.0.lock().frames.clone()
    }

    pub fn clear(&self) {
        self.0.lock().frames.clear();
    }

    /// Fail every write once `count` frames have been written in total
    pub fn fail_after(&self, count: usize) {
        self.0.lock().fail_after = Some(count);
    }

    /// Simulate the device vanishing without a write error
    pub fn set_open(&self, open: bool) {
        self.0.lock().open = open;
    }

    pub fn is_open(&self) -> bool {
        self.0.lock().open
    }

    pub fn close_count(&self) -> usize {
        self.0.lock().closes
    }

    pub fn open_count(&self) -> usize {
        self.0.lock().opens
    }
}

pub struct MockTransport {
    wire: Wire,
    info: TransportDeviceInfo,
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.wire.0.lock();
        if !state.open {
            return Err(TransportError::Disconnected);
        }
        if state.fail_after.is_some_and(|limit| state.frames.len() >= limit) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }
        state.frames.push(bytes.to_vec());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.wire.is_open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.wire.0.lock();
        state.open = false;
        state.closes += 1;
        Ok(())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }
}

/// Connector handing out [`MockTransport`]s on a shared wire
#[derive(Clone, Default)]
pub struct MockConnector {
    pub wire: Wire,
    pub fail_open: bool,
    pub unavailable: Option<TransportType>,
}

impl MockConnector {
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Default::default()
        }
    }
}

impl Connector for MockConnector {
    fn available(&self, transport_type: TransportType) -> bool {
        self.unavailable != Some(transport_type)
    }

    fn open(&self, params: &ConnectionParams) -> Result<BoxedTransport, TransportError> {
        if self.fail_open {
            return Err(TransportError::PortNotFound(params.to_string()));
        }
        {
            let mut state = self.wire.0.lock();
            state.open = true;
            state.opens += 1;
        }
        Ok(Box::new(MockTransport {
            wire: self.wire.clone(),
            info: TransportDeviceInfo::from_params(params),
        }))
    }
}

/// Host recording reports and handler registration
#[derive(Default)]
pub struct MockHost {
    pub reports: RefCell<Vec<(ReportLevel, String)>>,
    pub registered: Cell<i32>,
    pub playing: Cell<bool>,
    pub cancels: Cell<u32>,
    pub progress_updates: Cell<u32>,
}

impl MockHost {
    pub fn reports_at(&self, level: ReportLevel) -> Vec<String> {
        self.reports
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Host for MockHost {
    fn report(&self, level: ReportLevel, message: &str) {
        self.reports.borrow_mut().push((level, message.to_string()));
    }

    fn is_animation_playing(&self) -> bool {
        self.playing.get()
    }

    fn cancel_playback(&self) {
        self.playing.set(false);
        self.cancels.set(self.cancels.get() + 1);
    }

    fn register_update_handler(&self) {
        self.registered.set(self.registered.get() + 1);
    }

    fn unregister_update_handler(&self) {
        self.registered.set(self.registered.get() - 1);
    }

    fn progress_update(&self, _value: i64) {
        self.progress_updates.set(self.progress_updates.get() + 1);
    }
}

/// Scene with fixed rotations, optionally overridden per frame
pub struct StaticScene {
    pub name: String,
    pub fps: u32,
    pub frame_range: (i32, i32),
    pub frame: i32,
    pub bones: Vec<ActiveBone>,
    rotations: HashMap<String, f64>,
    keyed: HashMap<(String, i32), f64>,
    pub frames_visited: Vec<i32>,
}

impl StaticScene {
    pub fn new(bones: Vec<ActiveBone>) -> Self {
        Self {
            name: "Scene".into(),
            fps: 24,
            frame_range: (1, 1),
            frame: 1,
            bones,
            rotations: HashMap::new(),
            keyed: HashMap::new(),
            frames_visited: Vec::new(),
        }
    }

    /// Constant rotation for `bone` on every frame
    pub fn set_rotation(&mut self, bone: &str, degrees: f64) {
        self.rotations.insert(bone.to_string(), degrees);
    }

    /// Rotation for `bone` at one frame
    pub fn key(&mut self, bone: &str, frame: i32, degrees: f64) {
        self.keyed.insert((bone.to_string(), frame), degrees);
    }
}

impl SceneGraph for StaticScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn frame_range(&self) -> (i32, i32) {
        self.frame_range
    }

    fn current_frame(&self) -> i32 {
        self.frame
    }

    fn set_frame(&mut self, frame: i32) {
        self.frame = frame;
        self.frames_visited.push(frame);
    }

    fn active_bones(&self) -> Vec<ActiveBone> {
        self.bones.clone()
    }

    fn bone_rotation(&self, bone: &ActiveBone, _axis: RotationAxis) -> f64 {
        self.keyed
            .get(&(bone.name.clone(), self.frame))
            .or_else(|| self.rotations.get(&bone.name))
            .copied()
            .unwrap_or(0.0)
    }
}

/// 0..180 positions over a 180 degree range: position equals servo angle
pub fn degree_channel(servo_id: u8) -> ServoChannel {
    ServoChannel {
        position_min: 0,
        position_max: 180,
        neutral_angle: 90,
        rotation_range: 180,
        ..ServoChannel::new(servo_id)
    }
}

pub fn bone(name: &str, channel: ServoChannel) -> ActiveBone {
    ActiveBone::new("Armature", name, channel)
}

/// Controller without ramp delays
pub fn controller(connector: MockConnector) -> LiveController {
    let controller = LiveController::new(connector);
    controller.set_settings(LiveSettings {
        step_delay: std::time::Duration::ZERO,
        ..LiveSettings::default()
    });
    controller
}

pub fn serial_params() -> ConnectionParams {
    ConnectionParams::serial("/dev/ttyMOCK0", servo_live::BaudRate::B115200)
}
