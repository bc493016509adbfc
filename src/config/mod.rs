pub mod path;

use std::{io, path::Path, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    drivers::ds4::driver::Transport,
    schedule::{driver::DEFAULT_TICK, Schedule, ScheduleError},
};

/// Default status frame id
pub const DEFAULT_FRAME_ID: &str = "ds4";
/// Default IMU frame id
pub const DEFAULT_IMU_FRAME_ID: &str = "ds4_imu";
/// Default stick deadzone
pub const DEFAULT_DEADZONE: f64 = 0.1;

/// Represents all possible errors loading a [DriverConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// [DriverConfig] describes which controller to open, how its status is
/// published and which schedule to run.
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DriverConfig {
    pub version: u32,
    pub kind: String,
    pub name: String,
    pub device: Option<DeviceConfig>,
    pub status: Option<StatusConfig>,
    pub schedule: Option<ScheduleConfig>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            version: 1,
            kind: "DriverConfig".to_string(),
            name: "DualShock 4".to_string(),
            device: None,
            status: None,
            schedule: None,
        }
    }
}

impl DriverConfig {
    /// Load a [DriverConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<DriverConfig, LoadError> {
        let config: DriverConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [DriverConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<DriverConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: DriverConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Returns the status settings, or the defaults if none are configured
    pub fn status(&self) -> StatusConfig {
        self.status.clone().unwrap_or_default()
    }

    /// Returns the schedule settings, or the defaults if none are configured
    pub fn schedule(&self) -> ScheduleConfig {
        self.schedule.clone().unwrap_or_default()
    }
}

/// Backend used to talk to the controller
#[derive(Default, Debug, Deserialize, Serialize, Clone, Copy, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceBackend {
    /// A hidraw device node, e.g. "/dev/hidraw0"
    #[default]
    Hidraw,
    /// A file or FIFO of recorded USB input reports
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DeviceConfig {
    pub path: String,
    #[serde(default)]
    pub backend: DeviceBackend,
    /// Framing of the reports in a file device. Hidraw devices detect it.
    #[serde(default)]
    pub transport: Transport,
    /// Name used in log messages, e.g. "USB Controller (name)"
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct StatusConfig {
    pub frame_id: Option<String>,
    pub imu_frame_id: Option<String>,
    /// Stick values whose normalized magnitude is below this are reported as 0
    pub deadzone: Option<f64>,
}

impl StatusConfig {
    pub fn frame_id(&self) -> String {
        self.frame_id
            .clone()
            .unwrap_or_else(|| DEFAULT_FRAME_ID.to_string())
    }

    pub fn imu_frame_id(&self) -> String {
        self.imu_frame_id
            .clone()
            .unwrap_or_else(|| DEFAULT_IMU_FRAME_ID.to_string())
    }

    pub fn deadzone(&self) -> f64 {
        self.deadzone.unwrap_or(DEFAULT_DEADZONE)
    }
}

/// Schedule to run. When more than one form is given, `checkpoints` wins over
/// `segments`, which wins over `oscillate`. With none of them the default
/// back-and-forth pattern is used.
#[derive(Debug, Default, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// Interval between two samples in milliseconds
    pub tick_ms: Option<u64>,
    pub oscillate: Option<OscillateConfig>,
    pub segments: Option<Vec<SegmentConfig>>,
    pub checkpoints: Option<Vec<CheckpointConfig>>,
}

impl ScheduleConfig {
    /// Build the configured [Schedule]
    pub fn build(&self) -> Result<Schedule, ScheduleError> {
        if let Some(checkpoints) = self.checkpoints.as_ref() {
            let checkpoints: Vec<(f64, f64, f64)> = checkpoints
                .iter()
                .map(|c| (c.time, c.velocity, c.turn.unwrap_or_default()))
                .collect();
            return Schedule::from_checkpoints(&checkpoints);
        }
        if let Some(segments) = self.segments.as_ref() {
            let segments: Vec<(f64, f64, f64)> = segments
                .iter()
                .map(|s| (s.duration, s.velocity, s.turn.unwrap_or_default()))
                .collect();
            return Schedule::from_segments(&segments);
        }
        let oscillate = self.oscillate.clone().unwrap_or_default();
        Schedule::oscillating(
            oscillate.cycles,
            oscillate.duration,
            oscillate.velocity,
            oscillate.turn.unwrap_or_default(),
        )
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK)
    }
}

/// Back-and-forth pattern of `cycles` pairs of segments
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct OscillateConfig {
    pub cycles: usize,
    /// Seconds per segment
    pub duration: f64,
    pub velocity: f64,
    pub turn: Option<f64>,
}

impl Default for OscillateConfig {
    fn default() -> Self {
        Self {
            cycles: 6,
            duration: 2.4,
            velocity: -0.5,
            turn: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SegmentConfig {
    /// Seconds
    pub duration: f64,
    pub velocity: f64,
    pub turn: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Seconds since the schedule started
    pub time: f64,
    pub velocity: f64,
    pub turn: Option<f64>,
}
