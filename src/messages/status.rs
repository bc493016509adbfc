use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    drivers::ds4::{
        driver::{
            BATTERY_FULL_CHARGING, BATTERY_MAX, MAX_VOLTAGE, STICK_CENTER, STICK_MAX,
            TOUCHPAD_MAX_X, TOUCHPAD_MAX_Y, TRIGGER_MAX,
        },
        hid_report::{ControllerState, TouchPoint},
    },
    schedule::SpeedSpecifier,
};

use super::{Header, Imu, Vector3};

/// Standard gravity in m/s²
const GRAVITY: f64 = 9.80665;
/// Accelerometer resolution of 0.98 mg per LSB at a 13-bit range
const ACCEL_RESOLUTION: f64 = 0.98;
const ACCEL_RANGE: f64 = ((1 << 13) - 1) as f64;
/// Full-scale gyroscope range in degrees per second at a 16-bit range
const GYRO_DPS: f64 = 2000.0;
const GYRO_RANGE: f64 = ((1 << 15) - 1) as f64;

/// Convert a raw stick value in [0, 255] to [-1.0, 1.0]. Values whose
/// magnitude falls inside the deadzone are reported as zero.
pub fn normalize_axis(value: u8, deadzone: f64) -> f64 {
    let normalized = 2.0 * (value as f64 - STICK_CENTER) / STICK_MAX;
    if normalized.abs() < deadzone {
        return 0.0;
    }
    normalized
}

/// Convert a raw accelerometer value to m/s²
pub fn to_mpss(value: i16) -> f64 {
    value as f64 / ACCEL_RANGE * GRAVITY * ACCEL_RESOLUTION
}

/// Convert a raw gyroscope value to rad/s
pub fn to_radps(value: i16) -> f64 {
    value as f64 / GYRO_RANGE * PI / 180.0 * GYRO_DPS
}

/// A touch with coordinates normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trackpad {
    pub id: u8,
    pub active: bool,
    pub x: f64,
    pub y: f64,
}

impl From<&TouchPoint> for Trackpad {
    fn from(touch: &TouchPoint) -> Self {
        Self {
            id: touch.id,
            active: touch.active,
            x: touch.x as f64 / TOUCHPAD_MAX_X,
            y: touch.y as f64 / TOUCHPAD_MAX_Y,
        }
    }
}

/// Normalized controller status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Status {
    pub header: Header,

    pub axis_left_x: f64,
    pub axis_left_y: f64,
    pub axis_right_x: f64,
    pub axis_right_y: f64,
    pub axis_l2: f64,
    pub axis_r2: f64,

    pub button_dpad_up: bool,
    pub button_dpad_down: bool,
    pub button_dpad_left: bool,
    pub button_dpad_right: bool,
    pub button_cross: bool,
    pub button_circle: bool,
    pub button_square: bool,
    pub button_triangle: bool,
    pub button_l1: bool,
    pub button_l2: bool,
    pub button_l3: bool,
    pub button_r1: bool,
    pub button_r2: bool,
    pub button_r3: bool,
    pub button_share: bool,
    pub button_options: bool,
    pub button_trackpad: bool,
    pub button_ps: bool,

    pub imu: Imu,

    pub battery_percentage: f64,
    pub battery_full_charging: bool,

    pub touch0: Trackpad,
    pub touch1: Trackpad,

    pub plug_usb: bool,
    pub plug_audio: bool,
    pub plug_mic: bool,
}

impl Status {
    /// Build a status from a decoded report. Stick signs are flipped to match
    /// the axis conventions of other joypads.
    pub fn from_state(
        state: &ControllerState,
        header: Header,
        imu_frame_id: &str,
        deadzone: f64,
    ) -> Self {
        let mut imu = Imu {
            header: Header {
                stamp: header.stamp,
                frame_id: imu_frame_id.to_string(),
            },
            linear_acceleration: Vector3 {
                x: to_mpss(state.motion_x),
                y: to_mpss(state.motion_y),
                z: to_mpss(state.motion_z),
            },
            angular_velocity: Vector3 {
                x: to_radps(state.orientation_roll),
                y: to_radps(state.orientation_yaw),
                z: to_radps(state.orientation_pitch),
            },
            ..Default::default()
        };
        // No orientation reported
        imu.orientation_covariance[0] = -1.0;

        let (battery_percentage, battery_full_charging) =
            if state.battery == BATTERY_FULL_CHARGING {
                (1.0, true)
            } else {
                let percentage = state.battery as f64 / BATTERY_MAX as f64;
                (percentage.min(1.0), false)
            };

        Self {
            header,
            axis_left_x: -normalize_axis(state.left_analog_x, deadzone),
            axis_left_y: -normalize_axis(state.left_analog_y, deadzone),
            axis_right_x: -normalize_axis(state.right_analog_x, deadzone),
            axis_right_y: -normalize_axis(state.right_analog_y, deadzone),
            axis_l2: state.l2_analog as f64 / TRIGGER_MAX,
            axis_r2: state.r2_analog as f64 / TRIGGER_MAX,
            button_dpad_up: state.dpad_up,
            button_dpad_down: state.dpad_down,
            button_dpad_left: state.dpad_left,
            button_dpad_right: state.dpad_right,
            button_cross: state.button_cross,
            button_circle: state.button_circle,
            button_square: state.button_square,
            button_triangle: state.button_triangle,
            button_l1: state.button_l1,
            button_l2: state.button_l2,
            button_l3: state.button_l3,
            button_r1: state.button_r1,
            button_r2: state.button_r2,
            button_r3: state.button_r3,
            button_share: state.button_share,
            button_options: state.button_options,
            button_trackpad: state.button_trackpad,
            button_ps: state.button_ps,
            imu,
            battery_percentage,
            battery_full_charging,
            touch0: Trackpad::from(&state.touch[0]),
            touch1: Trackpad::from(&state.touch[1]),
            plug_usb: state.plug_usb,
            plug_audio: state.plug_audio,
            plug_mic: state.plug_mic,
        }
    }

    /// Build a status carrying a commanded speed. Velocity drives the left
    /// stick's Y axis and turn drives the right stick's X axis. The battery
    /// reads full so consumers never see a low battery warning.
    pub fn from_speed(speed: SpeedSpecifier, header: Header, imu_frame_id: &str) -> Self {
        Self {
            header,
            axis_left_y: speed.velocity(),
            axis_right_x: speed.turn(),
            imu: Imu {
                header: Header::new(imu_frame_id),
                ..Default::default()
            },
            battery_percentage: 1.0,
            ..Default::default()
        }
    }

    pub fn to_joy(&self) -> Joy {
        let buttons = [
            self.button_square,
            self.button_triangle,
            self.button_circle,
            self.button_cross,
            self.button_l1,
            self.button_l2,
            self.button_r1,
            self.button_r2,
            self.button_share,
            self.button_options,
            self.button_ps,
            self.button_trackpad,
            self.button_l3,
            self.button_r3,
            self.button_dpad_left,
            self.button_dpad_up,
            self.button_dpad_right,
            self.button_dpad_down,
        ];

        Joy {
            header: self.header.clone(),
            axes: vec![
                self.axis_left_x,
                self.axis_left_y,
                self.axis_right_x,
                self.axis_right_y,
                self.axis_l2,
                self.axis_r2,
            ],
            buttons: buttons.iter().map(|pressed| *pressed as i32).collect(),
        }
    }

    pub fn to_battery_state(&self) -> BatteryState {
        let power_supply_status = if !self.plug_usb {
            PowerSupplyStatus::NotCharging
        } else if !self.battery_full_charging {
            PowerSupplyStatus::Charging
        } else {
            PowerSupplyStatus::Full
        };

        BatteryState {
            header: self.header.clone(),
            voltage: MAX_VOLTAGE * self.battery_percentage,
            current: f64::NAN,
            charge: f64::NAN,
            capacity: f64::NAN,
            design_capacity: 1.0,
            percentage: self.battery_percentage,
            power_supply_status,
            power_supply_technology: PowerSupplyTechnology::Lion,
            present: true,
        }
    }
}

/// Generic joypad message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Joy {
    pub header: Header,
    pub axes: Vec<f64>,
    pub buttons: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSupplyStatus {
    #[default]
    Unknown,
    Charging,
    Discharging,
    NotCharging,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSupplyTechnology {
    #[default]
    Unknown,
    Nimh,
    Lion,
    Lipo,
    Life,
    Nicd,
    Limn,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryState {
    pub header: Header,
    /// Volts
    pub voltage: f64,
    /// Amperes, NaN when unknown
    pub current: f64,
    /// Ah, NaN when unknown
    pub charge: f64,
    /// Ah, NaN when unknown
    pub capacity: f64,
    pub design_capacity: f64,
    /// Charge in [0, 1]
    pub percentage: f64,
    pub power_supply_status: PowerSupplyStatus,
    pub power_supply_technology: PowerSupplyTechnology,
    pub present: bool,
}
