use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    control::ControlState,
    device::{Device, DeviceError},
    hid_report::ControllerState,
};

// Source: https://github.com/torvalds/linux/blob/master/drivers/hid/hid-playstation.c
pub const DS4_NAME: &str = "Sony Interactive Entertainment Wireless Controller";
pub const DS4_VID: u16 = 0x054c;
pub const DS4_PID: u16 = 0x05c4;
pub const DS4_V2_PID: u16 = 0x09cc;
pub const DS4_DONGLE_PID: u16 = 0x0ba0;

pub const PIDS: [u16; 3] = [DS4_PID, DS4_V2_PID, DS4_DONGLE_PID];

pub const INPUT_REPORT_USB: u8 = 0x01;
pub const INPUT_REPORT_USB_SIZE: usize = 64;
pub const INPUT_REPORT_BT: u8 = 0x11;
pub const INPUT_REPORT_BT_SIZE: usize = 79;
/// Number of leading bytes cut off Bluetooth input reports before parsing
pub const INPUT_REPORT_BT_HEADER_SIZE: usize = 2;
pub const OUTPUT_REPORT_USB: u8 = 0x05;
pub const OUTPUT_REPORT_USB_SIZE: usize = 31;
pub const OUTPUT_REPORT_BT: u8 = 0x11;
pub const OUTPUT_REPORT_BT_SIZE: usize = 77;

// Input report ranges
pub const STICK_CENTER: f64 = 127.5;
pub const STICK_MAX: f64 = u8::MAX as f64;
pub const TRIGGER_MAX: f64 = u8::MAX as f64;
pub const TOUCHPAD_MAX_X: f64 = 1919.0;
pub const TOUCHPAD_MAX_Y: f64 = 942.0;

// Battery levels
pub const BATTERY_MAX: u8 = 8;
pub const BATTERY_FULL_CHARGING: u8 = 11;
pub const MAX_VOLTAGE: f64 = 3.7;

/// Physical transport a DualShock 4 is connected over. The transport decides
/// the framing of both input and output reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    #[default]
    Usb,
    Bluetooth,
}

impl Transport {
    /// Report id expected in the first byte of a raw input report
    pub fn input_report_id(&self) -> u8 {
        match self {
            Transport::Usb => INPUT_REPORT_USB,
            Transport::Bluetooth => INPUT_REPORT_BT,
        }
    }

    /// Minimum size of a raw input report
    pub fn input_report_size(&self) -> usize {
        match self {
            Transport::Usb => INPUT_REPORT_USB_SIZE,
            Transport::Bluetooth => INPUT_REPORT_BT_SIZE,
        }
    }

    /// Number of bytes to skip before the input state starts
    pub fn input_header_size(&self) -> usize {
        match self {
            Transport::Usb => 0,
            Transport::Bluetooth => INPUT_REPORT_BT_HEADER_SIZE,
        }
    }

    pub fn output_report_id(&self) -> u8 {
        match self {
            Transport::Usb => OUTPUT_REPORT_USB,
            Transport::Bluetooth => OUTPUT_REPORT_BT,
        }
    }

    pub fn output_report_size(&self) -> usize {
        match self {
            Transport::Usb => OUTPUT_REPORT_USB_SIZE,
            Transport::Bluetooth => OUTPUT_REPORT_BT_SIZE,
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Usb => write!(f, "USB"),
            Transport::Bluetooth => write!(f, "Bluetooth"),
        }
    }
}

/// DualShock 4 controller driver for reading input reports and controlling
/// the light bar and rumble motors. The driver owns the [ControlState] and
/// serializes every change to it before writing an output report.
pub struct Driver<D: Device> {
    device: D,
    device_name: String,
    control: ControlState,
}

impl<D: Device> Driver<D> {
    pub fn new(device: D, device_name: impl Into<String>) -> Self {
        Self {
            device,
            device_name: device_name.into(),
            control: ControlState::default(),
        }
    }

    /// Returns the underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Returns the current output state of the controller
    pub fn control(&self) -> &ControlState {
        &self.control
    }

    /// Human readable name of the controller, e.g. "USB Controller (ds4)"
    pub fn name(&self) -> String {
        format!(
            "{} Controller ({})",
            self.device.transport(),
            self.device_name
        )
    }

    /// Poll the device and decode the next input report
    pub fn poll(&mut self) -> Result<ControllerState, DeviceError> {
        // Read data from the device into a buffer
        let mut buf = [0; INPUT_REPORT_BT_SIZE];
        let bytes_read = self.device.read_raw(&mut buf[..])?;
        if bytes_read == 0 {
            return Err(DeviceError::Disconnected);
        }
        let slice = &buf[..bytes_read];

        let state = self.device.decode(slice)?;
        log::trace!("Decoded input report: {state:?}");

        Ok(state)
    }

    /// Writes the current output state to the gamepad
    pub fn write(&mut self) -> Result<(), DeviceError> {
        self.device.transmit(&self.control)
    }

    /// Apply the given change to the output state and write it to the gamepad.
    /// Returns whatever the update function returns.
    pub fn update<F, R>(&mut self, update: F) -> Result<R, DeviceError>
    where
        F: FnOnce(&mut ControlState) -> R,
    {
        let result = update(&mut self.control);
        self.write()?;
        Ok(result)
    }

    /// Set the color of the light bar to the given value
    pub fn set_led(&mut self, red: u32, green: u32, blue: u32) -> Result<(), DeviceError> {
        log::debug!("Setting LED color to: {red}, {green}, {blue}");
        self.update(|control| control.set_led(red, green, blue))
    }

    /// Sets the intensity of the rumble motors
    pub fn rumble(&mut self, small: u32, big: u32) -> Result<(), DeviceError> {
        log::trace!("Setting rumble to: {small}, {big}");
        self.update(|control| control.set_rumble(small, big))
    }

    /// Starts flashing the light bar. Does nothing if it is already flashing.
    pub fn start_led_flash(&mut self, on: u32, off: u32) -> Result<(), DeviceError> {
        if !self.control.start_flash(on, off) {
            return Ok(());
        }
        log::debug!("Starting LED flash: {on} on, {off} off");
        self.write()
    }

    /// Stops flashing the light bar
    pub fn stop_led_flash(&mut self) -> Result<(), DeviceError> {
        if !self.control.stop_flash() {
            return Ok(());
        }
        log::debug!("Stopping LED flash");
        // Write twice, once to stop flashing and once more to make sure the
        // LED is on.
        self.write()?;
        self.write()
    }

    /// Reset the light bar to the hidraw pairing colour before letting go of
    /// the device
    pub fn close(&mut self) -> Result<(), DeviceError> {
        log::info!("Closing {}", self.name());
        self.set_led(0, 0, 1)
    }
}
