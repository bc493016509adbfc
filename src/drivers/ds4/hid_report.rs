//! Structures derived from the great work of the PS4 Developer Wiki.
//! Source: https://www.psdevwiki.com/ps4/DS4-USB
//! Source: https://www.psdevwiki.com/ps4/DS4-BT
use packed_struct::prelude::*;
use thiserror::Error;

use super::{control::ControlState, driver::*};

/// Size of the input state shared by USB and Bluetooth reports
pub const INPUT_STATE_SIZE: usize = 64;

/// Possible errors decoding an input report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Malformed report: {0}")]
    MalformedReport(String),
}

/// Position of the directional pad hat switch
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    #[default]
    None,
}

impl Direction {
    /// Returns the direction for the given 4-bit hat value. Neutral (8) and
    /// any unused value map to [Direction::None].
    pub fn from_raw(value: u8) -> Self {
        match value & 0x0F {
            0 => Self::North,
            1 => Self::NorthEast,
            2 => Self::East,
            3 => Self::SouthEast,
            4 => Self::South,
            5 => Self::SouthWest,
            6 => Self::West,
            7 => Self::NorthWest,
            _ => Self::None,
        }
    }

    pub fn as_raw(&self) -> u8 {
        match *self {
            Self::North => 0,
            Self::NorthEast => 1,
            Self::East => 2,
            Self::SouthEast => 3,
            Self::South => 4,
            Self::SouthWest => 5,
            Self::West => 6,
            Self::NorthWest => 7,
            Self::None => 8,
        }
    }

    pub fn up(&self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    pub fn right(&self) -> bool {
        matches!(self, Self::NorthEast | Self::East | Self::SouthEast)
    }

    pub fn down(&self) -> bool {
        matches!(self, Self::SouthEast | Self::South | Self::SouthWest)
    }

    pub fn left(&self) -> bool {
        matches!(self, Self::SouthWest | Self::West | Self::NorthWest)
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4")]
pub struct TouchFingerData {
    // byte 0
    // Top bit is set when NOT touching
    #[packed_field(bits = "0")]
    pub not_touching: bool,
    #[packed_field(bits = "1..=7")]
    pub id: Integer<u8, packed_bits::Bits<7>>,
    // byte 1
    #[packed_field(bytes = "1")]
    pub x_lo: u8,
    // byte 2
    #[packed_field(bits = "16..=19")]
    pub y_lo: Integer<u8, packed_bits::Bits<4>>,
    #[packed_field(bits = "20..=23")]
    pub x_hi: Integer<u8, packed_bits::Bits<4>>,
    // byte 3
    #[packed_field(bytes = "3")]
    pub y_hi: u8,
}

impl Default for TouchFingerData {
    fn default() -> Self {
        Self {
            not_touching: true,
            id: Default::default(),
            x_lo: Default::default(),
            y_lo: Default::default(),
            x_hi: Default::default(),
            y_hi: Default::default(),
        }
    }
}

impl TouchFingerData {
    pub fn is_touching(&self) -> bool {
        !self.not_touching
    }

    pub fn get_x(&self) -> u16 {
        let x_hi = self.x_hi.to_primitive() as u16;
        let x_hi = x_hi.rotate_left(8);
        x_hi | self.x_lo as u16
    }

    pub fn get_y(&self) -> u16 {
        let y_lo = self.y_lo.to_primitive() as u16;
        let y_hi = (self.y_hi as u16).rotate_left(4);
        y_hi | y_lo
    }

    pub fn set_x(&mut self, x_raw: u16) {
        self.x_lo = (x_raw & 0x00FF) as u8;
        self.x_hi = Integer::from_primitive((x_raw & 0x0F00).rotate_right(8) as u8);
    }

    pub fn set_y(&mut self, y_raw: u16) {
        self.y_lo = Integer::from_primitive((y_raw & 0x000F) as u8);
        self.y_hi = (y_raw & 0x0FF0).rotate_right(4) as u8;
    }
}

/// Input state layout shared by USB and Bluetooth. Bluetooth reports carry
/// the same layout after the first two bytes are cut off.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "64")]
pub struct InputState {
    // byte 0
    #[packed_field(bytes = "0")]
    pub report_id: u8, // Report ID on USB (always 0x01), unused on Bluetooth

    // byte 1-4
    #[packed_field(bytes = "1")]
    pub joystick_l_x: u8, // left stick X axis
    #[packed_field(bytes = "2")]
    pub joystick_l_y: u8, // left stick Y axis
    #[packed_field(bytes = "3")]
    pub joystick_r_x: u8, // right stick X axis
    #[packed_field(bytes = "4")]
    pub joystick_r_y: u8, // right stick Y axis

    // byte 5
    #[packed_field(bits = "40")]
    pub triangle: bool, // Button cluster
    #[packed_field(bits = "41")]
    pub circle: bool,
    #[packed_field(bits = "42")]
    pub cross: bool,
    #[packed_field(bits = "43")]
    pub square: bool,
    #[packed_field(bits = "44..=47")]
    pub dpad: Integer<u8, packed_bits::Bits<4>>, // Directional buttons

    // byte 6
    #[packed_field(bits = "48")]
    pub r3: bool,
    #[packed_field(bits = "49")]
    pub l3: bool,
    #[packed_field(bits = "50")]
    pub options: bool,
    #[packed_field(bits = "51")]
    pub share: bool,
    #[packed_field(bits = "52")]
    pub r2: bool,
    #[packed_field(bits = "53")]
    pub l2: bool,
    #[packed_field(bits = "54")]
    pub r1: bool,
    #[packed_field(bits = "55")]
    pub l1: bool,

    // byte 7
    #[packed_field(bits = "56..=61")]
    pub counter: Integer<u8, packed_bits::Bits<6>>, // Rolling report counter
    #[packed_field(bits = "62")]
    pub touchpad: bool, // Touchpad button
    #[packed_field(bits = "63")]
    pub ps: bool, // PS button

    // byte 8-9
    #[packed_field(bytes = "8")]
    pub l2_trigger: u8, // L2 trigger axis
    #[packed_field(bytes = "9")]
    pub r2_trigger: u8, // R2 trigger axis

    // byte 10-12
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub sensor_timestamp: u16,
    #[packed_field(bytes = "12")]
    pub temperature: u8,

    // byte 13-18
    #[packed_field(bytes = "13..=14", endian = "lsb")]
    pub accel_y: Integer<i16, packed_bits::Bits<16>>, // Accelerometer
    #[packed_field(bytes = "15..=16", endian = "lsb")]
    pub accel_x: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "17..=18", endian = "lsb")]
    pub accel_z: Integer<i16, packed_bits::Bits<16>>,

    // byte 19-24
    #[packed_field(bytes = "19..=20", endian = "lsb")]
    pub gyro_roll: Integer<i16, packed_bits::Bits<16>>, // Gyro, mounted inverted
    #[packed_field(bytes = "21..=22", endian = "lsb")]
    pub gyro_yaw: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "23..=24", endian = "lsb")]
    pub gyro_pitch: Integer<i16, packed_bits::Bits<16>>,

    // byte 25-29
    #[packed_field(bytes = "25..=29")]
    pub _unkn_0: [u8; 5],

    // byte 30
    #[packed_field(bits = "240")]
    pub _unkn_plug: bool,
    #[packed_field(bits = "241")]
    pub plugged_mic: bool,
    #[packed_field(bits = "242")]
    pub plugged_audio: bool,
    #[packed_field(bits = "243")]
    pub plugged_usb: bool,
    #[packed_field(bits = "244..=247")]
    pub battery: Integer<u8, packed_bits::Bits<4>>, // 0x00 - 0x0B

    // byte 31-34
    #[packed_field(bytes = "31..=32")]
    pub _unkn_1: [u8; 2],
    #[packed_field(bytes = "33")]
    pub touch_packets: u8,
    #[packed_field(bytes = "34")]
    pub touch_timestamp: u8,

    // byte 35-42
    #[packed_field(bytes = "35..=42", element_size_bytes = "4")]
    pub touch_finger_data: [TouchFingerData; 2],

    // byte 43-63
    #[packed_field(bytes = "43..=63")]
    pub _unkn_2: [u8; 21],
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            report_id: INPUT_REPORT_USB,
            joystick_l_x: 128,
            joystick_l_y: 128,
            joystick_r_x: 128,
            joystick_r_y: 128,
            dpad: Integer::from_primitive(Direction::None.as_raw()),
            triangle: Default::default(),
            circle: Default::default(),
            cross: Default::default(),
            square: Default::default(),
            r3: Default::default(),
            l3: Default::default(),
            options: Default::default(),
            share: Default::default(),
            r2: Default::default(),
            l2: Default::default(),
            r1: Default::default(),
            l1: Default::default(),
            counter: Default::default(),
            touchpad: Default::default(),
            ps: Default::default(),
            l2_trigger: Default::default(),
            r2_trigger: Default::default(),
            sensor_timestamp: Default::default(),
            temperature: Default::default(),
            accel_y: Default::default(),
            accel_x: Default::default(),
            accel_z: Default::default(),
            gyro_roll: Default::default(),
            gyro_yaw: Default::default(),
            gyro_pitch: Default::default(),
            _unkn_0: Default::default(),
            _unkn_plug: Default::default(),
            plugged_mic: Default::default(),
            plugged_audio: Default::default(),
            plugged_usb: Default::default(),
            battery: Default::default(),
            _unkn_1: Default::default(),
            touch_packets: Default::default(),
            touch_timestamp: Default::default(),
            touch_finger_data: Default::default(),
            _unkn_2: Default::default(),
        }
    }
}

impl InputState {
    /// Validate the framing of the given raw input report and unpack the
    /// input state from it. Bluetooth reports have their header cut off
    /// before unpacking.
    pub fn unpack_report(buf: &[u8], transport: Transport) -> Result<Self, ReportError> {
        // Validate the size of the report
        let expected_size = transport.input_report_size();
        let size = buf.len();
        if size < expected_size {
            let err = format!(
                "Invalid report size for {transport}: Expected {expected_size}, Got {size}"
            );
            return Err(ReportError::MalformedReport(err));
        }

        // Validate the report id
        let report_id = buf[0];
        let expected_id = transport.input_report_id();
        if report_id != expected_id {
            let err = format!(
                "Invalid report id for {transport}: Expected {expected_id:#04x}, Got {report_id:#04x}"
            );
            return Err(ReportError::MalformedReport(err));
        }
        log::trace!("Got {transport} input report");

        // Get a subslice of the buffer
        let start = transport.input_header_size();
        let slice = &buf[start..start + INPUT_STATE_SIZE];
        InputState::unpack_from_slice(slice)
            .map_err(|e| ReportError::MalformedReport(format!("Unable to unpack report: {e}")))
    }

    pub fn direction(&self) -> Direction {
        Direction::from_raw(self.dpad.to_primitive())
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.dpad = Integer::from_primitive(direction.as_raw());
    }
}

/// A single touch on the touchpad
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TouchPoint {
    pub id: u8,
    pub active: bool,
    pub x: u16,
    pub y: u16,
}

impl From<&TouchFingerData> for TouchPoint {
    fn from(data: &TouchFingerData) -> Self {
        Self {
            id: data.id.to_primitive(),
            active: data.is_touching(),
            x: data.get_x(),
            y: data.get_y(),
        }
    }
}

/// Decoded snapshot of a single input report
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub left_analog_x: u8,
    pub left_analog_y: u8,
    pub right_analog_x: u8,
    pub right_analog_y: u8,
    pub l2_analog: u8,
    pub r2_analog: u8,

    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,

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

    pub motion_y: i16,
    pub motion_x: i16,
    pub motion_z: i16,
    pub orientation_roll: i16,
    pub orientation_yaw: i16,
    pub orientation_pitch: i16,

    pub touch: [TouchPoint; 2],

    pub timestamp: u8,
    pub battery: u8,

    pub plug_usb: bool,
    pub plug_audio: bool,
    pub plug_mic: bool,
}

impl From<&InputState> for ControllerState {
    fn from(state: &InputState) -> Self {
        let dpad = state.direction();
        Self {
            left_analog_x: state.joystick_l_x,
            left_analog_y: state.joystick_l_y,
            right_analog_x: state.joystick_r_x,
            right_analog_y: state.joystick_r_y,
            l2_analog: state.l2_trigger,
            r2_analog: state.r2_trigger,
            dpad_up: dpad.up(),
            dpad_down: dpad.down(),
            dpad_left: dpad.left(),
            dpad_right: dpad.right(),
            button_cross: state.cross,
            button_circle: state.circle,
            button_square: state.square,
            button_triangle: state.triangle,
            button_l1: state.l1,
            button_l2: state.l2,
            button_l3: state.l3,
            button_r1: state.r1,
            button_r2: state.r2,
            button_r3: state.r3,
            button_share: state.share,
            button_options: state.options,
            button_trackpad: state.touchpad,
            button_ps: state.ps,
            motion_y: state.accel_y.to_primitive(),
            motion_x: state.accel_x.to_primitive(),
            motion_z: state.accel_z.to_primitive(),
            orientation_roll: state.gyro_roll.to_primitive().saturating_neg(),
            orientation_yaw: state.gyro_yaw.to_primitive(),
            orientation_pitch: state.gyro_pitch.to_primitive(),
            touch: [
                TouchPoint::from(&state.touch_finger_data[0]),
                TouchPoint::from(&state.touch_finger_data[1]),
            ],
            timestamp: state.counter.to_primitive(),
            battery: state.battery.to_primitive(),
            plug_usb: state.plugged_usb,
            plug_audio: state.plugged_audio,
            plug_mic: state.plugged_mic,
        }
    }
}

/// Decode the given raw input report into a [ControllerState]
pub fn decode(buf: &[u8], transport: Transport) -> Result<ControllerState, ReportError> {
    let state = InputState::unpack_report(buf, transport)?;
    Ok(ControllerState::from(&state))
}

/// Rumble and light bar data shared by USB and Bluetooth output reports
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
pub struct SetStatePackedOutputData {
    #[packed_field(bytes = "0")]
    pub rumble_small: u8, // Right (weak) motor
    #[packed_field(bytes = "1")]
    pub rumble_big: u8, // Left (strong) motor
    #[packed_field(bytes = "2")]
    pub led_red: u8,
    #[packed_field(bytes = "3")]
    pub led_green: u8,
    #[packed_field(bytes = "4")]
    pub led_blue: u8,
    #[packed_field(bytes = "5")]
    pub flash_on: u8, // Time to flash bright (255 = 2.5 seconds)
    #[packed_field(bytes = "6")]
    pub flash_off: u8, // Time to flash dark (255 = 2.5 seconds)
}

impl From<&ControlState> for SetStatePackedOutputData {
    fn from(control: &ControlState) -> Self {
        Self {
            rumble_small: control.rumble_small,
            rumble_big: control.rumble_big,
            led_red: control.led_red,
            led_green: control.led_green,
            led_blue: control.led_blue,
            flash_on: control.flash_on,
            flash_off: control.flash_off,
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "31")]
pub struct UsbPackedOutputReport {
    // byte 0
    #[packed_field(bytes = "0")]
    pub flags: u8, // Enable rumble and light bar updates (always 0xFF)

    // byte 1-2
    #[packed_field(bytes = "1..=2")]
    pub _unkn_0: [u8; 2],

    // byte 3-9
    #[packed_field(bytes = "3..=9")]
    pub state: SetStatePackedOutputData,

    // byte 10-30
    #[packed_field(bytes = "10..=30")]
    pub _unkn_1: [u8; 21],
}

impl Default for UsbPackedOutputReport {
    fn default() -> Self {
        Self {
            flags: 0xFF,
            _unkn_0: Default::default(),
            state: Default::default(),
            _unkn_1: Default::default(),
        }
    }
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "77")]
pub struct BluetoothPackedOutputReport {
    // byte 0
    #[packed_field(bytes = "0")]
    pub hid_flags: u8, // Always 0x80

    // byte 1
    #[packed_field(bytes = "1")]
    pub _unkn_0: u8,

    // byte 2
    #[packed_field(bytes = "2")]
    pub flags: u8, // Enable rumble and light bar updates (always 0xFF)

    // byte 3-4
    #[packed_field(bytes = "3..=4")]
    pub _unkn_1: [u8; 2],

    // byte 5-11
    #[packed_field(bytes = "5..=11")]
    pub state: SetStatePackedOutputData,

    // byte 12-76
    #[packed_field(bytes = "12..=76")]
    pub _unkn_2: [u8; 65],
}

impl Default for BluetoothPackedOutputReport {
    fn default() -> Self {
        Self {
            hid_flags: 0x80,
            _unkn_0: 0,
            flags: 0xFF,
            _unkn_1: Default::default(),
            state: Default::default(),
            _unkn_2: [0; 65],
        }
    }
}

/// DualShock 4 output report for USB and Bluetooth
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PackedOutputReport {
    Usb(UsbPackedOutputReport),
    Bluetooth(BluetoothPackedOutputReport),
}

impl PackedOutputReport {
    /// Report id to send in front of the payload
    pub fn report_id(&self) -> u8 {
        match self {
            PackedOutputReport::Usb(_) => OUTPUT_REPORT_USB,
            PackedOutputReport::Bluetooth(_) => OUTPUT_REPORT_BT,
        }
    }

    /// Return the rumble and light bar data of the report
    pub fn state(&self) -> &SetStatePackedOutputData {
        match self {
            PackedOutputReport::Usb(report) => &report.state,
            PackedOutputReport::Bluetooth(report) => &report.state,
        }
    }

    /// Pack the report payload without the report id
    pub fn pack_payload(&self) -> Result<Vec<u8>, PackingError> {
        match self {
            PackedOutputReport::Usb(report) => Ok(report.pack()?.to_vec()),
            PackedOutputReport::Bluetooth(report) => Ok(report.pack()?.to_vec()),
        }
    }

    /// Pack the report id followed by the payload, ready to be written to
    /// the device
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackingError> {
        let payload = self.pack_payload()?;
        let mut buf = Vec::with_capacity(payload.len() + 1);
        buf.push(self.report_id());
        buf.extend(payload);
        Ok(buf)
    }
}

/// Render the given [ControlState] into an output report for the given
/// transport
pub fn encode(control: &ControlState, transport: Transport) -> PackedOutputReport {
    let state = SetStatePackedOutputData::from(control);
    match transport {
        Transport::Usb => PackedOutputReport::Usb(UsbPackedOutputReport {
            state,
            ..Default::default()
        }),
        Transport::Bluetooth => PackedOutputReport::Bluetooth(BluetoothPackedOutputReport {
            state,
            ..Default::default()
        }),
    }
}
