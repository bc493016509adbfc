use std::{
    ffi::{CString, NulError},
    fs::{File, OpenOptions},
    io::{self, Read, Write},
};

use hidapi::{BusType, HidDevice};
use thiserror::Error;

use super::{
    control::ControlState,
    driver::{Transport, DS4_VID, PIDS},
    hid_report::{self, ControllerState, PackedOutputReport, ReportError},
};

/// Possible errors talking to a DualShock 4 device
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
    #[error("Could not access device: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid device path: {0}")]
    InvalidPath(#[from] NulError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("Unable to pack output report: {0}")]
    Packing(String),
    #[error("Device '{path}' is not a DualShock 4 controller: {vid:04x}:{pid:04x}")]
    Unsupported { path: String, vid: u16, pid: u16 },
    #[error("Device disconnected")]
    Disconnected,
}

/// Capabilities of a DualShock 4 device. Implementations only need to move
/// raw bytes; decoding, encoding and transmitting are derived from the
/// [Transport] the device is connected with.
pub trait Device {
    /// Transport used to frame reports for this device
    fn transport(&self) -> Transport;

    /// Read a single raw input report into the given buffer, returning the
    /// number of bytes read. Zero bytes means the device went away.
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError>;

    /// Write a raw output report (report id followed by the payload)
    fn write_raw(&mut self, buf: &[u8]) -> Result<usize, DeviceError>;

    /// Decode a raw input report read from this device
    fn decode(&self, buf: &[u8]) -> Result<ControllerState, ReportError> {
        hid_report::decode(buf, self.transport())
    }

    /// Render the given output state for this device
    fn encode(&self, control: &ControlState) -> PackedOutputReport {
        hid_report::encode(control, self.transport())
    }

    /// Encode and write the given output state to the device
    fn transmit(&mut self, control: &ControlState) -> Result<(), DeviceError> {
        let report = self.encode(control);
        let buf = report
            .to_bytes()
            .map_err(|e| DeviceError::Packing(e.to_string()))?;
        let _bytes_written = self.write_raw(&buf)?;
        Ok(())
    }
}

/// DualShock 4 connected through hidraw
pub struct HidrawDevice {
    device: HidDevice,
    transport: Transport,
}

impl HidrawDevice {
    /// Open the hidraw device at the given path. Fails if the device is not
    /// a DualShock 4.
    pub fn new(path: &str) -> Result<Self, DeviceError> {
        let c_path = CString::new(path)?;
        let api = hidapi::HidApi::new()?;
        let device = api.open_path(&c_path)?;
        let info = device.get_device_info()?;
        let vid = info.vendor_id();
        let pid = info.product_id();
        if vid != DS4_VID || !PIDS.contains(&pid) {
            return Err(DeviceError::Unsupported {
                path: path.to_string(),
                vid,
                pid,
            });
        }

        let transport = match info.bus_type() {
            BusType::Bluetooth => Transport::Bluetooth,
            _ => Transport::Usb,
        };
        log::info!("Opened {transport} DualShock 4 at {path}");

        Ok(Self { device, transport })
    }
}

impl Device for HidrawDevice {
    fn transport(&self) -> Transport {
        self.transport
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        Ok(self.device.read(buf)?)
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        Ok(self.device.write(buf)?)
    }
}

/// Simulated DualShock 4 backed by a file or FIFO containing back to back
/// input reports. For a regular file, output reports are appended to it
/// through a separate handle so the read position is never moved by a write.
/// Output reports for a FIFO are discarded.
pub struct FileDevice {
    reader: File,
    writer: Option<File>,
    transport: Transport,
}

impl FileDevice {
    /// Open the given file, reading reports framed for the given transport
    pub fn open(path: &str, transport: Transport) -> Result<Self, DeviceError> {
        let reader = OpenOptions::new().read(true).open(path)?;
        let writer = if reader.metadata()?.is_file() {
            Some(OpenOptions::new().append(true).open(path)?)
        } else {
            None
        };
        log::info!("Opened simulated {transport} DualShock 4 at {path}");
        Ok(Self {
            reader,
            writer,
            transport,
        })
    }
}

impl Device for FileDevice {
    fn transport(&self) -> Transport {
        self.transport
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        // Only read a single report at a time
        let size = self.transport.input_report_size().min(buf.len());
        Ok(self.reader.read(&mut buf[..size])?)
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        let Some(writer) = self.writer.as_mut() else {
            log::trace!("Discarding output report: {buf:?}");
            return Ok(buf.len());
        };
        writer.write_all(buf)?;
        Ok(buf.len())
    }
}
