use std::{collections::VecDeque, error::Error};

use crate::drivers::ds4::{
    device::{Device, DeviceError},
    driver::{Driver, Transport, INPUT_REPORT_USB, INPUT_REPORT_USB_SIZE, OUTPUT_REPORT_BT},
};

/// Device test double that hands out canned input reports and records every
/// output report written to it.
#[derive(Default)]
pub struct CannedDevice {
    pub transport: Transport,
    pub reports: VecDeque<Vec<u8>>,
    pub written: Vec<Vec<u8>>,
}

impl CannedDevice {
    pub fn new(transport: Transport, reports: Vec<Vec<u8>>) -> Self {
        Self {
            transport,
            reports: reports.into(),
            written: Vec::new(),
        }
    }
}

impl Device for CannedDevice {
    fn transport(&self) -> Transport {
        self.transport
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        let Some(report) = self.reports.pop_front() else {
            return Ok(0);
        };
        let size = report.len().min(buf.len());
        buf[..size].copy_from_slice(&report[..size]);
        Ok(size)
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        self.written.push(buf.to_vec());
        Ok(buf.len())
    }
}

/// Returns a USB input report with the given left stick X value
pub fn usb_report(left_x: u8) -> Vec<u8> {
    let mut buf = vec![0; INPUT_REPORT_USB_SIZE];
    buf[0] = INPUT_REPORT_USB;
    buf[1] = left_x;
    buf[5] = 0x08;
    buf
}

#[test]
fn test_poll() -> Result<(), Box<dyn Error>> {
    let mut bad_report = usb_report(0);
    bad_report[0] = 0x42;
    let device = CannedDevice::new(
        Transport::Usb,
        vec![usb_report(12), bad_report, usb_report(34)],
    );
    let mut driver = Driver::new(device, "test");

    assert_eq!(driver.poll()?.left_analog_x, 12);
    assert!(matches!(driver.poll(), Err(DeviceError::Report(_))));
    assert_eq!(driver.poll()?.left_analog_x, 34);
    assert!(matches!(driver.poll(), Err(DeviceError::Disconnected)));

    Ok(())
}

#[test]
fn test_name() {
    let driver = Driver::new(CannedDevice::default(), "ds4");
    assert_eq!(driver.name(), "USB Controller (ds4)");

    let device = CannedDevice::new(Transport::Bluetooth, Vec::new());
    let driver = Driver::new(device, "ds4");
    assert_eq!(driver.name(), "Bluetooth Controller (ds4)");
}

#[test]
fn test_set_led_and_rumble() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(CannedDevice::default(), "test");
    driver.set_led(255, 0, 400)?;
    driver.rumble(100, 200)?;

    let written = &driver.device().written;
    assert_eq!(written.len(), 2);
    // Report id, then the payload with fields at offset 0
    assert_eq!(written[0][0], 0x05);
    assert_eq!(written[0][1 + 5..=1 + 7], [255, 0, 255]);
    assert_eq!(written[1][1 + 3..=1 + 4], [100, 200]);
    // The light bar color is kept when rumbling
    assert_eq!(written[1][1 + 5..=1 + 7], [255, 0, 255]);

    Ok(())
}

#[test]
fn test_led_flash() -> Result<(), Box<dyn Error>> {
    let device = CannedDevice::new(Transport::Bluetooth, Vec::new());
    let mut driver = Driver::new(device, "test");

    driver.start_led_flash(10, 20)?;
    assert!(driver.control().flashing);
    // Already flashing, so nothing is written
    driver.start_led_flash(30, 40)?;
    assert_eq!(driver.device().written.len(), 1);
    let report = &driver.device().written[0];
    assert_eq!(report[0], OUTPUT_REPORT_BT);
    assert_eq!(report[1 + 2 + 8..=1 + 2 + 9], [10, 20]);

    driver.stop_led_flash()?;
    assert!(!driver.control().flashing);
    assert_eq!(driver.device().written.len(), 3);
    assert_eq!(driver.device().written[1], driver.device().written[2]);
    assert_eq!(driver.device().written[2][1 + 2 + 8..=1 + 2 + 9], [0, 0]);

    // Not flashing anymore, so nothing is written
    driver.stop_led_flash()?;
    assert_eq!(driver.device().written.len(), 3);

    Ok(())
}

#[test]
fn test_update() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(CannedDevice::default(), "test");
    let changed = driver.update(|control| {
        control.set_led(1, 2, 3);
        control.set_rumble(4, 5);
        true
    })?;
    assert!(changed);
    assert_eq!(driver.device().written.len(), 1);
    assert_eq!(driver.device().written[0][1 + 3..=1 + 7], [4, 5, 1, 2, 3]);

    Ok(())
}

#[test]
fn test_close_resets_led() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(CannedDevice::default(), "test");
    driver.set_led(200, 100, 50)?;
    driver.close()?;
    let last = driver.device().written.last().expect("should write a report");
    assert_eq!(last[1 + 5..=1 + 7], [0, 0, 1]);

    Ok(())
}
