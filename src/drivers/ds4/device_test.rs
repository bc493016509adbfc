use std::{error::Error, fs, path::PathBuf};

use crate::drivers::ds4::{
    control::ControlState,
    device::{DeviceError, FileDevice},
    driver::{Driver, Transport, INPUT_REPORT_USB_SIZE},
    driver_test::usb_report,
    hid_report,
};

/// Write the given reports to a fresh file in the temp directory
fn report_file(name: &str, reports: &[Vec<u8>]) -> Result<PathBuf, Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("ds4-{}-{name}.bin", std::process::id()));
    fs::write(&path, reports.concat())?;
    Ok(path)
}

#[test]
fn test_file_device_read_write_read() -> Result<(), Box<dyn Error>> {
    let reports = [usb_report(1), usb_report(2), usb_report(3)];
    let path = report_file("read-write-read", &reports)?;
    let device = FileDevice::open(path.to_str().ok_or("invalid path")?, Transport::Usb)?;
    let mut driver = Driver::new(device, "replay");

    assert_eq!(driver.poll()?.left_analog_x, 1);
    driver.set_led(1, 2, 3)?;
    // Writing must not skip the remaining input reports
    assert_eq!(driver.poll()?.left_analog_x, 2);
    assert_eq!(driver.poll()?.left_analog_x, 3);

    // The appended output report is read back as a malformed input report
    assert!(matches!(driver.poll(), Err(DeviceError::Report(_))));
    assert!(matches!(driver.poll(), Err(DeviceError::Disconnected)));

    let data = fs::read(&path)?;
    fs::remove_file(&path)?;
    let output_size = Transport::Usb.output_report_size() + 1;
    assert_eq!(data.len(), 3 * INPUT_REPORT_USB_SIZE + output_size);

    let mut control = ControlState::default();
    control.set_led(1, 2, 3);
    let expected = hid_report::encode(&control, Transport::Usb).to_bytes()?;
    assert_eq!(data[3 * INPUT_REPORT_USB_SIZE..], expected[..]);

    Ok(())
}

#[test]
fn test_file_device_missing() {
    let result = FileDevice::open("./does/not/exist.bin", Transport::Usb);
    assert!(matches!(result, Err(DeviceError::Io(_))));
}
