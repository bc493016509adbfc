use std::{
    error::Error,
    fs,
    sync::{atomic::AtomicBool, Arc},
};

use ds4_driver::{
    config::StatusConfig,
    controller::Controller,
    drivers::ds4::{
        control::ControlState,
        device::FileDevice,
        driver::{Driver, Transport, INPUT_REPORT_USB, INPUT_REPORT_USB_SIZE},
        hid_report,
    },
};
use tokio::sync::mpsc;

use super::{run::run_controller, Output};

fn usb_report(left_x: u8) -> Vec<u8> {
    let mut buf = vec![0; INPUT_REPORT_USB_SIZE];
    buf[0] = INPUT_REPORT_USB;
    buf[1] = left_x;
    buf[5] = 0x08;
    buf
}

/// A replayed controller reaching the end of its file is reset before the
/// session ends
#[test]
fn test_run_controller_until_disconnect() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("ds4-{}-session.bin", std::process::id()));
    fs::write(&path, [usb_report(0), usb_report(255)].concat())?;

    let device = FileDevice::open(path.to_str().ok_or("invalid path")?, Transport::Usb)?;
    let controller = Controller::new(Driver::new(device, "replay"), &StatusConfig::default());
    let (_feedback_tx, feedback_rx) = mpsc::channel(8);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    run_controller(controller, feedback_rx, out_tx, Arc::new(AtomicBool::new(false)))?;

    let mut statuses = 0;
    while let Ok(output) = out_rx.try_recv() {
        if let Output::Status(_) = output {
            statuses += 1;
        }
    }
    assert_eq!(statuses, 2);

    let data = fs::read(&path)?;
    fs::remove_file(&path)?;
    let mut control = ControlState::default();
    control.set_led(0, 0, 1);
    let expected = hid_report::encode(&control, Transport::Usb).to_bytes()?;
    assert_eq!(data.len(), 2 * INPUT_REPORT_USB_SIZE + expected.len());
    assert_eq!(data[2 * INPUT_REPORT_USB_SIZE..], expected[..]);

    Ok(())
}
