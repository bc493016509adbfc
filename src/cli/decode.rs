use std::{error::Error, fs, path::Path};

use ds4_driver::{
    config::DriverConfig,
    drivers::ds4::{driver::Transport, hid_report},
    messages::{status::Status, Header},
};

use super::Output;

/// Decode every report in the given file and print it as a status message
pub fn handle_decode(
    config: &DriverConfig,
    path: &Path,
    bluetooth: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let transport = if bluetooth {
        Transport::Bluetooth
    } else {
        Transport::Usb
    };
    let status_config = config.status();
    let frame_id = status_config.frame_id();
    let imu_frame_id = status_config.imu_frame_id();

    let data = fs::read(path)?;
    let size = transport.input_report_size();
    if data.len() % size != 0 {
        log::warn!(
            "File size {} is not a multiple of the {transport} report size {size}",
            data.len()
        );
    }

    let mut decoded = 0;
    for (i, report) in data.chunks(size).enumerate() {
        let state = match hid_report::decode(report, transport) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Skipping report {i}: {e}");
                continue;
            }
        };
        let status = Status::from_state(
            &state,
            Header::new(frame_id.as_str()),
            imu_frame_id.as_str(),
            status_config.deadzone(),
        );
        Output::Status(status).print()?;
        decoded += 1;
    }
    log::info!("Decoded {decoded} reports from {path:?}");

    Ok(())
}
