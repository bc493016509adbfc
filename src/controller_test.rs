use std::{error::Error, time::Duration};

use tokio::sync::mpsc;

use crate::{
    config::StatusConfig,
    controller::{Controller, StatusPublisher},
    drivers::ds4::{
        device::DeviceError,
        driver::{Driver, Transport},
        driver_test::{usb_report, CannedDevice},
    },
    messages::feedback::{
        Feedback, FeedbackRequest, JoyFeedback, JoyFeedbackArray, JoyFeedbackType,
    },
    schedule::{driver::SpeedSink, SpeedSpecifier},
};

fn controller(reports: Vec<Vec<u8>>) -> Controller<CannedDevice> {
    let device = CannedDevice::new(Transport::Usb, reports);
    let config = StatusConfig {
        frame_id: Some("pad".to_string()),
        ..Default::default()
    };
    Controller::new(Driver::new(device, "test"), &config)
}

#[test]
fn test_poll_status() -> Result<(), Box<dyn Error>> {
    let mut controller = controller(vec![usb_report(0), usb_report(0), usb_report(255)]);
    assert_eq!(controller.name(), "USB Controller (test)");

    let status = controller.poll_status()?;
    assert_eq!(status.header.frame_id, "pad");
    assert_eq!(status.imu.header.frame_id, "ds4_imu");
    assert_eq!(status.axis_left_x, 1.0);
    assert!(status.header.stamp > 0.0);

    // Joy messages are only produced when something changed
    assert!(controller.joy_if_changed(&status).is_some());
    let status = controller.poll_status()?;
    assert!(controller.joy_if_changed(&status).is_none());
    let status = controller.poll_status()?;
    assert_eq!(status.axis_left_x, -1.0);
    let joy = controller
        .joy_if_changed(&status)
        .ok_or("joy should change")?;
    assert_eq!(joy.axes[0], -1.0);

    assert!(matches!(
        controller.poll_status(),
        Err(DeviceError::Disconnected)
    ));

    Ok(())
}

#[test]
fn test_handle_feedback() -> Result<(), Box<dyn Error>> {
    let mut controller = controller(Vec::new());
    let feedback = Feedback {
        set_led: true,
        led_b: 1.0,
        set_rumble: true,
        rumble_big: 1.0,
        rumble_duration: 0.5,
        ..Default::default()
    };

    let stop_after = controller.handle_feedback(&feedback)?;
    assert_eq!(stop_after, Some(Duration::from_millis(500)));
    let control = controller.driver().control();
    assert_eq!(control.led_blue, 255);
    assert_eq!(control.rumble_big, 255);

    controller.stop_rumble()?;
    let control = controller.driver().control();
    assert_eq!(control.rumble_big, 0);
    assert_eq!(control.led_blue, 255);
    assert_eq!(controller.driver().device().written.len(), 2);

    Ok(())
}

#[test]
fn test_handle_joy_feedback() -> Result<(), Box<dyn Error>> {
    let mut controller = controller(Vec::new());
    let msg = JoyFeedbackArray {
        array: vec![
            JoyFeedback {
                kind: JoyFeedbackType::Led,
                id: 1,
                intensity: 1.0,
            },
            JoyFeedback {
                kind: JoyFeedbackType::Rumble,
                id: 0,
                intensity: 1.0,
            },
        ],
    };

    assert_eq!(controller.handle_joy_feedback(&msg)?, None);
    let report = controller
        .driver()
        .device()
        .written
        .last()
        .ok_or("no report written")?;
    // Rumble small, rumble big, red, green, blue
    assert_eq!(report[1 + 3..=1 + 7], [255, 0, 0, 255, 0]);

    controller.close()?;
    assert_eq!(controller.driver().control().led_blue, 1);

    Ok(())
}

#[test]
fn test_handle_request() -> Result<(), Box<dyn Error>> {
    let mut controller = controller(Vec::new());

    let request = FeedbackRequest::Feedback(Feedback {
        set_rumble: true,
        rumble_small: 1.0,
        rumble_duration: 1.5,
        ..Default::default()
    });
    let stop_after = controller.handle_request(&request)?;
    assert_eq!(stop_after, Some(Duration::from_millis(1500)));
    assert_eq!(controller.driver().control().rumble_small, 255);

    let request = FeedbackRequest::Joy(JoyFeedbackArray {
        array: vec![JoyFeedback {
            kind: JoyFeedbackType::Led,
            id: 0,
            intensity: 1.0,
        }],
    });
    assert_eq!(controller.handle_request(&request)?, None);
    assert_eq!(controller.driver().control().led_red, 255);
    assert_eq!(controller.driver().device().written.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_status_publisher() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::channel(1);
    let mut publisher = StatusPublisher::new(&StatusConfig::default(), tx);

    assert!(publisher.send(SpeedSpecifier::new(0.5, -0.25)?).is_ok());
    let status = rx.recv().await.ok_or("no status published")?;
    assert_eq!(status.header.frame_id, "ds4");
    assert_eq!(status.axis_left_y, 0.5);
    assert_eq!(status.axis_right_x, -0.25);
    assert_eq!(status.battery_percentage, 1.0);

    // Once the channel is full further samples are rejected
    assert!(publisher.send(SpeedSpecifier::REST).is_ok());
    assert!(publisher.send(SpeedSpecifier::REST).is_err());

    Ok(())
}
