use std::{error::Error, time::Duration};

use crate::{
    drivers::ds4::control::ControlState,
    messages::feedback::{
        Feedback, FeedbackRequest, JoyFeedback, JoyFeedbackArray, JoyFeedbackType,
    },
};

#[test]
fn test_apply_led() {
    let mut control = ControlState::default();
    control.set_rumble(10, 20);

    let feedback = Feedback {
        set_led: true,
        led_r: 1.0,
        led_g: 0.5,
        led_b: 2.0,
        rumble_small: 1.0,
        ..Default::default()
    };
    assert_eq!(feedback.apply(&mut control), None);
    assert_eq!(control.led_red, 255);
    assert_eq!(control.led_green, 127);
    assert_eq!(control.led_blue, 255);
    // Rumble is untouched since set_rumble is false
    assert_eq!(control.rumble_small, 10);
    assert_eq!(control.rumble_big, 20);
}

#[test]
fn test_apply_flash() {
    let mut control = ControlState::default();
    let feedback = Feedback {
        set_led_flash: true,
        led_flash_on: 2.5,
        led_flash_off: 1.25,
        ..Default::default()
    };
    feedback.apply(&mut control);
    assert_eq!(control.flash_on, 255);
    assert_eq!(control.flash_off, 127);
    assert!(control.flashing);

    let feedback = Feedback {
        set_led_flash: true,
        ..Default::default()
    };
    feedback.apply(&mut control);
    assert_eq!(control.flash_on, 0);
    assert!(!control.flashing);
}

#[test]
fn test_apply_rumble() {
    let mut control = ControlState::default();
    let feedback = Feedback {
        set_rumble: true,
        rumble_small: 0.5,
        rumble_big: -1.0,
        rumble_duration: 0.25,
        ..Default::default()
    };
    let stop_after = feedback.apply(&mut control);
    assert_eq!(stop_after, Some(Duration::from_millis(250)));
    assert_eq!(control.rumble_small, 127);
    assert_eq!(control.rumble_big, 0);

    // No duration means rumble until told otherwise
    let feedback = Feedback {
        set_rumble: true,
        rumble_duration: 0.0,
        ..Default::default()
    };
    assert_eq!(feedback.apply(&mut control), None);

    let feedback = Feedback {
        set_rumble: true,
        rumble_duration: f64::INFINITY,
        ..Default::default()
    };
    assert_eq!(feedback.apply(&mut control), None);
}

#[test]
fn test_apply_huge_rumble_duration() {
    let mut control = ControlState::default();
    let feedback = Feedback {
        set_rumble: true,
        rumble_big: 1.0,
        rumble_duration: 1e30,
        ..Default::default()
    };
    // Too long to represent, so the rumble never stops on its own
    assert_eq!(feedback.apply(&mut control), None);
    assert_eq!(control.rumble_big, 255);

    let feedback = Feedback {
        set_rumble: true,
        rumble_duration: f64::NAN,
        ..Default::default()
    };
    assert_eq!(feedback.apply(&mut control), None);

    let feedback = Feedback {
        set_rumble: true,
        rumble_duration: -3.0,
        ..Default::default()
    };
    assert_eq!(feedback.apply(&mut control), None);
}

#[test]
fn test_from_joy_feedback() {
    let msg = JoyFeedbackArray {
        array: vec![
            JoyFeedback {
                kind: JoyFeedbackType::Led,
                id: 0,
                intensity: 0.1,
            },
            JoyFeedback {
                kind: JoyFeedbackType::Led,
                id: 2,
                intensity: 0.3,
            },
            JoyFeedback {
                kind: JoyFeedbackType::Rumble,
                id: 1,
                intensity: 0.8,
            },
            JoyFeedback {
                kind: JoyFeedbackType::Rumble,
                id: 7,
                intensity: 1.0,
            },
        ],
    };

    let feedback = Feedback::from(&msg);
    assert!(feedback.set_led);
    assert_eq!(feedback.led_r, 0.1);
    assert_eq!(feedback.led_g, 0.0);
    assert_eq!(feedback.led_b, 0.3);
    assert!(feedback.set_rumble);
    assert_eq!(feedback.rumble_small, 0.0);
    assert_eq!(feedback.rumble_big, 0.8);
    assert!(!feedback.set_led_flash);

    let empty = Feedback::from(&JoyFeedbackArray::default());
    assert_eq!(empty, Feedback::default());
}

#[test]
fn test_deserialize_feedback() -> Result<(), Box<dyn Error>> {
    let feedback: Feedback = serde_json::from_str(r#"{"set_led": true, "led_g": 1.0}"#)?;
    assert!(feedback.set_led);
    assert_eq!(feedback.led_g, 1.0);
    assert!(!feedback.set_rumble);

    let msg: JoyFeedbackArray =
        serde_json::from_str(r#"{"array": [{"type": "rumble", "id": 0, "intensity": 0.5}]}"#)?;
    assert_eq!(msg.array[0].kind, JoyFeedbackType::Rumble);

    Ok(())
}

#[test]
fn test_deserialize_request() -> Result<(), Box<dyn Error>> {
    let request: FeedbackRequest =
        serde_json::from_str(r#"{"set_rumble": true, "rumble_small": 0.5}"#)?;
    let FeedbackRequest::Feedback(feedback) = request else {
        return Err("expected a feedback request".into());
    };
    assert!(feedback.set_rumble);
    assert_eq!(feedback.rumble_small, 0.5);

    let request: FeedbackRequest =
        serde_json::from_str(r#"{"array": [{"type": "led", "id": 2, "intensity": 1.0}]}"#)?;
    let FeedbackRequest::Joy(msg) = request else {
        return Err("expected a joy feedback request".into());
    };
    assert_eq!(msg.array.len(), 1);
    assert_eq!(msg.array[0].id, 2);

    // An empty object is a feedback request that changes nothing
    let request: FeedbackRequest = serde_json::from_str("{}")?;
    assert_eq!(request, FeedbackRequest::Feedback(Feedback::default()));

    Ok(())
}
