use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::ds4::control::ControlState;

/// Longest LED flash time in seconds that fits in a report byte
pub const MAX_FLASH_SECS: f64 = 2.5;

/// Scale a value in [0, 1] to a report intensity, truncating toward zero.
/// Negative and NaN values become zero; larger values are clamped later by
/// the [ControlState] setters.
fn to_intensity(value: f64) -> u32 {
    (value * 255.0) as u32
}

/// Request to change the LED, flash and rumble state of a controller. Only
/// sections whose `set_*` flag is true are applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    pub set_led: bool,
    pub led_r: f64,
    pub led_g: f64,
    pub led_b: f64,

    pub set_led_flash: bool,
    /// Seconds
    pub led_flash_on: f64,
    /// Seconds
    pub led_flash_off: f64,

    pub set_rumble: bool,
    pub rumble_small: f64,
    pub rumble_big: f64,
    /// Seconds until the rumble stops, or zero to keep rumbling
    pub rumble_duration: f64,
}

impl Feedback {
    /// Apply this request to the given control state. Returns how long until
    /// the rumble should be stopped, if the request sets a rumble duration.
    pub fn apply(&self, control: &mut ControlState) -> Option<Duration> {
        if self.set_led {
            control.set_led(
                to_intensity(self.led_r),
                to_intensity(self.led_g),
                to_intensity(self.led_b),
            );
        }
        if self.set_led_flash {
            control.set_flash(
                to_intensity(self.led_flash_on / MAX_FLASH_SECS),
                to_intensity(self.led_flash_off / MAX_FLASH_SECS),
            );
        }
        if !self.set_rumble {
            return None;
        }
        control.set_rumble(
            to_intensity(self.rumble_small),
            to_intensity(self.rumble_big),
        );

        // Durations too large for a Duration keep rumbling
        if self.rumble_duration > 0.0 {
            return Duration::try_from_secs_f64(self.rumble_duration).ok();
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoyFeedbackType {
    #[default]
    Led,
    Rumble,
    Buzzer,
}

/// A single generic joypad feedback entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoyFeedback {
    #[serde(rename = "type")]
    pub kind: JoyFeedbackType,
    pub id: u8,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoyFeedbackArray {
    pub array: Vec<JoyFeedback>,
}

/// LED ids 0, 1 and 2 are the red, green and blue channels. Rumble ids 0 and
/// 1 are the small and big motors. Other entries are ignored.
impl From<&JoyFeedbackArray> for Feedback {
    fn from(msg: &JoyFeedbackArray) -> Self {
        let mut feedback = Feedback::default();
        for entry in msg.array.iter() {
            match entry.kind {
                JoyFeedbackType::Led => {
                    feedback.set_led = true;
                    match entry.id {
                        0 => feedback.led_r = entry.intensity,
                        1 => feedback.led_g = entry.intensity,
                        2 => feedback.led_b = entry.intensity,
                        _ => (),
                    }
                }
                JoyFeedbackType::Rumble => {
                    feedback.set_rumble = true;
                    match entry.id {
                        0 => feedback.rumble_small = entry.intensity,
                        1 => feedback.rumble_big = entry.intensity,
                        _ => (),
                    }
                }
                JoyFeedbackType::Buzzer => (),
            }
        }
        feedback
    }
}

/// A feedback request in either of the accepted message shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackRequest {
    Joy(JoyFeedbackArray),
    Feedback(Feedback),
}
