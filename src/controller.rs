use std::{error::Error, time::Duration};

use tokio::sync::mpsc::Sender;

use crate::{
    config::StatusConfig,
    drivers::ds4::{
        device::{Device, DeviceError},
        driver::Driver,
    },
    messages::{
        feedback::{Feedback, FeedbackRequest, JoyFeedbackArray},
        status::{Joy, Status},
        Header,
    },
    schedule::{driver::SpeedSink, SpeedSpecifier},
};

/// A controller session that turns decoded input reports into [Status]
/// messages and applies [Feedback] requests to the controller.
pub struct Controller<D: Device> {
    driver: Driver<D>,
    frame_id: String,
    imu_frame_id: String,
    deadzone: f64,
    last_joy: Option<Joy>,
}

impl<D: Device> Controller<D> {
    pub fn new(driver: Driver<D>, config: &StatusConfig) -> Self {
        Self {
            driver,
            frame_id: config.frame_id(),
            imu_frame_id: config.imu_frame_id(),
            deadzone: config.deadzone(),
            last_joy: None,
        }
    }

    pub fn name(&self) -> String {
        self.driver.name()
    }

    pub fn driver(&self) -> &Driver<D> {
        &self.driver
    }

    /// Read the next input report and convert it into a [Status]
    pub fn poll_status(&mut self) -> Result<Status, DeviceError> {
        let state = self.driver.poll()?;
        Ok(Status::from_state(
            &state,
            Header::now(self.frame_id.as_str()),
            self.imu_frame_id.as_str(),
            self.deadzone,
        ))
    }

    /// Returns the [Joy] message for the given status if its axes or buttons
    /// changed since the last call
    pub fn joy_if_changed(&mut self, status: &Status) -> Option<Joy> {
        let joy = status.to_joy();
        if let Some(last) = self.last_joy.as_ref() {
            if last.axes == joy.axes && last.buttons == joy.buttons {
                return None;
            }
        }
        self.last_joy = Some(joy.clone());
        Some(joy)
    }

    /// Apply the given feedback and write it to the controller. Returns how
    /// long until [Controller::stop_rumble] should be called, if the feedback
    /// has a rumble duration.
    pub fn handle_feedback(&mut self, feedback: &Feedback) -> Result<Option<Duration>, DeviceError> {
        log::debug!("Applying feedback: {feedback:?}");
        self.driver.update(|control| feedback.apply(control))
    }

    /// Apply the given generic joypad feedback
    pub fn handle_joy_feedback(
        &mut self,
        msg: &JoyFeedbackArray,
    ) -> Result<Option<Duration>, DeviceError> {
        let feedback = Feedback::from(msg);
        self.handle_feedback(&feedback)
    }

    /// Apply a feedback request of either shape
    pub fn handle_request(
        &mut self,
        request: &FeedbackRequest,
    ) -> Result<Option<Duration>, DeviceError> {
        match request {
            FeedbackRequest::Joy(msg) => self.handle_joy_feedback(msg),
            FeedbackRequest::Feedback(feedback) => self.handle_feedback(feedback),
        }
    }

    pub fn stop_rumble(&mut self) -> Result<(), DeviceError> {
        self.driver.rumble(0, 0)
    }

    pub fn close(&mut self) -> Result<(), DeviceError> {
        self.driver.close()
    }
}

/// [SpeedSink] that publishes each sampled speed as a [Status] over a channel
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    frame_id: String,
    imu_frame_id: String,
    tx: Sender<Status>,
}

impl StatusPublisher {
    pub fn new(config: &StatusConfig, tx: Sender<Status>) -> Self {
        Self {
            frame_id: config.frame_id(),
            imu_frame_id: config.imu_frame_id(),
            tx,
        }
    }
}

impl SpeedSink for StatusPublisher {
    fn send(&mut self, speed: SpeedSpecifier) -> Result<(), Box<dyn Error + Send + Sync>> {
        let status = Status::from_speed(
            speed,
            Header::now(self.frame_id.as_str()),
            self.imu_frame_id.as_str(),
        );
        self.tx.try_send(status)?;
        Ok(())
    }
}
