use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::SendError, Receiver, Sender},
    time::{sleep_until, Instant},
};

use super::driver::{DriverState, ScheduleDriver, SpeedSink};

/// Size of the timer command channel
const BUFFER_SIZE: usize = 8;

/// A [TimerCommand] is a message that can be sent to a running
/// [ScheduleTimer] over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Stop,
}

/// Possible errors for a schedule timer client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to send command to timer")]
    SendError(SendError<TimerCommand>),
}

impl From<SendError<TimerCommand>> for ClientError {
    fn from(err: SendError<TimerCommand>) -> Self {
        Self::SendError(err)
    }
}

/// A client for communicating with a running [ScheduleTimer]
#[derive(Debug, Clone)]
pub struct TimerClient {
    tx: Sender<TimerCommand>,
}

impl TimerClient {
    /// Request the timer to stop. Fails if the timer has already finished.
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.tx.send(TimerCommand::Stop).await?;
        Ok(())
    }

    /// Returns true if the timer has finished running
    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs a [ScheduleDriver] on the tokio clock with exactly one pending sleep
/// at a time.
#[derive(Debug)]
pub struct ScheduleTimer {
    driver: ScheduleDriver,
    rx: Receiver<TimerCommand>,
}

impl ScheduleTimer {
    pub fn new(driver: ScheduleDriver) -> (Self, TimerClient) {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        (Self { driver, rx }, TimerClient { tx })
    }

    /// Start the driver and fire it until the schedule finishes or a stop is
    /// requested. Returns the driver in its final state.
    pub async fn run<S>(mut self, mut sink: S) -> ScheduleDriver
    where
        S: SpeedSink + Send,
    {
        self.driver.start();
        let mut deadline = Instant::now() + self.driver.tick();
        let mut listening = true;

        while self.driver.state() == DriverState::Running {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    let now = Instant::now();
                    let Some(tick) = self.driver.fire(now.into_std(), &mut sink) else {
                        break;
                    };
                    let Some(next) = tick.next else {
                        break;
                    };
                    deadline = now + next;
                }
                cmd = self.rx.recv(), if listening => match cmd {
                    Some(TimerCommand::Stop) => {
                        log::debug!("Received stop command");
                        self.driver.stop();
                    }
                    None => {
                        // All clients dropped; keep running to completion
                        listening = false;
                    }
                },
            }
        }

        self.rx.close();
        self.driver
    }
}
