use std::{
    error::Error,
    time::{Duration, Instant},
};

use super::{Schedule, SpeedSpecifier};

/// Default interval between two samples of a running schedule
pub const DEFAULT_TICK: Duration = Duration::from_millis(5);

/// Destination for the speeds sampled from a running schedule
pub trait SpeedSink {
    fn send(&mut self, speed: SpeedSpecifier) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl<F> SpeedSink for F
where
    F: FnMut(f64, f64),
{
    fn send(&mut self, speed: SpeedSpecifier) -> Result<(), Box<dyn Error + Send + Sync>> {
        self(speed.velocity(), speed.turn());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Finished,
}

/// Result of a single fire of the [ScheduleDriver]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Time since the first fire
    pub elapsed: Duration,
    /// Speed sent to the sink
    pub speed: SpeedSpecifier,
    /// Delay until the next fire, or [None] if the schedule is finished
    pub next: Option<Duration>,
}

/// Samples a [Schedule] at a fixed quantum and forwards each sample to a
/// [SpeedSink]. The driver does not sleep on its own; the owner calls
/// [ScheduleDriver::fire] once the delay returned by the previous fire has
/// passed.
#[derive(Debug, Clone)]
pub struct ScheduleDriver {
    schedule: Schedule,
    tick: Duration,
    state: DriverState,
    started_at: Option<Instant>,
    last_elapsed: Duration,
}

impl ScheduleDriver {
    pub fn new(schedule: Schedule) -> Self {
        Self::with_tick(schedule, DEFAULT_TICK)
    }

    pub fn with_tick(schedule: Schedule, tick: Duration) -> Self {
        Self {
            schedule,
            tick,
            state: DriverState::Idle,
            started_at: None,
            last_elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Elapsed time seen by the most recent fire
    pub fn last_elapsed(&self) -> Duration {
        self.last_elapsed
    }

    /// Begin running the schedule. Has no effect unless the driver is idle.
    pub fn start(&mut self) {
        if self.state == DriverState::Idle {
            log::debug!("Starting schedule ending at {}s", self.schedule.end_time());
            self.state = DriverState::Running;
        }
    }

    /// Stop running the schedule. A driver that never started stays idle.
    pub fn stop(&mut self) {
        if self.state == DriverState::Running {
            log::debug!("Stopping schedule after {:?}", self.last_elapsed);
            self.state = DriverState::Finished;
        }
    }

    /// Returns the time elapsed since the first fire, recording `now` as the
    /// start time if this is the first fire. Never goes backwards.
    pub fn elapsed(&mut self, now: Instant) -> Duration {
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started_at);
        self.last_elapsed = self.last_elapsed.max(elapsed);
        self.last_elapsed
    }

    /// Returns the delay before the next fire for the given elapsed time, or
    /// [None] if the schedule is done at that time.
    pub fn next_delay(&self, elapsed: Duration) -> Option<Duration> {
        if self.schedule.is_done(elapsed.as_secs_f64()) {
            return None;
        }
        Some(self.tick)
    }

    /// Sample the schedule at `now` and send the speed to the given sink.
    /// Returns [None] without touching the sink unless the driver is running.
    pub fn fire<S>(&mut self, now: Instant, sink: &mut S) -> Option<Tick>
    where
        S: SpeedSink + ?Sized,
    {
        if self.state != DriverState::Running {
            return None;
        }

        let elapsed = self.elapsed(now);
        let speed = self.schedule.speed_at(elapsed);
        log::trace!("Schedule at {elapsed:?}: {speed}");
        if let Err(e) = sink.send(speed) {
            log::warn!("Failed to send schedule speed: {e:?}");
        }

        let next = self.next_delay(elapsed);
        if next.is_none() {
            log::debug!("Schedule finished after {elapsed:?}");
            self.state = DriverState::Finished;
        }

        Some(Tick {
            elapsed,
            speed,
            next,
        })
    }
}
