//! Piecewise-constant velocity/turn schedules keyed by elapsed time.
pub mod driver;
pub mod timer;

use std::{fmt::Display, time::Duration};

use serde::Serialize;
use thiserror::Error;

/// Possible errors building or querying a [Schedule]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("Invalid time: {0}")]
    InvalidTime(f64),
}

/// Component of a [SpeedSpecifier]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Velocity,
    Turn,
}

/// A (velocity, turn) pair with both values in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeedSpecifier {
    velocity: f64,
    turn: f64,
}

impl SpeedSpecifier {
    /// Both axes at rest
    pub const REST: Self = Self {
        velocity: 0.0,
        turn: 0.0,
    };

    pub fn new(velocity: f64, turn: f64) -> Result<Self, ScheduleError> {
        let range = -1.0..=1.0;
        if !range.contains(&velocity) || !range.contains(&turn) {
            return Err(ScheduleError::InvalidSchedule(format!(
                "speed out of range: velocity {velocity}, turn {turn}"
            )));
        }
        Ok(Self { velocity, turn })
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn turn(&self) -> f64 {
        self.turn
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Velocity => self.velocity,
            Axis::Turn => self.turn,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.velocity == 0.0 && self.turn == 0.0
    }
}

impl Display for SpeedSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "speed: {:.3}, turn: {:.3}", self.velocity, self.turn)
    }
}

/// Ordered breakpoints of (time offset in seconds, speed). Each speed holds
/// until the next breakpoint. A schedule always starts at offset 0 and always
/// ends at rest, so anything following it eventually stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    breakpoints: Vec<(f64, SpeedSpecifier)>,
}

impl Schedule {
    /// Build a schedule from the given breakpoints in any order. A resting
    /// breakpoint is inserted at offset 0 if none is given.
    pub fn new(mut breakpoints: Vec<(f64, SpeedSpecifier)>) -> Result<Self, ScheduleError> {
        if let Some((offset, _)) = breakpoints
            .iter()
            .find(|(offset, _)| !offset.is_finite() || *offset < 0.0)
        {
            return Err(ScheduleError::InvalidSchedule(format!(
                "invalid time offset: {offset}"
            )));
        }

        breakpoints.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = breakpoints.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ScheduleError::InvalidSchedule(format!(
                "duplicate time offset: {}",
                pair[0].0
            )));
        }

        // First offset must be zero, else there is a period without a value
        let starts_at_zero = breakpoints
            .first()
            .is_some_and(|(offset, _)| *offset == 0.0);
        if !starts_at_zero {
            breakpoints.insert(0, (0.0, SpeedSpecifier::REST));
        }

        // Last value must be at rest, else we never stop
        if let Some((offset, speed)) = breakpoints.last() {
            if !speed.is_rest() {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "final breakpoint at {offset} is not at rest ({speed})"
                )));
            }
        }

        Ok(Self { breakpoints })
    }

    /// Build a schedule from (offset, velocity, turn) checkpoints
    pub fn from_checkpoints(checkpoints: &[(f64, f64, f64)]) -> Result<Self, ScheduleError> {
        let breakpoints = checkpoints
            .iter()
            .map(|&(offset, velocity, turn)| Ok((offset, SpeedSpecifier::new(velocity, turn)?)))
            .collect::<Result<Vec<_>, ScheduleError>>()?;
        Self::new(breakpoints)
    }

    /// Build a schedule from consecutive (duration, velocity, turn) segments.
    /// Each segment's value starts once its duration has accumulated onto the
    /// previous offset, velocity alternates sign between segments, and the
    /// schedule comes to rest one last duration after the final segment.
    pub fn from_segments(segments: &[(f64, f64, f64)]) -> Result<Self, ScheduleError> {
        let mut checkpoints = Vec::with_capacity(segments.len() + 1);
        let mut offset = 0.0;
        for (i, &(duration, velocity, turn)) in segments.iter().enumerate() {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "invalid segment duration: {duration}"
                )));
            }
            offset += duration;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            checkpoints.push((offset, sign * velocity, turn));
        }
        if let Some(&(duration, _, _)) = segments.last() {
            checkpoints.push((offset + duration, 0.0, 0.0));
        }

        Self::from_checkpoints(&checkpoints)
    }

    /// Build a back-and-forth schedule of the given number of cycles, each
    /// made of two segments of the given duration.
    pub fn oscillating(
        cycles: usize,
        duration: f64,
        velocity: f64,
        turn: f64,
    ) -> Result<Self, ScheduleError> {
        let segments = vec![(duration, velocity, turn); cycles * 2];
        Self::from_segments(&segments)
    }

    /// Build a schedule that holds the given speed from the start for the
    /// given duration and then rests
    pub fn single(duration: f64, velocity: f64, turn: f64) -> Result<Self, ScheduleError> {
        if duration == 0.0 {
            return Self::new(Vec::new());
        }
        Self::from_checkpoints(&[(0.0, velocity, turn), (duration, 0.0, 0.0)])
    }

    pub fn breakpoints(&self) -> &[(f64, SpeedSpecifier)] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Offset of the final (resting) breakpoint in seconds
    pub fn end_time(&self) -> f64 {
        self.breakpoints
            .last()
            .map(|(offset, _)| *offset)
            .unwrap_or_default()
    }

    /// Returns the value of the given axis at the given elapsed time in
    /// seconds
    pub fn value_at(&self, elapsed: f64, axis: Axis) -> Result<f64, ScheduleError> {
        if elapsed.is_nan() || elapsed < 0.0 {
            return Err(ScheduleError::InvalidTime(elapsed));
        }
        Ok(self.lookup(elapsed).get(axis))
    }

    /// Returns the speed at the given elapsed time
    pub fn speed_at(&self, elapsed: Duration) -> SpeedSpecifier {
        self.lookup(elapsed.as_secs_f64())
    }

    /// Returns true once the elapsed time in seconds is past the final
    /// breakpoint
    pub fn is_done(&self, elapsed: f64) -> bool {
        elapsed > self.end_time()
    }

    fn lookup(&self, elapsed: f64) -> SpeedSpecifier {
        // Index of the first breakpoint after the elapsed time
        let next = self
            .breakpoints
            .partition_point(|(offset, _)| *offset <= elapsed);
        if next == 0 || next >= self.breakpoints.len() {
            return SpeedSpecifier::REST;
        }
        self.breakpoints[next - 1].1
    }
}
