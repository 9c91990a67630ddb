//! Simulation Time
//!
//! Step-based simulation clock with derived day and year.
//!
//! # Example
//!
//! ```
//! use fad_events::SimTime;
//!
//! let time = SimTime::new(740, 2);
//! assert_eq!(time.day(), 370);
//! assert_eq!(time.year(), 1);
//! assert_eq!(time.to_string(), "year_1.day_5.step_0");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of days in a simulated year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Steps per simulated day when nothing else is configured.
pub const DEFAULT_STEPS_PER_DAY: u32 = 1;

/// A point in simulation time.
///
/// Days and years are zero-based and derived from the monotonic step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Monotonically increasing simulation step.
    pub step: u64,
    /// How many steps make up one day.
    pub steps_per_day: u32,
}

impl SimTime {
    /// Creates a new SimTime.
    pub fn new(step: u64, steps_per_day: u32) -> Self {
        assert!(steps_per_day > 0, "steps_per_day must be positive");
        Self { step, steps_per_day }
    }

    /// Creates a SimTime for the start of the simulation.
    pub fn start(steps_per_day: u32) -> Self {
        Self::new(0, steps_per_day)
    }

    /// Whole days elapsed since the start of the simulation.
    pub fn day(&self) -> u32 {
        (self.step / self.steps_per_day as u64) as u32
    }

    /// Zero-based simulation year.
    pub fn year(&self) -> u32 {
        self.day() / DAYS_PER_YEAR
    }

    /// Zero-based day within the current year.
    pub fn day_of_year(&self) -> u32 {
        self.day() % DAYS_PER_YEAR
    }

    /// Step offset within the current day.
    pub fn step_of_day(&self) -> u32 {
        (self.step % self.steps_per_day as u64) as u32
    }

    /// True on the first step of each day.
    pub fn is_start_of_day(&self) -> bool {
        self.step_of_day() == 0
    }

    /// Whole days elapsed since `step`, rounding the earlier step down to its day.
    pub fn days_since(&self, step: u64) -> u32 {
        self.day()
            .saturating_sub((step / self.steps_per_day as u64) as u32)
    }

    /// Increments the step counter by one.
    pub fn advance_step(&mut self) {
        self.step += 1;
    }

    /// Advances to the first step of the next day.
    pub fn advance_day(&mut self) {
        let next_day = self.day() as u64 + 1;
        self.step = next_day * self.steps_per_day as u64;
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::start(DEFAULT_STEPS_PER_DAY)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year_{}.day_{}.step_{}",
            self.year(),
            self.day_of_year(),
            self.step_of_day()
        )
    }
}
