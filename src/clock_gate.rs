//! Clock gate: decides whether the sign should be lit, dark, or restarted.
//!
//! All hours are UTC. The active window may wrap past midnight.
//!
//! Window semantics for `on_hour`/`off_hour`:
//! - `on_hour < off_hour`: lit for `on_hour <= hour < off_hour`
//! - otherwise (overnight, or equal hours): lit for `hour >= on_hour || hour < off_hour`;
//!   equal hours therefore mean "always lit"
//!
//! In both cases `on_hour` is the first lit hour and `off_hour` the first dark hour.

use crate::config::ScheduleConfig;
use crate::ClockSample;

/// Outcome of one gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Blank the panel and end the control loop
    Restart,
    /// Outside the active window; blank and poll again later
    Inactive,
    /// Inside the active window at this hour
    Active(u8),
    /// No clock sample this cycle; data cannot be marked live
    ClockUnavailable,
}

impl Verdict {
    /// Whether a fetch and scene update should be attempted this cycle
    pub fn allows_fetch(&self) -> bool {
        matches!(self, Verdict::Active(_) | Verdict::ClockUnavailable)
    }
}

/// Tracks the previously observed hour so the scheduled restart fires only
/// on the transition into `restart_hour`.
#[derive(Debug, Clone)]
pub struct ClockGate {
    previous_hour: u8,
}

impl ClockGate {
    /// Start as if the last seen hour were `restart_hour`, so booting during
    /// the restart hour does not restart again.
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            previous_hour: config.restart_hour,
        }
    }

    pub fn previous_hour(&self) -> u8 {
        self.previous_hour
    }

    /// Classify the current cycle.
    ///
    /// `free_memory` is the latest reading of the memory probe, if any. The
    /// previous hour is updated on every classified sample, dark hours
    /// included, so the restart boundary is seen even when the sign is dark
    /// during the hour before it.
    pub fn evaluate(
        &mut self,
        sample: Option<&ClockSample>,
        free_memory: Option<u64>,
        config: &ScheduleConfig,
    ) -> Verdict {
        let Some(sample) = sample else {
            return Verdict::ClockUnavailable;
        };
        let hour = sample.hour_of_day;
        let previous = std::mem::replace(&mut self.previous_hour, hour);

        if is_restart_boundary(previous, hour, config.restart_hour) {
            return Verdict::Restart;
        }
        if free_memory.is_some_and(|free| free < config.low_memory_threshold_bytes) {
            return Verdict::Restart;
        }

        if is_active_hour(hour, config.on_hour, config.off_hour) {
            Verdict::Active(hour)
        } else {
            Verdict::Inactive
        }
    }
}

/// Hour before `restart_hour`, wrapping at midnight
pub fn hour_before(restart_hour: u8) -> u8 {
    (restart_hour + 23) % 24
}

fn is_restart_boundary(previous: u8, current: u8, restart_hour: u8) -> bool {
    previous == hour_before(restart_hour) && current == restart_hour
}

/// Whether `hour` falls inside the window starting at `on_hour` and ending
/// before `off_hour`.
pub fn is_active_hour(hour: u8, on_hour: u8, off_hour: u8) -> bool {
    if on_hour < off_hour {
        on_hour <= hour && hour < off_hour
    } else {
        hour >= on_hour || hour < off_hour
    }
}
