//! # Transit Sign Core Library
//!
//! This library drives a 64x32 pixel LED matrix showing the next arrivals for
//! a single transit stop. It owns a persistent scene graph that is mutated in
//! place every refresh cycle, scrolls the destination label across the panel,
//! blinks a liveness indicator while data is fresh, and powers the panel down
//! outside a configured wall-clock window.
//!
//! ## Design Philosophy
//!
//! ### One control thread
//! Everything runs inside [`controller::Controller`]: a single cooperative,
//! tick-driven loop. Network fetches block the loop while they run, which
//! pauses the scroll for the duration of the request. The scene is never
//! shared, so a refresh can never observe a half-updated frame.
//!
//! ### Stable slots
//! The [`scene::Scene`] is built once at startup. Each visual element lives in
//! a permanent named slot and only its content changes. The alert marker is
//! the single optional slot and is modelled as a presence flag.
//!
//! ### Graceful degradation
//! Every fetch failure downgrades the cycle to "not live": the last good
//! content stays on screen and the live indicator is held solid. The only
//! terminal condition is the scheduled restart.
//!
//! ### Data Flow
//! 1. **Reset**: sample the clock → ask the [`clock_gate::ClockGate`] for a verdict
//!    → fetch arrivals → apply them to the scene
//! 2. **Animating**: scroll + blink + refresh every tick until one full scroll
//! 3. Back to **Reset**
//!
//! ## Core Types
//! - [`ArrivalSet`]: normalized result of one successful arrival fetch
//! - [`ClockSample`]: current epoch time and hour of day (UTC)

use chrono::{DateTime, Timelike, Utc};

// Module declarations
pub mod animation;
pub mod arrivals;
pub mod clock;
pub mod clock_gate;
pub mod config;
pub mod controller;
pub mod display;
pub mod health;
pub mod renderer;
pub mod scene;
pub mod transiter;

#[cfg(test)]
mod tests;

/// Maximum number of upcoming arrivals kept per fetch.
pub const MAX_ARRIVALS: usize = 3;

/// Result of one successful arrival fetch.
///
/// An `ArrivalSet` always holds between one and [`MAX_ARRIVALS`] times. A
/// failed fetch never produces a partial set; use [`ArrivalSet::new`] which
/// refuses empty input.
///
/// # Example
/// ```
/// use transit_sign_lib::ArrivalSet;
///
/// let set = ArrivalSet::new(vec![2, 9, 14], "Q", "Coney Island", false).unwrap();
/// assert_eq!(set.times(), &[2, 9, 14]);
/// assert_eq!(set.formatted_times(), "2,9,14");
///
/// assert!(ArrivalSet::new(vec![], "Q", "Coney Island", false).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrivalSet {
    times: Vec<u32>,
    symbol: String,
    destination: String,
    alert_active: bool,
}

impl ArrivalSet {
    /// Build an arrival set, keeping at most [`MAX_ARRIVALS`] times.
    ///
    /// Returns `None` when `times` is empty.
    pub fn new(
        mut times: Vec<u32>,
        symbol: impl Into<String>,
        destination: impl Into<String>,
        alert_active: bool,
    ) -> Option<Self> {
        if times.is_empty() {
            return None;
        }
        times.truncate(MAX_ARRIVALS);
        Some(Self {
            times,
            symbol: symbol.into(),
            destination: destination.into(),
            alert_active,
        })
    }

    /// Minutes until each arrival, in arrival order.
    pub fn times(&self) -> &[u32] {
        &self.times
    }

    /// Route symbol shown inside the badge.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Terminal or direction name for the scrolling label.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Whether a service alert is posted for the route.
    pub fn alert_active(&self) -> bool {
        self.alert_active
    }

    /// Times rendered for the bottom label. See [`arrivals::format_times`].
    pub fn formatted_times(&self) -> String {
        arrivals::format_times(&self.times)
    }
}

/// Current wall-clock time in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSample {
    /// Seconds since the Unix epoch
    pub epoch_seconds: i64,
    /// Hour of day, 0..=23
    pub hour_of_day: u8,
}

impl ClockSample {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            epoch_seconds: at.timestamp(),
            hour_of_day: at.hour() as u8,
        }
    }
}
