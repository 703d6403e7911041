//! Per-tick animation: the scrolling destination label and the blinking
//! live indicator.
//!
//! Both are pure functions of [`AnimationState`], which the control loop owns
//! and zeroes at the start of every refresh cycle.

use crate::config::ScheduleConfig;
use crate::scene::IndicatorVisual;

/// Animation counters for one refresh cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationState {
    /// Horizontal shift of the top label, zero or negative
    pub scroll_offset: i32,
    /// Ticks elapsed in this cycle
    pub tick_index: u32,
    /// False once the label has scrolled fully out of view
    pub cycle_active: bool,
}

impl AnimationState {
    /// Fresh state for a new cycle
    pub fn start() -> Self {
        Self {
            cycle_active: true,
            ..Self::default()
        }
    }
}

/// Moves the top label one pixel left per tick.
#[derive(Clone, Copy, Debug)]
pub struct ScrollAnimator {
    char_width: i32,
}

impl ScrollAnimator {
    pub fn new(char_width: u32) -> Self {
        Self {
            char_width: char_width as i32,
        }
    }

    /// Advance one pixel. Returns `true` when the label has moved past its own
    /// width; the offset is then back at zero and the cycle is over.
    pub fn tick(&self, state: &mut AnimationState, text_len: usize) -> bool {
        state.scroll_offset -= 1;

        let span = self.char_width.saturating_mul(text_len as i32);
        if state.scroll_offset < -span {
            state.scroll_offset = 0;
            state.cycle_active = false;
            return true;
        }
        false
    }
}

/// Blinks the live indicator while data is fresh.
///
/// With period `N` the indicator goes off on multiples of `2N` ticks and on
/// at the odd multiples of `N` in between.
#[derive(Clone, Copy, Debug)]
pub struct LivenessBlinker {
    period: u32,
}

impl LivenessBlinker {
    pub fn new(period_ticks: u32) -> Self {
        Self {
            period: period_ticks,
        }
    }

    /// Visual for this tick, or `None` when the blinker does not drive the
    /// indicator (disabled, or data is not live).
    pub fn tick(
        &self,
        tick_index: u32,
        live: bool,
        config: &ScheduleConfig,
    ) -> Option<IndicatorVisual> {
        (config.show_live && live).then(|| self.visual(tick_index))
    }

    pub fn visual(&self, tick_index: u32) -> IndicatorVisual {
        if self.period == 0 {
            return IndicatorVisual::On;
        }
        if (tick_index / self.period) % 2 == 0 {
            IndicatorVisual::Off
        } else {
            IndicatorVisual::On
        }
    }
}
