//! # Main Control Loop
//!
//! The sign's state machine. One [`Controller`] owns the scene, the animation
//! counters and every collaborator, and advances one transition per call to
//! [`Controller::step`].
//!
//! ## Phases
//!
//! ```text
//!            ┌──────────── scroll complete ────────────┐
//!            ▼                                         │
//!   ──▶  Reset ──── active / clock unavailable ──▶ Animating ──┐
//!        │   ▲                                         ▲       │ tick
//!        │   └──── idle interval ──── Idle             └───────┘
//!        │                             ▲
//!        ├──── outside window ─────────┘
//!        └──── restart ──▶ Terminal
//! ```
//!
//! - **Reset**: sample the clock, ask the gate for a verdict, fetch arrivals,
//!   apply them to the scene, zero the animation counters
//! - **Animating**: scroll one pixel, blink, refresh, sleep one tick
//! - **Idle**: panel blanked; wait, then poll the clock again
//! - **Terminal**: panel blanked; the loop is over
//!
//! Fetch failures never leave Reset: the cycle simply continues as not live.

use crate::animation::{AnimationState, LivenessBlinker, ScrollAnimator};
use crate::arrivals::{ArrivalFetcher, FetchError, TransitSource};
use crate::clock::TimeSource;
use crate::clock_gate::{ClockGate, Verdict};
use crate::config::{Config, ScheduleConfig};
use crate::display::DisplaySink;
use crate::health::MemoryProbe;
use crate::scene::Scene;
use crate::ArrivalSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reset,
    Animating,
    Idle,
    Terminal,
}

/// Blocking wait between ticks and polls
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the current thread
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// External collaborators driven by the loop
pub struct Collaborators<T, S, D, M, Z> {
    pub time: T,
    pub transit: S,
    pub display: D,
    pub memory: M,
    pub sleeper: Z,
}

/// The sign's control loop
pub struct Controller<T, S, D, M, Z> {
    schedule: ScheduleConfig,
    tick_latency: Duration,
    scene: Scene,
    animation: AnimationState,
    gate: ClockGate,
    fetcher: ArrivalFetcher,
    scroll: ScrollAnimator,
    blinker: LivenessBlinker,
    phase: Phase,
    live: bool,
    io: Collaborators<T, S, D, M, Z>,
}

impl<T, S, D, M, Z> Controller<T, S, D, M, Z>
where
    T: TimeSource,
    S: TransitSource,
    D: DisplaySink,
    M: MemoryProbe,
    Z: Sleeper,
{
    /// Build the startup scene and push it once.
    pub fn new(config: &Config, io: Collaborators<T, S, D, M, Z>) -> Self {
        let schedule = config.schedule.clone();
        let mut controller = Self {
            tick_latency: Duration::try_from_secs_f32(schedule.tick_latency_seconds)
                .unwrap_or_default(),
            scene: Scene::new(config),
            animation: AnimationState::default(),
            gate: ClockGate::new(&schedule),
            fetcher: ArrivalFetcher::new(&config.transit),
            scroll: ScrollAnimator::new(config.display.char_width),
            blinker: LivenessBlinker::new(schedule.live_blink_period_ticks),
            phase: Phase::Reset,
            live: false,
            schedule,
            io,
        };
        controller.push_refresh();
        controller
    }

    /// Run until the restart verdict.
    pub fn run(&mut self) {
        info!("control loop started");
        while self.step() != Phase::Terminal {}
        info!("control loop finished; restart requested");
    }

    /// Perform one transition and return the new phase.
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Reset => self.reset(),
            Phase::Animating => self.animate(),
            Phase::Idle => {
                self.io
                    .sleeper
                    .sleep(Duration::from_secs(self.schedule.idle_interval_seconds));
                Phase::Reset
            }
            Phase::Terminal => Phase::Terminal,
        };
        self.phase
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Whether the current cycle's data is live
    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn collaborators(&self) -> &Collaborators<T, S, D, M, Z> {
        &self.io
    }

    pub fn collaborators_mut(&mut self) -> &mut Collaborators<T, S, D, M, Z> {
        &mut self.io
    }

    fn reset(&mut self) -> Phase {
        self.animation = AnimationState::default();

        let sample = self.io.time.now();
        let free_memory = self.io.memory.free_memory();
        debug!(
            populated = self.scene.is_populated(),
            free_memory = ?free_memory,
            "starting refresh cycle"
        );

        let verdict = self
            .gate
            .evaluate(sample.as_ref().ok(), free_memory, &self.schedule);
        match verdict {
            Verdict::Restart => {
                info!(free_memory = ?free_memory, "restart verdict; blanking panel");
                self.push_blank();
                return Phase::Terminal;
            }
            Verdict::Inactive => {
                debug!("outside active window; panel dark");
                self.push_blank();
                return Phase::Idle;
            }
            Verdict::Active(hour) => {
                debug!(hour, epoch = ?sample.as_ref().map(|s| s.epoch_seconds).ok(), "active");
            }
            Verdict::ClockUnavailable => {}
        }

        let (arrivals, live) = match sample {
            Ok(sample) => match self.fetcher.fetch(&mut self.io.transit, sample.epoch_seconds) {
                Ok(set) => (Some(set), true),
                Err(err) => {
                    log_failure(&err);
                    (None, false)
                }
            },
            Err(clock_err) => {
                log_failure(&clock_err);
                // Still polls the server so its state shows up in the log.
                // The result is never live, so the scene keeps its labels.
                let epoch = self.io.time.fallback_epoch();
                let arrivals = self
                    .fetcher
                    .fetch(&mut self.io.transit, epoch)
                    .map_err(|err| log_failure(&err))
                    .ok();
                (arrivals, false)
            }
        };

        if let Some(set) = arrivals.as_ref().filter(|_| live) {
            log_arrivals(set);
        }
        self.live = live;
        self.scene.apply(arrivals.as_ref(), live, &self.schedule);
        debug!(live, "scene updated");

        if !self.scene.is_populated() {
            debug!("nothing to show yet; waiting before retry");
            self.io
                .sleeper
                .sleep(Duration::from_secs(self.schedule.setup_retry_seconds));
        }

        self.animation = AnimationState::start();
        self.scene.set_scroll_offset(0);
        Phase::Animating
    }

    fn animate(&mut self) -> Phase {
        let completed = self
            .scroll
            .tick(&mut self.animation, self.scene.top_text_len());
        self.scene.set_scroll_offset(self.animation.scroll_offset);

        if let Some(visual) = self
            .blinker
            .tick(self.animation.tick_index, self.live, &self.schedule)
        {
            self.scene.set_live_visual(visual);
        }

        // No refresh on the completing frame; the next cycle redraws
        if !completed {
            self.push_refresh();
        }

        self.animation.tick_index = self.animation.tick_index.wrapping_add(1);
        self.io.sleeper.sleep(self.tick_latency);

        if completed {
            Phase::Reset
        } else {
            Phase::Animating
        }
    }

    fn push_refresh(&mut self) {
        if let Err(err) = self.io.display.refresh(&self.scene) {
            warn!("display refresh failed: {err}");
        }
    }

    fn push_blank(&mut self) {
        if let Err(err) = self.io.display.blank() {
            warn!("display blank failed: {err}");
        }
    }
}

fn log_failure(err: &FetchError) {
    info!(cause = %err, "cycle is not live");
}

fn log_arrivals(set: &ArrivalSet) {
    info!(
        times = %set.formatted_times(),
        symbol = set.symbol(),
        destination = set.destination(),
        alert = set.alert_active(),
        "arrivals updated"
    );
}
