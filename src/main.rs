//! # Transit Sign Application Entry Point
//!
//! This binary wires the control loop to its real collaborators: the
//! Transiter HTTP API, a clock source, the memory probe, and a display sink.
//! It supports a development mode (`--stdout`) that draws each frame as ASCII
//! art in the terminal.
//!
//! The process exits when the control loop reaches its restart verdict; a
//! supervisor (systemd, a shell loop) is expected to start it again.

use std::env;

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use transit_sign_lib::{
    clock::{HttpClock, SystemClock, TimeSource},
    config::Config,
    controller::{Collaborators, Controller, ThreadSleeper},
    display::{DisplaySink, FramebufferSink, TerminalSink},
    health::ProcMeminfo,
    transiter::{HttpClient, TransiterClient},
};

/// Initialize logging.
///
/// `RUST_LOG` overrides the default, which is `debug` for this crate in
/// verbose mode and `warn` otherwise.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,transit_sign=debug,transit_sign_lib=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Development mode: render to stdout for testing without hardware
    let development_mode = env::args().any(|arg| arg == "--stdout");
    let config_path = env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1);

    let config = match &config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    init_logging(config.schedule.verbose);
    info!(
        stop = %config.transit.stop_id,
        route = %config.transit.route_id,
        on_hour = config.schedule.on_hour,
        off_hour = config.schedule.off_hour,
        restart_hour = config.schedule.restart_hour,
        "starting transit sign"
    );

    let http = HttpClient::new()?;

    let time: Box<dyn TimeSource> = match &config.clock.url {
        Some(url) => Box::new(HttpClock::new(http.clone(), url.clone())),
        None => Box::new(SystemClock),
    };

    let d = &config.display;
    let framebuffer = FramebufferSink::new(d.width, d.height, d.background);
    let display: Box<dyn DisplaySink> = if development_mode {
        Box::new(TerminalSink::new(framebuffer, std::io::stdout()))
    } else {
        warn!("no matrix driver attached; frames are rendered in memory only. Use --stdout to view them.");
        Box::new(framebuffer)
    };

    let mut controller = Controller::new(
        &config,
        Collaborators {
            time,
            transit: TransiterClient::new(http, &config.transit),
            display,
            memory: ProcMeminfo::default(),
            sleeper: ThreadSleeper,
        },
    );
    controller.run();

    info!("restarting");
    Ok(())
}
