//! Time sources for the clock gate.
//!
//! The sign runs on boards whose local clock may not be set, so the current
//! time can come from a remote strftime service as well as the host clock.
//! Either way the sample is UTC.

use crate::arrivals::FetchError;
use crate::transiter::HttpClient;
use crate::ClockSample;
use chrono::{NaiveDateTime, Utc};

/// Format returned by the remote time service, e.g. `2025:07:24:15:04:05`
pub const REMOTE_TIME_FORMAT: &str = "%Y:%m:%d:%H:%M:%S";

/// Anything that can report the current UTC time.
pub trait TimeSource {
    fn now(&mut self) -> Result<ClockSample, FetchError>;

    /// Epoch seconds to time a fetch against when [`now`](Self::now) fails.
    /// Only used for cycles that are never shown as live.
    fn fallback_epoch(&mut self) -> i64 {
        Utc::now().timestamp()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn now(&mut self) -> Result<ClockSample, FetchError> {
        (**self).now()
    }

    fn fallback_epoch(&mut self) -> i64 {
        (**self).fallback_epoch()
    }
}

/// Host system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&mut self) -> Result<ClockSample, FetchError> {
        Ok(ClockSample::from_datetime(Utc::now()))
    }
}

/// Remote strftime service polled over HTTPS
pub struct HttpClock {
    client: HttpClient,
    url: String,
}

impl HttpClock {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl TimeSource for HttpClock {
    fn now(&mut self) -> Result<ClockSample, FetchError> {
        let body = self
            .client
            .get_text(&self.url)
            .map_err(|e| FetchError::ClockUnavailable(e.to_string()))?;
        parse_remote_time(&body)
    }
}

/// Parse the remote service's `YYYY:MM:DD:HH:MM:SS` body.
pub fn parse_remote_time(body: &str) -> Result<ClockSample, FetchError> {
    let at = NaiveDateTime::parse_from_str(body.trim(), REMOTE_TIME_FORMAT)
        .map_err(|e| FetchError::ClockUnavailable(format!("unparseable time {body:?}: {e}")))?
        .and_utc();
    Ok(ClockSample::from_datetime(at))
}
