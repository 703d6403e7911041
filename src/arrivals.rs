//! # Arrival Selection and Formatting
//!
//! Turns the raw stop departures reported by the transit data source into a
//! compact [`ArrivalSet`]: the next few departures heading in one of the
//! configured directions, plus whether the route has a posted service alert.
//!
//! ## Selection
//! Departures are scanned in server order and kept when their direction label
//! matches one of the accepted directions (case-insensitive). Scanning stops
//! as soon as [`MAX_ARRIVALS`] matches are collected, so a long departure board
//! costs no more than a short one.
//!
//! ## Failure model
//! A fetch either yields a complete `ArrivalSet` or a [`FetchError`]. The stop
//! request and the alert request count as one unit: if either fails the whole
//! fetch fails and nothing is shown as live.

use crate::{config::TransitConfig, ArrivalSet, MAX_ARRIVALS};
use thiserror::Error;
use tracing::debug;

/// Longest bottom label that still shows three arrivals.
pub const MAX_TIMES_WIDTH: usize = 6;

/// Separator between arrival minutes on the bottom label.
const TIME_SEPARATOR: &str = ",";

/// Everything that can stop a cycle from being live.
///
/// The control loop treats all variants the same way: the cycle is downgraded
/// to non-live and the cause is logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The time source could not produce a sample
    #[error("clock unavailable: {0}")]
    ClockUnavailable(String),

    /// A response was missing a required field or had the wrong shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No departure matched the accepted directions
    #[error("no arrivals matched the configured directions")]
    Empty,

    /// Network, TLS, or HTTP status failure
    #[error("transport failure: {0}")]
    Transport(String),
}

/// One departure as reported by the data source.
///
/// Fields are optional because the source may omit them; only departures that
/// pass the direction filter are required to be complete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawArrival {
    pub direction: Option<String>,
    pub route_symbol: Option<String>,
    pub destination: Option<String>,
    pub departure_epoch: Option<i64>,
}

/// A posted service alert. Only its presence matters here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alert {
    pub id: Option<String>,
}

/// Source of raw departures and alerts.
///
/// Implemented over HTTP by [`crate::transiter::TransiterClient`]; tests use
/// in-memory fakes.
pub trait TransitSource {
    /// Upcoming departures at a stop, in server order
    fn stop_arrivals(&mut self, stop_id: &str) -> Result<Vec<RawArrival>, FetchError>;

    /// Alerts currently posted for a route
    fn route_alerts(&mut self, route_id: &str) -> Result<Vec<Alert>, FetchError>;
}

/// Fetches and normalizes arrivals for one stop and route.
#[derive(Clone, Debug)]
pub struct ArrivalFetcher {
    stop_id: String,
    route_id: String,
    directions: Vec<String>,
}

impl ArrivalFetcher {
    pub fn new(config: &TransitConfig) -> Self {
        Self {
            stop_id: config.stop_id.clone(),
            route_id: config.route_id.clone(),
            directions: config
                .directions
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        }
    }

    /// Fetch the next arrivals relative to `current_time` (epoch seconds).
    pub fn fetch<S: TransitSource + ?Sized>(
        &self,
        source: &mut S,
        current_time: i64,
    ) -> Result<ArrivalSet, FetchError> {
        let departures = source.stop_arrivals(&self.stop_id)?;
        let selected = self.select(&departures)?;
        debug!(matched = selected.len(), scanned = departures.len(), "selected departures");

        let alerts = source.route_alerts(&self.route_id)?;

        let times = selected
            .iter()
            .map(|arrival| minutes_until(arrival.departure_epoch, current_time))
            .collect();
        let first = &selected[0];

        ArrivalSet::new(
            times,
            first.route_symbol.clone(),
            first.destination.clone(),
            !alerts.is_empty(),
        )
        .ok_or(FetchError::Empty)
    }

    /// Keep up to [`MAX_ARRIVALS`] departures heading in an accepted direction.
    fn select(&self, departures: &[RawArrival]) -> Result<Vec<Departure>, FetchError> {
        let mut selected = Vec::with_capacity(MAX_ARRIVALS);

        for raw in departures {
            let direction = raw
                .direction
                .as_deref()
                .ok_or_else(|| FetchError::Malformed("departure without headsign".into()))?;
            if !self.accepts(direction) {
                continue;
            }

            selected.push(Departure::complete(raw)?);
            if selected.len() >= MAX_ARRIVALS {
                break;
            }
        }

        if selected.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(selected)
    }

    fn accepts(&self, direction: &str) -> bool {
        let direction = direction.to_lowercase();
        self.directions.iter().any(|d| *d == direction)
    }
}

/// A departure that passed the direction filter with every field present.
#[derive(Debug)]
struct Departure {
    route_symbol: String,
    destination: String,
    departure_epoch: i64,
}

impl Departure {
    fn complete(raw: &RawArrival) -> Result<Self, FetchError> {
        let missing = |field: &str| FetchError::Malformed(format!("departure without {field}"));
        Ok(Self {
            route_symbol: raw.route_symbol.clone().ok_or_else(|| missing("route"))?,
            destination: raw.destination.clone().ok_or_else(|| missing("destination"))?,
            departure_epoch: raw.departure_epoch.ok_or_else(|| missing("departure time"))?,
        })
    }
}

/// Whole minutes from `now` until `departure`, never negative.
pub fn minutes_until(departure: i64, now: i64) -> u32 {
    let minutes = (departure - now) / 60;
    minutes.clamp(0, u32::MAX as i64) as u32
}

/// Render arrival minutes for the bottom label.
///
/// Up to three times are joined with commas. When that is wider than
/// [`MAX_TIMES_WIDTH`] characters only the first two are shown.
///
/// ```
/// use transit_sign_lib::arrivals::format_times;
///
/// assert_eq!(format_times(&[3, 7, 15]), "3,7,15");
/// assert_eq!(format_times(&[3, 17, 25]), "3,17");
/// ```
pub fn format_times(times: &[u32]) -> String {
    let joined = join_times(&times[..times.len().min(MAX_ARRIVALS)]);
    if joined.len() > MAX_TIMES_WIDTH {
        join_times(&times[..times.len().min(2)])
    } else {
        joined
    }
}

fn join_times(times: &[u32]) -> String {
    times
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(TIME_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn departure(direction: &str, dest: &str, in_secs: i64) -> RawArrival {
        RawArrival {
            direction: Some(direction.to_string()),
            route_symbol: Some("Q".to_string()),
            destination: Some(dest.to_string()),
            departure_epoch: Some(NOW + in_secs),
        }
    }

    /// In-memory source returning canned responses
    struct FakeSource {
        departures: Result<Vec<RawArrival>, FetchError>,
        alerts: Result<Vec<Alert>, FetchError>,
        alert_calls: usize,
    }

    impl FakeSource {
        fn new(departures: Vec<RawArrival>, alerts: usize) -> Self {
            Self {
                departures: Ok(departures),
                alerts: Ok(vec![Alert::default(); alerts]),
                alert_calls: 0,
            }
        }
    }

    impl TransitSource for FakeSource {
        fn stop_arrivals(&mut self, _stop_id: &str) -> Result<Vec<RawArrival>, FetchError> {
            self.departures.clone()
        }

        fn route_alerts(&mut self, _route_id: &str) -> Result<Vec<Alert>, FetchError> {
            self.alert_calls += 1;
            self.alerts.clone()
        }
    }

    fn fetcher() -> ArrivalFetcher {
        ArrivalFetcher::new(&TransitConfig::default())
    }

    #[test]
    fn test_format_times_keeps_three_when_short() {
        assert_eq!(format_times(&[3, 7, 15]), "3,7,15");
        assert_eq!(format_times(&[1]), "1");
        assert_eq!(format_times(&[0, 4]), "0,4");
    }

    #[test]
    fn test_format_times_falls_back_to_two() {
        assert_eq!(format_times(&[3, 17, 25]), "3,17");
        // Two long times stay even if they exceed the width
        assert_eq!(format_times(&[12, 34, 56]), "12,34");
    }

    #[test]
    fn test_minutes_until_truncates_and_floors() {
        assert_eq!(minutes_until(NOW + 119, NOW), 1);
        assert_eq!(minutes_until(NOW + 120, NOW), 2);
        assert_eq!(minutes_until(NOW - 300, NOW), 0);
        assert_eq!(minutes_until(NOW, NOW), 0);
    }

    #[test]
    fn test_filters_directions_case_insensitively() {
        let mut source = FakeSource::new(
            vec![
                departure("Uptown", "96 St", 60),
                departure("Downtown", "Coney Island", 150),
                departure("BROOKLYN", "Coney Island", 560),
                departure("Uptown", "96 St", 600),
                departure("downtown and brooklyn", "Coney Island", 900),
            ],
            0,
        );

        let set = fetcher().fetch(&mut source, NOW).unwrap();
        assert_eq!(set.times(), &[2, 9, 15]);
        assert_eq!(set.destination(), "Coney Island");
        assert_eq!(set.symbol(), "Q");
        assert!(!set.alert_active());
    }

    #[test]
    fn test_stops_after_three_matches() {
        let mut departures: Vec<_> = (1..=3)
            .map(|i| departure("downtown", "Coney Island", i * 60))
            .collect();
        // Broken entry past the third match is never inspected
        departures.push(RawArrival::default());

        let mut source = FakeSource::new(departures, 2);
        let set = fetcher().fetch(&mut source, NOW).unwrap();
        assert_eq!(set.times(), &[1, 2, 3]);
        assert!(set.alert_active());
    }

    #[test]
    fn test_no_match_is_empty() {
        let mut source = FakeSource::new(vec![departure("uptown", "96 St", 60)], 0);
        assert_eq!(fetcher().fetch(&mut source, NOW), Err(FetchError::Empty));
        assert_eq!(source.alert_calls, 0);
    }

    #[test]
    fn test_missing_field_on_match_is_malformed() {
        let mut broken = departure("downtown", "Coney Island", 60);
        broken.departure_epoch = None;
        let mut source = FakeSource::new(vec![broken], 0);

        assert!(matches!(
            fetcher().fetch(&mut source, NOW),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_headsign_is_malformed() {
        let mut source = FakeSource::new(vec![RawArrival::default()], 0);
        assert!(matches!(
            fetcher().fetch(&mut source, NOW),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_alert_failure_fails_whole_fetch() {
        let mut source = FakeSource::new(vec![departure("downtown", "Coney Island", 60)], 0);
        source.alerts = Err(FetchError::Transport("connection reset".into()));

        assert_eq!(
            fetcher().fetch(&mut source, NOW),
            Err(FetchError::Transport("connection reset".into()))
        );
    }

    #[test]
    fn test_stop_failure_skips_alerts() {
        let mut source = FakeSource::new(vec![], 0);
        source.departures = Err(FetchError::Transport("timed out".into()));

        assert!(fetcher().fetch(&mut source, NOW).is_err());
        assert_eq!(source.alert_calls, 0);
    }
}
