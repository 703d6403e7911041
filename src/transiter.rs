//! # Transiter HTTP Client
//!
//! Network access for the sign: a small blocking wrapper around `reqwest`
//! and the [`TransitSource`] implementation for the Transiter API.
//!
//! ## Data Source
//! - **Stop**: `{base}/stops/{stop_id}` lists upcoming departures as
//!   `stopTimes[]` with `headsign`, `trip.route.id`, `destination.name` and
//!   `departure.time` (epoch seconds, sent as a decimal string)
//! - **Route**: `{base}/routes/{route_id}` carries the posted `alerts[]`
//!
//! Query flags skip the parts of each response the sign never reads, which
//! keeps the payload small on slow Wi-Fi.
//!
//! ## Blocking model
//! The control loop is single threaded and synchronous. Each request runs to
//! completion on a private current-thread Tokio runtime via `block_on`, so a
//! fetch is just a function call that returns when the request finishes. No
//! deadline is layered on top of the transport's own timeouts.

use crate::arrivals::{Alert, FetchError, RawArrival, TransitSource};
use crate::config::TransitConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::rc::Rc;
use thiserror::Error;
use tokio::runtime::Runtime;

const STOP_QUERY: &str = "skip_service_maps=true&skip_alerts=true&skip_transfers=true";
const ROUTE_QUERY: &str = "skip_service_maps=true&skip_estimated_headways=true";

/// Failures below the JSON layer
#[derive(Error, Debug)]
pub enum HttpError {
    /// Connection, TLS, or status error
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    /// Body was not the expected JSON
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => FetchError::Transport(e.to_string()),
            HttpError::Decode(e) => FetchError::Malformed(e.to_string()),
        }
    }
}

/// Blocking HTTP client shared by the clock and transit sources.
///
/// Clones share one runtime and one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    runtime: Rc<Runtime>,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("transit-sign/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            runtime: Rc::new(runtime),
            client,
        })
    }

    /// GET a URL and return the body as text
    pub fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.runtime.block_on(async {
            let body = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok::<_, HttpError>(body)
        })
    }

    /// GET a URL and decode the JSON body
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let body = self.get_text(url)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// [`TransitSource`] backed by a Transiter server
pub struct TransiterClient {
    http: HttpClient,
    base_url: String,
}

impl TransiterClient {
    pub fn new(http: HttpClient, config: &TransitConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn stop_url(&self, stop_id: &str) -> String {
        format!("{}/stops/{stop_id}?{STOP_QUERY}", self.base_url)
    }

    fn route_url(&self, route_id: &str) -> String {
        format!("{}/routes/{route_id}?{ROUTE_QUERY}", self.base_url)
    }
}

impl TransitSource for TransiterClient {
    fn stop_arrivals(&mut self, stop_id: &str) -> Result<Vec<RawArrival>, FetchError> {
        let stop: StopResponse = self.http.get_json(&self.stop_url(stop_id))?;
        stop.stop_times.into_iter().map(RawArrival::try_from).collect()
    }

    fn route_alerts(&mut self, route_id: &str) -> Result<Vec<Alert>, FetchError> {
        let route: RouteResponse = self.http.get_json(&self.route_url(route_id))?;
        Ok(route.into_alerts())
    }
}

// -- Response shapes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopResponse {
    stop_times: Vec<StopTime>,
}

#[derive(Debug, Deserialize)]
struct StopTime {
    headsign: Option<String>,
    trip: Option<Trip>,
    destination: Option<Named>,
    departure: Option<Departure>,
}

#[derive(Debug, Deserialize)]
struct Trip {
    route: Option<RouteRef>,
}

#[derive(Debug, Deserialize)]
struct RouteRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Departure {
    time: Option<EpochValue>,
}

/// Transiter encodes 64-bit times as strings; accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EpochValue {
    Number(i64),
    Text(String),
}

impl EpochValue {
    fn seconds(&self) -> Result<i64, FetchError> {
        match self {
            EpochValue::Number(n) => Ok(*n),
            EpochValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| FetchError::Malformed(format!("departure time {s:?}"))),
        }
    }
}

impl TryFrom<StopTime> for RawArrival {
    type Error = FetchError;

    fn try_from(st: StopTime) -> Result<Self, FetchError> {
        let departure_epoch = match st.departure.and_then(|d| d.time) {
            Some(time) => Some(time.seconds()?),
            None => None,
        };
        Ok(RawArrival {
            direction: st.headsign,
            route_symbol: st.trip.and_then(|t| t.route).and_then(|r| r.id),
            destination: st.destination.and_then(|d| d.name),
            departure_epoch,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    alerts: Vec<AlertBody>,
}

impl RouteResponse {
    fn into_alerts(self) -> Vec<Alert> {
        self.alerts.into_iter().map(|a| Alert { id: a.id }).collect()
    }
}

#[derive(Debug, Deserialize)]
struct AlertBody {
    id: Option<String>,
}
