//! Time acquisition state machine.
//!
//! One pass per control loop cycle:
//! `Idle -> Connecting -> Fetching -> Applying -> Done`, or `Unavailable`
//! from any step on failure. Only `Applying` writes the clock, so a failed
//! cycle leaves the last good sync in place.

use std::future::Future;
use std::time::Duration;

use chrono::TimeZone;
use chrono_tz::Tz;

use super::clock::Clock;
use super::device::Connectivity;
use crate::error::TimeSyncError;
use crate::models::{Instant, TimeApiResponse, TimeSyncResult};

const REQUIRED_FIELDS: [&str; 3] = ["datetime", "unixtime", "abbreviation"];

pub trait TimeApi {
    fn fetch(&self) -> impl Future<Output = Result<TimeApiResponse, TimeSyncError>>;
}

pub struct HttpTimeApi {
    client: reqwest::Client,
    url: String,
}

impl HttpTimeApi {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl TimeApi for HttpTimeApi {
    async fn fetch(&self) -> Result<TimeApiResponse, TimeSyncError> {
        log::info!("Fetching time from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TimeSyncError::ApiError(format!("HTTP {}: {}", status, text)));
        }

        let body = response.text().await?;
        parse_time_response(&body)
    }
}

/// Decodes a time service body, naming any missing required fields.
pub fn parse_time_response(body: &str) -> Result<TimeApiResponse, TimeSyncError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| TimeSyncError::ApiError(format!("malformed JSON: {}", e)))?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| value.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(TimeSyncError::ApiError(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| TimeSyncError::ApiError(format!("unexpected field type: {}", e)))
}

/// Unknown zone names fall back to UTC.
pub fn resolve_zone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(zone) => zone,
        Err(e) => {
            log::warn!("Unknown time zone `{}` ({}), using UTC", name, e);
            Tz::UTC
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Connecting,
    Fetching,
    Applying(TimeApiResponse),
    Done(TimeSyncResult),
    Unavailable(TimeSyncError),
}

impl SyncState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Fetching => "fetching",
            Self::Applying(_) => "applying",
            Self::Done(_) => "done",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

pub struct TimeSync<N, A> {
    network: N,
    api: A,
    zone: Tz,
    settle: Duration,
}

impl<N: Connectivity, A: TimeApi> TimeSync<N, A> {
    pub fn new(network: N, api: A, zone: Tz) -> Self {
        Self {
            network,
            api,
            zone,
            settle: Duration::from_secs(1),
        }
    }

    /// Pause after a successful connect before the first request.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Runs the machine to a terminal state and reports the outcome.
    pub async fn run_cycle<C: Clock>(&mut self, clock: &mut C) -> TimeSyncResult {
        let mut state = SyncState::Idle;
        loop {
            state = match state {
                SyncState::Done(result) => return result,
                SyncState::Unavailable(err) => {
                    log::warn!("Time sync unavailable: {}", err);
                    return TimeSyncResult::fallback(err);
                }
                other => self.step(other, clock).await,
            };
            log::debug!("Time sync state -> {}", state.name());
        }
    }

    async fn step<C: Clock>(&mut self, state: SyncState, clock: &mut C) -> SyncState {
        match state {
            SyncState::Idle => SyncState::Connecting,
            SyncState::Connecting => {
                if self.network.connect().await {
                    tokio::time::sleep(self.settle).await;
                    SyncState::Fetching
                } else {
                    SyncState::Unavailable(TimeSyncError::NoNetwork)
                }
            }
            SyncState::Fetching => match self.api.fetch().await {
                Ok(response) => SyncState::Applying(response),
                Err(err) => SyncState::Unavailable(err),
            },
            SyncState::Applying(response) => match self.resolve_instant(&response) {
                Some(instant) => {
                    clock.set(instant);
                    let now = clock.now().unwrap_or(instant);
                    SyncState::Done(TimeSyncResult::synced(now, response.abbreviation))
                }
                None => SyncState::Unavailable(TimeSyncError::ApiError(format!(
                    "neither datetime `{}` nor unixtime {} is usable",
                    response.datetime, response.unixtime
                ))),
            },
            terminal => terminal,
        }
    }

    /// Prefers the service's local `datetime`; falls back to converting
    /// `unixtime` in the configured zone.
    fn resolve_instant(&self, response: &TimeApiResponse) -> Option<Instant> {
        match Instant::parse_api_datetime(&response.datetime) {
            Ok(instant) => Some(instant),
            Err(e) => {
                log::warn!("Failed to parse datetime ({}), falling back to unixtime", e);
                self.zone
                    .timestamp_opt(response.unixtime, 0)
                    .single()
                    .map(|dt| Instant::from(dt.naive_local()))
            }
        }
    }
}
