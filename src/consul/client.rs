//! Blocking-query watch over Consul health checks.
//!
//! # Responsibilities
//! - Long-poll `/v1/health/state/any` with the last seen index
//! - Diff check statuses between polls and queue transitions
//! - Retry failed polls with backoff, then surface the terminal error
//! - Stop promptly when the shutdown signal fires

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use url::Url;

use crate::config::{ConsulConfig, RetryConfig, TimeoutConfig};
use crate::consul::types::{HealthCheck, HealthEvent, Status, WatchError, WatchResult};
use crate::lifecycle::has_fired;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

/// The HTTP side of the watch: one blocking query per call.
struct HealthApi {
    http: reqwest::Client,
    url: Url,
    datacenter: String,
    token: Option<String>,
    wait: Duration,
}

impl HealthApi {
    async fn fetch(&self, index: u64) -> WatchResult<(u64, Vec<HealthCheck>)> {
        let wait = format!("{}s", self.wait.as_secs());
        let index = index.to_string();

        let mut request = self.http.get(self.url.clone()).query(&[
            ("dc", self.datacenter.as_str()),
            ("index", index.as_str()),
            ("wait", wait.as_str()),
        ]);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let new_index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or(WatchError::MissingIndex)?;

        let body = response.bytes().await?;
        let checks = serde_json::from_slice(&body)?;
        Ok((new_index, checks))
    }
}

/// Sequential stream of health check transitions.
///
/// `next` yields events until the stream ends; `err` then tells whether it
/// ended because of a failure or because shutdown was triggered.
pub struct WatchClient {
    api: HealthApi,
    retry: RetryConfig,
    shutdown: broadcast::Receiver<()>,
    index: u64,
    known: HashMap<(String, String), Status>,
    seeded: bool,
    pending: VecDeque<HealthEvent>,
    closed: bool,
    err: Option<WatchError>,
}

impl WatchClient {
    /// Create a watch client.
    ///
    /// The stream closes when `shutdown` receives a value or its sender is
    /// dropped; this is safe to trigger while a poll is in flight.
    pub fn new(
        consul: &ConsulConfig,
        timeouts: &TimeoutConfig,
        retry: &RetryConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> WatchResult<Self> {
        let url = Url::parse(&format!("{}://{}", consul.scheme, consul.address))?
            .join("/v1/health/state/any")?;
        let wait = Duration::from_secs(consul.wait_secs);

        // Consul may hold a blocking query up to wait + wait/16 of jitter.
        let http = reqwest::Client::builder()
            .timeout(wait + wait / 16 + Duration::from_secs(timeouts.watch_grace_secs))
            .build()?;

        tracing::info!(
            url = %url,
            datacenter = %consul.datacenter,
            wait_secs = consul.wait_secs,
            "Consul watch configured"
        );

        Ok(Self {
            api: HealthApi {
                http,
                url,
                datacenter: consul.datacenter.clone(),
                token: consul.token.clone(),
                wait,
            },
            retry: retry.clone(),
            shutdown,
            index: 0,
            known: HashMap::new(),
            seeded: false,
            pending: VecDeque::new(),
            closed: false,
            err: None,
        })
    }

    /// Wait for the next status transition.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<HealthEvent> {
        loop {
            self.observe_shutdown();
            if self.closed || self.err.is_some() {
                return None;
            }

            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            match self.poll_with_retry().await {
                Ok(Some((index, checks))) => self.apply(index, checks),
                Ok(None) => {
                    tracing::info!("Consul watch closed");
                    self.closed = true;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Consul watch failed");
                    self.err = Some(e);
                }
            }
        }
    }

    /// The error that ended the stream, if any.
    pub fn err(&self) -> Option<&WatchError> {
        self.err.as_ref()
    }

    /// Take ownership of the error that ended the stream.
    pub fn take_err(&mut self) -> Option<WatchError> {
        self.err.take()
    }

    /// Last blocking index received from Consul.
    pub fn index(&self) -> u64 {
        self.index
    }

    fn observe_shutdown(&mut self) {
        if !self.closed && has_fired(&mut self.shutdown) {
            self.closed = true;
        }
    }

    /// Poll once, retrying failures. `Ok(None)` means shutdown was requested.
    async fn poll_with_retry(&mut self) -> WatchResult<Option<(u64, Vec<HealthCheck>)>> {
        let mut backoff = Backoff::new(&self.retry);

        loop {
            let result = tokio::select! {
                res = self.api.fetch(self.index) => res,
                _ = self.shutdown.recv() => return Ok(None),
            };

            let err = match result {
                Ok(batch) => return Ok(Some(batch)),
                Err(e) => e,
            };

            metrics::record_watch_error();
            let Some(delay) = backoff.next_delay() else {
                return Err(err);
            };

            tracing::warn!(
                error = %err,
                attempt = backoff.attempts(),
                max_attempts = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Consul poll failed, retrying"
            );

            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.shutdown.recv() => return Ok(None),
            }
        }
    }

    fn apply(&mut self, index: u64, checks: Vec<HealthCheck>) {
        // Index 0 would turn the next query into a non-blocking one.
        if index < self.index {
            tracing::debug!(old = self.index, new = index, "Consul index went backwards, resetting");
            self.index = 1;
        } else {
            self.index = index.max(1);
        }

        let mut known = HashMap::with_capacity(checks.len());
        for check in &checks {
            let status = check.status();
            let key = (check.node.clone(), check.check_id.clone());

            if self.seeded && self.known.get(&key) != Some(&status) {
                tracing::debug!(
                    node = %check.node,
                    check_id = %check.check_id,
                    status = %status,
                    "Health check transition"
                );
                self.pending.push_back(HealthEvent::from(check));
            }
            known.insert(key, status);
        }

        if !self.seeded {
            tracing::info!(checks = known.len(), index = self.index, "Initial health state loaded");
        }
        self.known = known;
        self.seeded = true;
    }
}
