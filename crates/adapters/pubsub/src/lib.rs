//! # skillbridge-adapter-pubsub
//!
//! Pub/sub adapter: talks to a hosted publish/subscribe bus over its REST
//! API.
//!
//! ## Responsibilities
//! - Implement the [`Backend`] port for [`BackendKind::PubSub`] routing:
//!   publish JSON commands on device channels, read the newest message of a
//!   channel as the device state
//! - Implement the [`ScheduleStore`] port by scanning the schedule channel
//!   history, newest message first
//!
//! A single [`reqwest::Client`] is shared by every call, so connections are
//! pooled.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `skillbridge-app` and `skillbridge-domain`.

pub mod config;
pub mod error;
mod history;

use reqwest::Url;
use serde_json::Value;
use skillbridge_app::ports::{Backend, ScheduleStore, StateSample};
use skillbridge_domain::error::{BackendError, ValidationError};
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination, PayloadBody};
use skillbridge_domain::schedule::Schedule;
use skillbridge_domain::time;

pub use crate::config::PubSubConfig;
pub use crate::error::PubSubError;
use crate::history::HistoryEntry;

/// Pub/sub implementation of the [`Backend`] and [`ScheduleStore`] ports.
#[derive(Debug, Clone)]
pub struct PubSubBackend {
    client: reqwest::Client,
    origin: Url,
    config: PubSubConfig,
}

impl PubSubBackend {
    /// Create a backend for the account described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PubSubError::InvalidOrigin`] when the origin is not a base
    /// URL and [`PubSubError::Client`] when the HTTP client cannot be built.
    pub fn new(config: PubSubConfig) -> Result<Self, PubSubError> {
        let origin = Url::parse(&config.origin)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| PubSubError::InvalidOrigin(config.origin.clone()))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("skillbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PubSubError::Client)?;
        Ok(Self {
            client,
            origin,
            config,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.origin.clone();
        // Cannot fail, the origin was checked to be a base URL.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn publish(&self, channel: &str, message: &Value) -> Result<(), PubSubError> {
        let url = self.endpoint(&[
            "publish",
            &self.config.publish_key,
            &self.config.subscribe_key,
            "0",
            channel,
            "0",
        ]);
        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(PubSubError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PubSubError::Status(status.as_u16()));
        }

        // [1, "Sent", "<timetoken>"] on success.
        let answer: Value = response.json().await.map_err(PubSubError::Request)?;
        let Some(parts) = answer.as_array() else {
            return Err(PubSubError::Decode(format!("publish answer {answer}")));
        };
        if parts.first().and_then(Value::as_i64) == Some(1) {
            Ok(())
        } else {
            let reason = parts
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or("unknown reason");
            Err(PubSubError::Rejected(reason.to_string()))
        }
    }

    async fn history(&self, channel: &str, count: u16) -> Result<Vec<HistoryEntry>, PubSubError> {
        let mut url = self.endpoint(&[
            "v2",
            "history",
            "sub-key",
            &self.config.subscribe_key,
            "channel",
            channel,
        ]);
        url.query_pairs_mut()
            .append_pair("count", &count.to_string())
            .append_pair("include_token", "true");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PubSubError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PubSubError::Status(status.as_u16()));
        }
        let answer: Value = response.json().await.map_err(PubSubError::Request)?;
        history::parse(answer)
    }
}

fn channel_of(destination: Destination) -> Result<String, ValidationError> {
    match destination {
        Destination::Channel(channel) if !channel.is_empty() => Ok(channel),
        Destination::Channel(_) => Err(ValidationError::MissingField("channel")),
        other => Err(ValidationError::BackendMismatch {
            backend: BackendKind::PubSub.as_str(),
            destination: other.to_string(),
        }),
    }
}

impl Backend for PubSubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PubSub
    }

    async fn send(&self, payload: BackendPayload) -> Result<(), BackendError> {
        let channel = channel_of(payload.destination)?;
        let message = match payload.body {
            PayloadBody::Json(value) => value,
            PayloadBody::Text(text) => Value::String(text),
        };

        tracing::debug!(%channel, %message, "publishing command");
        self.publish(&channel, &message)
            .await
            .map_err(PubSubError::into_backend)
    }

    async fn query(&self, destination: Destination) -> Result<StateSample, BackendError> {
        let channel = channel_of(destination)?;
        tracing::debug!(%channel, "reading newest channel message");

        let newest = self
            .history(&channel, 1)
            .await?
            .pop()
            .ok_or(PubSubError::EmptyChannel(channel))?;
        Ok(StateSample {
            value: newest.state(),
            sampled_at: newest.timetoken.and_then(time::from_timetoken),
        })
    }
}

impl ScheduleStore for PubSubBackend {
    async fn latest_for_zone(&self, zone: &str) -> Result<Option<Schedule>, BackendError> {
        let entries = self
            .history(&self.config.schedule_channel, self.config.history_depth)
            .await?;
        tracing::debug!(zone, scanned = entries.len(), "looking up schedule");

        let found = entries.into_iter().rev().find_map(|entry| {
            match serde_json::from_value::<Schedule>(entry.message) {
                Ok(schedule) if schedule.is_for(zone) => Some(schedule),
                Ok(_) => None,
                Err(err) => {
                    tracing::trace!(error = %err, "skipping unreadable schedule entry");
                    None
                }
            }
        });
        Ok(found)
    }
}
