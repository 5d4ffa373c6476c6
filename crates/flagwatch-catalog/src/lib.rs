//! # Flagwatch Catalog
//!
//! Read-only client for a CTFtime-style event catalog. Two calls: fetch one
//! event by its public URL, and list the next upcoming events. Any failure
//! means "cannot add" — the bot never retries catalog requests.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use flagwatch_core::config::CatalogConfig;
use flagwatch_core::error::{FlagwatchError, Result};

/// Timestamp format the catalog speaks: `2026-09-11T16:00:00+00:00`
/// (offset with or without a colon — `%z` accepts both).
const CATALOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Raw event metadata as the catalog returns it. Timestamps stay strings
/// here; parsing and validation happen at the add-event boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub title: String,
    #[serde(default)]
    pub ctftime_url: String,
    #[serde(default)]
    pub url: String,
    pub start: String,
    pub finish: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub organizers: Vec<Organizer>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub participants: u32,
}

/// One organizing team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

impl RawEvent {
    pub fn start_time(&self) -> Result<DateTime<FixedOffset>> {
        parse_catalog_time(&self.start)
    }

    pub fn finish_time(&self) -> Result<DateTime<FixedOffset>> {
        parse_catalog_time(&self.finish)
    }

    /// Organizer names joined for display ("Team A, Team B").
    pub fn organizer_names(&self) -> String {
        self.organizers
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a catalog timestamp, offset included.
pub fn parse_catalog_time(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, CATALOG_TIME_FORMAT)
        .map_err(|e| FlagwatchError::CatalogMalformed(format!("bad timestamp `{s}`: {e}")))
}

/// Rewrite a public event page URL into its API form:
/// `https://host/event/123` → `https://host/api/v1/events/123/`.
/// URLs already pointing at the API pass through (trailing slash enforced).
pub fn api_event_url(event_url: &str) -> String {
    let mut url = event_url.replace("/event/", "/api/v1/events/");
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// The catalog client. Thin wrapper over reqwest with a bounded timeout and
/// a browser-like User-Agent (the public catalog rejects default agents).
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    upcoming_limit: u32,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FlagwatchError::CatalogUnreachable(format!("client build: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upcoming_limit: config.upcoming_limit,
        })
    }

    /// Override the base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch one event's metadata from its public URL.
    pub async fn fetch_event(&self, event_url: &str) -> Result<RawEvent> {
        let url = api_event_url(event_url);
        tracing::debug!("🌐 Fetching event metadata from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlagwatchError::CatalogUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlagwatchError::CatalogUnreachable(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        response
            .json::<RawEvent>()
            .await
            .map_err(|e| FlagwatchError::CatalogMalformed(e.to_string()))
    }

    /// List the next upcoming events. Read-only preview — nothing is stored.
    pub async fn upcoming(&self) -> Result<Vec<RawEvent>> {
        let url = format!(
            "{}/api/v1/events/?limit={}",
            self.base_url, self.upcoming_limit
        );
        tracing::debug!("🌐 Fetching upcoming events from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlagwatchError::CatalogUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlagwatchError::CatalogUnreachable(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        response
            .json::<Vec<RawEvent>>()
            .await
            .map_err(|e| FlagwatchError::CatalogMalformed(e.to_string()))
    }
}
