// src/ingest/types.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::FetchError;

/// One headline event as emitted by the data producer. Immutable after
/// ingestion; all derived views are fresh collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineEvent {
    pub headline: String,
    pub source: String,
    #[serde(default)]
    pub source_type: Option<String>,
    /// 0–100 scale. Sanitized at the ingestion boundary (see `sanitize_pair`).
    pub probability: f64,
    #[serde(default)]
    pub keywords: Option<String>,
    /// Producer timestamp, usually `YYYY-MM-DD HH:MM:SS`. Events without a
    /// parsable timestamp stay in the raw set but are excluded from
    /// time-windowed views.
    #[serde(default)]
    pub datetime_iso: Option<String>,
}

impl HeadlineEvent {
    /// Parsed event timestamp, `None` when absent or unparsable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.datetime_iso.as_deref().and_then(parse_datetime)
    }
}

/// Lenient timestamp parse: RFC 3339, the producer's space-separated
/// `YYYY-MM-DD HH:MM:SS` (with optional fraction), or a bare date.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let t = s.replace(' ', "T");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&t) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&t, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = d.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

/// Operational counters/gauges from the producer. One snapshot supersedes
/// the previous in full; fields are tolerant-optional so a sparse payload
/// still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub runtime_seconds: f64,
    #[serde(default)]
    pub articles_processed: u64,
    #[serde(default)]
    pub notifications_sent: u64,
    #[serde(default)]
    pub ingest_rate_per_min: f64,
    #[serde(default)]
    pub lag_minutes: Option<f64>,
    #[serde(default)]
    pub api_success_rate: f64,
    #[serde(default)]
    pub errors_encountered: u64,
    #[serde(default)]
    pub telegram_heartbeats_sent: u64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub next_update_time: Option<String>,
    #[serde(default)]
    pub analysis_model: Option<String>,
    #[serde(default)]
    pub jokes_model: Option<String>,
    #[serde(default)]
    pub time_until_next_update_seconds: Option<f64>,
}

/// A joke entry; producers have emitted both bare strings and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Joke {
    Text(String),
    Tagged { joke: String },
}

impl Joke {
    pub fn text(&self) -> &str {
        match self {
            Joke::Text(s) => s,
            Joke::Tagged { joke } => joke,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockMetadata {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub market_state: Option<String>,
    #[serde(default)]
    pub expected_trend: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub metadata: Option<StockMetadata>,
}

/// Headline payload for one refresh cycle. The canonical event set is
/// `current_headlines ++ history_headlines` (current first); literal
/// duplicates are tolerated and no identity dedup is performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlinesSnapshot {
    #[serde(default)]
    pub current_headlines: Vec<HeadlineEvent>,
    #[serde(default)]
    pub history_headlines: Vec<HeadlineEvent>,
    #[serde(default)]
    pub jokes: Vec<Joke>,
    /// Older producers emit a single `joke` instead of `jokes`.
    #[serde(default)]
    pub joke: Option<Joke>,
    #[serde(default)]
    pub stocks: Vec<StockQuote>,
    #[serde(default)]
    pub xkcd_comic_base64: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub overall_probability: Option<f64>,
}

impl HeadlinesSnapshot {
    /// Canonical event set for the cycle: current first, then history.
    pub fn combined(&self) -> Vec<HeadlineEvent> {
        let mut all =
            Vec::with_capacity(self.current_headlines.len() + self.history_headlines.len());
        all.extend(self.current_headlines.iter().cloned());
        all.extend(self.history_headlines.iter().cloned());
        all
    }
}

/// Metrics + headlines from the same tier, never one without the other.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    pub metrics: MetricsSnapshot,
    pub headlines: HeadlinesSnapshot,
}

/// One data tier. The HTTP implementation fetches both resources
/// concurrently; tests substitute in-memory stubs.
#[async_trait::async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the metrics + headlines pair. `cache_bust` parameterizes the
    /// request to defeat intermediate caching.
    async fn fetch_pair(&self, cache_bust: u64) -> Result<SnapshotPair, FetchError>;
    fn name(&self) -> &'static str;
}
