// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::ingest::types::{HeadlineEvent, SnapshotPair, SnapshotProvider};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "resolver_primary_failures_total",
            "Primary tier attempts that ended in fallback."
        );
        describe_counter!(
            "resolver_exhausted_total",
            "Cycles where both tiers failed (DataUnavailable)."
        );
        describe_counter!(
            "ingest_clamped_total",
            "Probabilities clamped into [0, 100] at the boundary."
        );
        describe_counter!(
            "ingest_quarantined_total",
            "Events dropped for non-finite probability."
        );
        describe_histogram!("resolve_ms", "End-to-end resolve time in milliseconds.");
        describe_gauge!(
            "pipeline_last_cycle_ts",
            "Unix ts when the refresh pipeline last completed a cycle."
        );
    });
}

/// Failure of a single tier attempt. Transport, status, and decode failures
/// share the same recovery policy: fall through to the next tier.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{resource} returned status {status}")]
    Status { resource: &'static str, status: u16 },
    #[error("decoding {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Compact status summary carried into `DataUnavailable`.
    pub fn status_summary(&self) -> String {
        match self {
            FetchError::Transport(e) => format!("transport error: {e}"),
            FetchError::Status { resource, status } => format!("{resource} -> {status}"),
            FetchError::Decode { resource, .. } => format!("{resource} -> invalid JSON"),
        }
    }
}

/// Both tiers exhausted for this cycle; the next scheduled tick is the retry.
#[derive(Debug, Error)]
#[error("no data tier available (primary: {primary}; secondary: {secondary})")]
pub struct DataUnavailable {
    pub primary: String,
    pub secondary: String,
}

/// Two-tier source selection: primary (environment-local) when configured,
/// secondary (remote archival) as fallback. A successful resolve always
/// yields both snapshots from the same tier.
pub struct DataSourceResolver {
    primary: Option<Box<dyn SnapshotProvider>>,
    secondary: Box<dyn SnapshotProvider>,
}

impl DataSourceResolver {
    pub fn new(
        primary: Option<Box<dyn SnapshotProvider>>,
        secondary: Box<dyn SnapshotProvider>,
    ) -> Self {
        ensure_metrics_described();
        Self { primary, secondary }
    }

    /// Wire the two HTTP tiers from runtime config. Local environments get
    /// a primary (local service) tier; deployed ones go straight to the
    /// archive.
    pub fn from_config(cfg: &config::DashboardConfig, env: config::Environment) -> Self {
        let primary: Option<Box<dyn SnapshotProvider>> = if env.is_local() {
            Some(Box::new(providers::http::HttpTierProvider::new(
                "primary",
                cfg.primary_base_url.clone(),
                cfg.request_timeout_secs,
            )))
        } else {
            None
        };
        let secondary: Box<dyn SnapshotProvider> = Box::new(
            providers::http::HttpTierProvider::new(
                "archive",
                cfg.archive_base_url.clone(),
                cfg.request_timeout_secs,
            ),
        );
        Self::new(primary, secondary)
    }

    pub async fn resolve(&self, cache_bust: u64) -> Result<SnapshotPair, DataUnavailable> {
        let primary_status = match &self.primary {
            Some(p) => match p.fetch_pair(cache_bust).await {
                Ok(pair) => {
                    tracing::debug!(tier = p.name(), "resolved from primary tier");
                    return Ok(pair);
                }
                Err(e) => {
                    tracing::warn!(tier = p.name(), error = %e, "primary tier failed, falling back");
                    counter!("resolver_primary_failures_total").increment(1);
                    e.status_summary()
                }
            },
            None => "skipped (deployed environment)".to_string(),
        };

        match self.secondary.fetch_pair(cache_bust).await {
            Ok(pair) => {
                tracing::debug!(tier = self.secondary.name(), "resolved from secondary tier");
                Ok(pair)
            }
            Err(e) => {
                counter!("resolver_exhausted_total").increment(1);
                Err(DataUnavailable {
                    primary: primary_status,
                    secondary: e.status_summary(),
                })
            }
        }
    }
}

/// Normalize headline text for display: decode HTML entities, strip tags,
/// collapse whitespace. Provider payloads carry entity-encoded titles.
pub fn normalize_headline(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeStats {
    pub clamped: usize,
    pub quarantined: usize,
}

fn sanitize_events(events: &mut Vec<HeadlineEvent>, stats: &mut SanitizeStats) {
    events.retain_mut(|ev| {
        if !ev.probability.is_finite() {
            stats.quarantined += 1;
            return false;
        }
        if ev.probability < 0.0 || ev.probability > 100.0 {
            ev.probability = ev.probability.clamp(0.0, 100.0);
            stats.clamped += 1;
        }
        ev.headline = normalize_headline(&ev.headline);
        true
    });
}

/// Validation at the ingestion boundary: clamp finite out-of-range
/// probabilities into [0, 100], quarantine non-finite ones, and normalize
/// headline text. Malformed timestamps are left as-is; they degrade
/// per-field further down (excluded from windowed views).
pub fn sanitize_pair(pair: &mut SnapshotPair) -> SanitizeStats {
    ensure_metrics_described();
    let mut stats = SanitizeStats::default();
    sanitize_events(&mut pair.headlines.current_headlines, &mut stats);
    sanitize_events(&mut pair.headlines.history_headlines, &mut stats);
    if stats.clamped > 0 {
        counter!("ingest_clamped_total").increment(stats.clamped as u64);
    }
    if stats.quarantined > 0 {
        counter!("ingest_quarantined_total").increment(stats.quarantined as u64);
        tracing::warn!(
            quarantined = stats.quarantined,
            "dropped events with non-finite probability"
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(prob: f64) -> HeadlineEvent {
        HeadlineEvent {
            headline: "Rates &amp; markets <b>steady</b>".into(),
            source: "Wire".into(),
            source_type: None,
            probability: prob,
            keywords: None,
            datetime_iso: None,
        }
    }

    #[test]
    fn normalize_decodes_entities_and_strips_tags() {
        let out = normalize_headline("  Rates &amp; markets <b>steady</b>\n today ");
        assert_eq!(out, "Rates & markets steady today");
    }

    #[test]
    fn sanitize_clamps_out_of_range_and_drops_non_finite() {
        let mut pair = SnapshotPair {
            metrics: Default::default(),
            headlines: types::HeadlinesSnapshot {
                current_headlines: vec![ev(150.0), ev(-3.0), ev(f64::NAN)],
                history_headlines: vec![ev(60.0)],
                ..Default::default()
            },
        };
        let stats = sanitize_pair(&mut pair);
        assert_eq!(stats.clamped, 2);
        assert_eq!(stats.quarantined, 1);
        assert_eq!(pair.headlines.current_headlines.len(), 2);
        assert_eq!(pair.headlines.current_headlines[0].probability, 100.0);
        assert_eq!(pair.headlines.current_headlines[1].probability, 0.0);
        // in-range events untouched apart from text normalization
        assert_eq!(pair.headlines.history_headlines[0].probability, 60.0);
        assert_eq!(
            pair.headlines.history_headlines[0].headline,
            "Rates & markets steady"
        );
    }
}
