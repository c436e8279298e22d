//! Snapshot fingerprinting for no-change suppression.
//!
//! The fingerprint is an approximate identity: it tracks the fields that
//! change on every producer update, not full content. An in-place edit to
//! an existing headline with unchanged counts is invisible to it; accepted
//! trade-off, the producer bumps `last_updated` on every publish.

use crate::ingest::types::{HeadlinesSnapshot, MetricsSnapshot};

const DELIMITER: &str = "|";

/// Compact fingerprint of a snapshot pair. Equal fingerprints on
/// consecutive cycles mean "no new data": the orchestrator skips all
/// downstream windowing/sorting/rendering for the cycle.
pub fn snapshot_fingerprint(metrics: &MetricsSnapshot, headlines: &HeadlinesSnapshot) -> String {
    [
        metrics.last_updated.clone().unwrap_or_default(),
        headlines.last_updated.clone().unwrap_or_default(),
        headlines.current_headlines.len().to_string(),
        headlines.history_headlines.len().to_string(),
        headlines
            .overall_probability
            .map(|p| p.to_string())
            .unwrap_or_default(),
    ]
    .join(DELIMITER)
}
