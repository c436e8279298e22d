//! Ordering of headline collections for the card lists.
//!
//! Always returns a fresh Vec; the input is never mutated. Ties break by
//! headline text ascending regardless of direction, so the order is fully
//! deterministic and independent of provider ordering.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::HeadlineEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Probability,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

/// Sort a headline list by key and direction. Events without a parsable
/// timestamp compare as the epoch minimum for the date key (first in
/// ascending order, last in descending).
pub fn sort_headlines(events: &[HeadlineEvent], key: SortKey, dir: SortDir) -> Vec<HeadlineEvent> {
    let mut out = events.to_vec();
    out.sort_by(|a, b| {
        let primary = match key {
            SortKey::Probability => a
                .probability
                .partial_cmp(&b.probability)
                .unwrap_or(Ordering::Equal),
            SortKey::Date => date_key(a).cmp(&date_key(b)),
        };
        let oriented = match dir {
            SortDir::Asc => primary,
            SortDir::Desc => primary.reverse(),
        };
        oriented.then_with(|| a.headline.cmp(&b.headline))
    });
    out
}

fn date_key(ev: &HeadlineEvent) -> DateTime<Utc> {
    ev.datetime().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
