//! Trailing rolling mean for the probability chart overlay.
//!
//! Streaming computation: a running sum plus a bounded queue of the last
//! <= 5 raw values, O(1) amortized per point. The first four outputs
//! average over fewer than five points (trailing, not centered, window).

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::ingest::types::HeadlineEvent;
use crate::windowing::{RELEVANT_MIN_PROBABILITY, RELEVANT_WINDOW_DAYS};

/// Fixed smoothing window.
pub const SMOOTHING_WINDOW: usize = 5;

/// One chart point with its display-ready label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub label: String,
}

/// Raw chart series: events with probability >= 50 within 5 days of the
/// latest event timestamp, ascending chronologically. Labels carry the
/// headline for tooltip display.
pub fn raw_chart_points(events: &[HeadlineEvent]) -> Vec<SeriesPoint> {
    let latest = events.iter().filter_map(|ev| ev.datetime()).max();
    let Some(latest) = latest else {
        return Vec::new();
    };
    let cutoff = latest - Duration::days(RELEVANT_WINDOW_DAYS);

    let mut points: Vec<SeriesPoint> = events
        .iter()
        .filter_map(|ev| {
            let dt = ev.datetime()?;
            if ev.probability >= RELEVANT_MIN_PROBABILITY && dt >= cutoff {
                Some(SeriesPoint {
                    timestamp: dt,
                    value: ev.probability,
                    label: ev.headline.clone(),
                })
            } else {
                None
            }
        })
        .collect();
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.label.cmp(&b.label)));
    points
}

/// Trailing rolling mean over a chronologically ascending series. The
/// output has the same length as the input; `out[i]` is the mean of
/// `value[max(0, i-4)..=i]`, and its label records how many points the
/// window actually held.
pub fn rolling_mean(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let mut out = Vec::with_capacity(points.len());
    let mut sum = 0.0_f64;
    let mut window: VecDeque<f64> = VecDeque::with_capacity(SMOOTHING_WINDOW + 1);

    for p in points {
        sum += p.value;
        window.push_back(p.value);
        if window.len() > SMOOTHING_WINDOW {
            if let Some(evicted) = window.pop_front() {
                sum -= evicted;
            }
        }
        out.push(SeriesPoint {
            timestamp: p.timestamp,
            value: sum / window.len() as f64,
            label: format!("Mean of last {} pts", window.len()),
        });
    }
    out
}
