//! View models handed to the rendering surface.
//!
//! Everything here is display-ready: formatted durations, timestamps,
//! rates, severity classes. The rendering surface does no computation of
//! its own, it only places these values.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::ingest::types::{
    parse_datetime, HeadlineEvent, HeadlinesSnapshot, MetricsSnapshot, StockQuote,
};
use crate::severity::Severity;
use crate::smoothing::SeriesPoint;

/// Maximum jokes surfaced per cycle.
pub const MAX_JOKES: usize = 5;

/// `HH:MM:SS`, clamped at zero for negative inputs.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 {
        return "00:00:00".to_string();
    }
    let total = seconds as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// `DD/MM/YYYY, HH:MM:SS`; unparsable input renders as the literal source
/// string, absent input as `N/A`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_string();
    };
    match parse_datetime(raw) {
        Some(dt) => format_datetime(dt),
        None => raw.to_string(),
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    format!(
        "{:02}/{:02}/{}, {:02}:{:02}:{:02}",
        dt.day(),
        dt.month(),
        dt.year(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Rounded percent for the top-event figure.
pub fn format_percent(p: f64) -> String {
    format!("{}%", p.round() as i64)
}

/// `Xm Ys` while positive, `Soon` otherwise.
pub fn format_next_update(seconds: Option<f64>) -> String {
    match seconds {
        Some(t) if t > 0.0 => {
            let total = t as u64;
            format!("{}m {}s", total / 60, total % 60)
        }
        _ => "Soon".to_string(),
    }
}

/// Formatted metric panel values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub runtime: String,
    pub articles_processed: u64,
    pub notifications_sent: u64,
    pub ingest_rate: String,
    pub article_lag: String,
    pub api_success_rate: String,
    pub errors: u64,
    pub heartbeats_sent: u64,
    pub backend_version: Option<String>,
    pub analysis_model: String,
    pub jokes_model: String,
    pub last_data_update: String,
    pub next_update: String,
}

impl MetricsView {
    pub fn from_snapshot(m: &MetricsSnapshot) -> Self {
        Self {
            runtime: format_duration(m.runtime_seconds),
            articles_processed: m.articles_processed,
            notifications_sent: m.notifications_sent,
            ingest_rate: format!("{:.2}/min", m.ingest_rate_per_min),
            article_lag: m
                .lag_minutes
                .map(|l| format!("{l:.1}m"))
                .unwrap_or_else(|| "--".to_string()),
            api_success_rate: format!("{:.1}%", m.api_success_rate),
            errors: m.errors_encountered,
            heartbeats_sent: m.telegram_heartbeats_sent,
            backend_version: m.version.as_ref().map(|v| format!("v{v}")),
            analysis_model: m.analysis_model.clone().unwrap_or_default(),
            jokes_model: m.jokes_model.clone().unwrap_or_default(),
            last_data_update: format_timestamp(m.last_updated.as_deref()),
            next_update: format_next_update(m.time_until_next_update_seconds),
        }
    }
}

/// The headline card of the "relevant"/"all" lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineCardView {
    pub headline: String,
    pub keywords: String,
    pub probability: f64,
    pub probability_badge: String,
    pub severity_class: &'static str,
    pub source: String,
    pub source_type: String,
    pub time: String,
}

impl HeadlineCardView {
    pub fn from_event(ev: &HeadlineEvent) -> Self {
        let sev = Severity::from_probability(ev.probability);
        Self {
            headline: ev.headline.clone(),
            keywords: ev.keywords.clone().unwrap_or_else(|| "N/A".to_string()),
            probability: ev.probability,
            probability_badge: format!("{}%", ev.probability),
            severity_class: sev.badge_class(),
            source: ev.source.clone(),
            source_type: ev
                .source_type
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            time: format_timestamp(ev.datetime_iso.as_deref()),
        }
    }
}

/// One sorted card list plus its count label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineListView {
    pub cards: Vec<HeadlineCardView>,
    pub count: usize,
    pub count_label: String,
}

impl HeadlineListView {
    pub fn from_events(events: &[HeadlineEvent]) -> Self {
        let cards: Vec<_> = events.iter().map(HeadlineCardView::from_event).collect();
        let count = cards.len();
        Self {
            cards,
            count,
            count_label: format!("{count} headlines"),
        }
    }
}

/// Top-event panel: populated, or an explicit "no data" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopEventView {
    Populated {
        probability: String,
        probability_value: f64,
        source: String,
        headline: String,
        time: String,
        severity: &'static str,
        badge_class: &'static str,
        accent_class: &'static str,
    },
    Empty {
        message: &'static str,
        severity: &'static str,
        badge_class: &'static str,
    },
}

impl TopEventView {
    pub fn from_event(ev: &HeadlineEvent) -> Self {
        let sev = Severity::from_probability(ev.probability);
        let source_type = ev.source_type.as_deref().unwrap_or("Unknown");
        TopEventView::Populated {
            probability: format_percent(ev.probability),
            probability_value: ev.probability,
            source: format!("{} ({})", ev.source, source_type),
            headline: ev.headline.clone(),
            time: format_timestamp(ev.datetime_iso.as_deref()),
            severity: sev.label(),
            badge_class: sev.badge_class(),
            accent_class: sev.accent_class(),
        }
    }

    pub fn empty() -> Self {
        TopEventView::Empty {
            message: "No headlines in the last 24 hours.",
            severity: Severity::Info.label(),
            badge_class: Severity::Info.badge_class(),
        }
    }
}

/// Raw + smoothed probability series for the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub raw: Vec<SeriesPoint>,
    pub smoothed: Vec<SeriesPoint>,
}

/// One stock card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockCardView {
    pub name: String,
    pub market_state: String,
    pub trend: String,
    pub price: String,
    pub change_percent: f64,
    pub positive: bool,
}

impl StockCardView {
    pub fn from_quote(q: &StockQuote) -> Self {
        let meta = q.metadata.clone().unwrap_or_default();
        let name = meta
            .company_name
            .or_else(|| q.ticker.clone())
            .unwrap_or_else(|| "N/A".to_string());
        let change = meta.change_percent.unwrap_or(0.0);
        Self {
            name,
            market_state: meta.market_state.unwrap_or_else(|| "UNKNOWN".to_string()),
            trend: meta.expected_trend.unwrap_or_else(|| "NEUTRAL".to_string()),
            price: meta
                .price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "N/A".to_string()),
            change_percent: change,
            positive: change >= 0.0,
        }
    }
}

/// Comic slot: embedded payload when present, constructed archival URL
/// (cache-busted) otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComicRef {
    Embedded(String),
    Url(String),
}

pub fn comic_ref(headlines: &HeadlinesSnapshot, archive_base: &str, cache_bust: u64) -> ComicRef {
    match &headlines.xkcd_comic_base64 {
        Some(payload) => ComicRef::Embedded(payload.clone()),
        None => ComicRef::Url(format!(
            "{}/xkcd_comic.png?v={}",
            archive_base.trim_end_matches('/'),
            cache_bust
        )),
    }
}

/// Jokes passed through with minimal shaping: the plural list when present,
/// else the singular fallback, capped at `MAX_JOKES`.
pub fn jokes_view(headlines: &HeadlinesSnapshot) -> Vec<String> {
    let mut out: Vec<String> = headlines
        .jokes
        .iter()
        .map(|j| j.text().to_string())
        .collect();
    if out.is_empty() {
        if let Some(j) = &headlines.joke {
            out.push(j.text().to_string());
        }
    }
    out.truncate(MAX_JOKES);
    out
}

/// Everything the rendering surface needs for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub online: bool,
    pub metrics: MetricsView,
    pub top_event: TopEventView,
    pub relevant: HeadlineListView,
    pub all: HeadlineListView,
    pub chart: ChartView,
    pub jokes: Vec<String>,
    pub stocks: Vec<StockCardView>,
    pub comic: ComicRef,
    pub generated_at: DateTime<Utc>,
}
