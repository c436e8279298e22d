//! Refresh pipeline orchestrator.
//!
//! One cycle per tick: resolve snapshots (two-tier fallback) → fingerprint
//! check → window/sort/smooth → publish view models. State is explicit on
//! `PipelineState`; nothing ambient. Each cycle captures a generation id at
//! start, and a completion whose id no longer matches the current generation
//! is discarded, so a stale response can never overwrite newer state.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, describe_counter, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::countdown::{CountdownScheduler, CountdownTick};
use crate::fingerprint::snapshot_fingerprint;
use crate::ingest::config::DashboardConfig;
use crate::ingest::types::{parse_datetime, HeadlineEvent, SnapshotPair};
use crate::ingest::{DataSourceResolver, SanitizeStats};
use crate::smoothing::{raw_chart_points, rolling_mean};
use crate::sorting::{sort_headlines, SortDir, SortKey};
use crate::view::{
    comic_ref, jokes_view, ChartView, DashboardView, HeadlineListView, MetricsView,
    StockCardView, TopEventView,
};
use crate::windowing::{bucket_events, reference_time, top_event};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_cycles_total", "Refresh cycles started.");
        describe_counter!("pipeline_rendered_total", "Cycles that produced a new view.");
        describe_counter!(
            "pipeline_skipped_total",
            "Cycles suppressed by an unchanged fingerprint."
        );
        describe_counter!("pipeline_failed_total", "Cycles where both tiers failed.");
        describe_counter!(
            "pipeline_stale_discarded_total",
            "Cycle completions discarded by the generation guard."
        );
    });
}

/// Where a cycle currently is. Rendered and Failed return to Idle once the
/// cycle's bookkeeping is done; the next tick starts at Fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Fetching,
    Reconciling,
    Rendered,
    Failed,
}

/// Outcome of one `run_cycle` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New data; a fresh view was published.
    Rendered,
    /// Fingerprint matched the previous cycle; nothing emitted.
    Unchanged,
    /// Both tiers failed; status flipped offline, prior view kept.
    Failed,
    /// A newer cycle superseded this one while it was in flight.
    Stale,
}

/// Explicit orchestrator state, threaded through each cycle.
#[derive(Debug)]
struct PipelineState {
    phase: CyclePhase,
    generation: u64,
    last_fingerprint: Option<String>,
    /// Combined headline list of the last rendered cycle, kept so the chart
    /// can be re-derived (overlay toggling) without re-fetching.
    cached_events: Vec<HeadlineEvent>,
    online: bool,
}

impl PipelineState {
    fn new() -> Self {
        Self {
            phase: CyclePhase::Idle,
            generation: 0,
            last_fingerprint: None,
            cached_events: Vec::new(),
            online: false,
        }
    }
}

/// Status summary for the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub online: bool,
    pub phase: CyclePhase,
    pub generation: u64,
    pub next_update: Option<CountdownTick>,
}

pub struct Pipeline {
    resolver: DataSourceResolver,
    config: DashboardConfig,
    state: Mutex<PipelineState>,
    view: RwLock<Option<DashboardView>>,
    countdown: Mutex<CountdownScheduler>,
    next_update: Arc<RwLock<Option<CountdownTick>>>,
}

impl Pipeline {
    pub fn new(resolver: DataSourceResolver, config: DashboardConfig) -> Self {
        ensure_metrics_described();
        Self {
            resolver,
            config,
            state: Mutex::new(PipelineState::new()),
            view: RwLock::new(None),
            countdown: Mutex::new(CountdownScheduler::new()),
            next_update: Arc::new(RwLock::new(None)),
        }
    }

    /// Latest published view, if any cycle has rendered yet.
    pub fn latest_view(&self) -> Option<DashboardView> {
        self.view.read().expect("view lock poisoned").clone()
    }

    pub fn status(&self) -> StatusView {
        let st = self.state.lock().expect("pipeline state poisoned");
        StatusView {
            online: st.online,
            phase: st.phase,
            generation: st.generation,
            next_update: *self.next_update.read().expect("countdown lock poisoned"),
        }
    }

    /// Combined headline list cached from the last rendered cycle.
    pub fn cached_events(&self) -> Vec<HeadlineEvent> {
        self.state
            .lock()
            .expect("pipeline state poisoned")
            .cached_events
            .clone()
    }

    /// Run one refresh cycle: Idle → Fetching → Reconciling → Rendered /
    /// Idle (no-op) / Failed. Safe to call while an earlier cycle is still
    /// in flight; the newest cycle wins.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let generation = {
            let mut st = self.state.lock().expect("pipeline state poisoned");
            st.generation += 1;
            st.phase = CyclePhase::Fetching;
            st.generation
        };
        counter!("pipeline_cycles_total").increment(1);
        let cache_bust = Utc::now().timestamp_millis().max(0) as u64;
        let started = std::time::Instant::now();

        let resolved = self.resolver.resolve(cache_bust).await;
        histogram!("resolve_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        let mut pair = match resolved {
            Ok(pair) => pair,
            Err(e) => {
                let mut st = self.state.lock().expect("pipeline state poisoned");
                if st.generation != generation {
                    counter!("pipeline_stale_discarded_total").increment(1);
                    return CycleOutcome::Stale;
                }
                st.phase = CyclePhase::Failed;
                st.online = false;
                // Prior view models stay untouched; last-known-good keeps
                // displaying and only the status flag flips.
                if let Some(v) = self.view.write().expect("view lock poisoned").as_mut() {
                    v.online = false;
                }
                st.phase = CyclePhase::Idle;
                drop(st);
                counter!("pipeline_failed_total").increment(1);
                tracing::warn!(error = %e, "refresh cycle failed, showing last known good");
                return CycleOutcome::Failed;
            }
        };

        let sanitize_stats = crate::ingest::sanitize_pair(&mut pair);
        if sanitize_stats != SanitizeStats::default() {
            tracing::debug!(
                clamped = sanitize_stats.clamped,
                quarantined = sanitize_stats.quarantined,
                "snapshot sanitized at the boundary"
            );
        }

        let fp = snapshot_fingerprint(&pair.metrics, &pair.headlines);
        {
            let mut st = self.state.lock().expect("pipeline state poisoned");
            if st.generation != generation {
                counter!("pipeline_stale_discarded_total").increment(1);
                return CycleOutcome::Stale;
            }
            st.phase = CyclePhase::Reconciling;
            if st.last_fingerprint.as_deref() == Some(fp.as_str()) {
                st.phase = CyclePhase::Idle;
                st.online = true;
                counter!("pipeline_skipped_total").increment(1);
                tracing::debug!("fingerprint unchanged, cycle suppressed");
                return CycleOutcome::Unchanged;
            }
        }

        let view = build_view(&pair, &self.config.archive_base_url, cache_bust);
        let combined = pair.headlines.combined();

        {
            let mut st = self.state.lock().expect("pipeline state poisoned");
            if st.generation != generation {
                counter!("pipeline_stale_discarded_total").increment(1);
                return CycleOutcome::Stale;
            }
            st.last_fingerprint = Some(fp);
            st.cached_events = combined;
            st.online = true;
            st.phase = CyclePhase::Rendered;
            // Publish while the generation check still holds, so an older
            // cycle can never overwrite a newer view (lock order: state
            // before view, same as the failure path).
            *self.view.write().expect("view lock poisoned") = Some(view);
            st.phase = CyclePhase::Idle;
        }

        self.restart_countdown(&pair);
        gauge!("pipeline_last_cycle_ts").set(Utc::now().timestamp().max(0) as f64);
        counter!("pipeline_rendered_total").increment(1);
        CycleOutcome::Rendered
    }

    /// Re-aim the next-update countdown at the producer's announced target.
    fn restart_countdown(&self, pair: &SnapshotPair) {
        let Some(target) = pair
            .metrics
            .next_update_time
            .as_deref()
            .and_then(parse_datetime)
        else {
            return;
        };
        let sink = self.next_update.clone();
        let mut countdown = self.countdown.lock().expect("countdown lock poisoned");
        countdown.start(target, move |tick| {
            *sink.write().expect("countdown lock poisoned") = Some(tick);
        });
    }
}

/// Pure view assembly for one sanitized snapshot pair.
fn build_view(pair: &SnapshotPair, archive_base: &str, cache_bust: u64) -> DashboardView {
    let now = reference_time(&pair.metrics);
    let combined = pair.headlines.combined();

    let buckets = bucket_events(&combined, now);
    let top = top_event(&combined, now)
        .map(TopEventView::from_event)
        .unwrap_or_else(TopEventView::empty);

    // Default presentation order: newest first.
    let relevant = sort_headlines(&buckets.relevant, SortKey::Date, SortDir::Desc);
    let all = sort_headlines(&buckets.all, SortKey::Date, SortDir::Desc);

    let raw = raw_chart_points(&combined);
    let smoothed = rolling_mean(&raw);

    DashboardView {
        online: true,
        metrics: MetricsView::from_snapshot(&pair.metrics),
        top_event: top,
        relevant: HeadlineListView::from_events(&relevant),
        all: HeadlineListView::from_events(&all),
        chart: ChartView { raw, smoothed },
        jokes: jokes_view(&pair.headlines),
        stocks: pair
            .headlines
            .stocks
            .iter()
            .map(StockCardView::from_quote)
            .collect(),
        comic: comic_ref(&pair.headlines, archive_base, cache_bust),
        generated_at: Utc::now(),
    }
}

/// Spawn the fixed-interval refresh loop. Each tick launches its own cycle
/// task so the cadence stays independent of fetch latency; the generation
/// guard arbitrates overlapping cycles.
pub fn spawn_refresh_loop(pipeline: Arc<Pipeline>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let p = pipeline.clone();
            tokio::spawn(async move {
                let outcome = p.run_cycle().await;
                tracing::debug!(?outcome, "refresh tick finished");
            });
        }
    })
}
