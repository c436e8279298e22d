// tests/resolver_fallback.rs
//
// Tier semantics of the DataSourceResolver: primary success short-circuits,
// primary failure falls through, double failure surfaces both statuses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use newswatch_dashboard::ingest::types::{
    HeadlinesSnapshot, MetricsSnapshot, SnapshotPair, SnapshotProvider,
};
use newswatch_dashboard::ingest::{DataSourceResolver, FetchError};

fn fixture_pair() -> SnapshotPair {
    let metrics: MetricsSnapshot =
        serde_json::from_str(include_str!("fixtures/metrics.json")).expect("metrics fixture");
    let headlines: HeadlinesSnapshot =
        serde_json::from_str(include_str!("fixtures/headlines.json")).expect("headlines fixture");
    SnapshotPair { metrics, headlines }
}

struct OkTier {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SnapshotProvider for OkTier {
    async fn fetch_pair(&self, _cache_bust: u64) -> Result<SnapshotPair, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(fixture_pair())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

struct FailingTier {
    name: &'static str,
    status: u16,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SnapshotProvider for FailingTier {
    async fn fetch_pair(&self, _cache_bust: u64) -> Result<SnapshotPair, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Status {
            resource: "metrics",
            status: self.status,
        })
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

#[tokio::test]
async fn primary_success_never_touches_secondary() {
    let primary_calls = Arc::new(AtomicUsize::new(0));
    let secondary_calls = Arc::new(AtomicUsize::new(0));
    let resolver = DataSourceResolver::new(
        Some(Box::new(OkTier {
            name: "primary",
            calls: primary_calls.clone(),
        })),
        Box::new(OkTier {
            name: "archive",
            calls: secondary_calls.clone(),
        }),
    );

    let pair = resolver.resolve(1).await.expect("primary should serve");
    assert_eq!(pair.metrics.version.as_deref(), Some("2.4.0"));
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn primary_failure_falls_back_to_secondary_pair() {
    let primary_calls = Arc::new(AtomicUsize::new(0));
    let secondary_calls = Arc::new(AtomicUsize::new(0));
    let resolver = DataSourceResolver::new(
        Some(Box::new(FailingTier {
            name: "primary",
            status: 503,
            calls: primary_calls.clone(),
        })),
        Box::new(OkTier {
            name: "archive",
            calls: secondary_calls.clone(),
        }),
    );

    let pair = resolver.resolve(2).await.expect("secondary should serve");
    assert_eq!(pair.headlines.current_headlines.len(), 3);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn both_tiers_failing_reports_both_statuses() {
    let resolver = DataSourceResolver::new(
        Some(Box::new(FailingTier {
            name: "primary",
            status: 503,
            calls: Arc::new(AtomicUsize::new(0)),
        })),
        Box::new(FailingTier {
            name: "archive",
            status: 404,
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let err = resolver.resolve(3).await.expect_err("both tiers down");
    assert!(err.primary.contains("503"), "primary status: {}", err.primary);
    assert!(
        err.secondary.contains("404"),
        "secondary status: {}",
        err.secondary
    );
}

#[tokio::test]
async fn deployed_environment_skips_primary_entirely() {
    let secondary_calls = Arc::new(AtomicUsize::new(0));
    let resolver = DataSourceResolver::new(
        None,
        Box::new(OkTier {
            name: "archive",
            calls: secondary_calls.clone(),
        }),
    );
    resolver.resolve(4).await.expect("archive should serve");
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);

    let resolver = DataSourceResolver::new(
        None,
        Box::new(FailingTier {
            name: "archive",
            status: 500,
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );
    let err = resolver.resolve(5).await.expect_err("archive down");
    assert!(err.primary.contains("skipped"), "primary: {}", err.primary);
    assert!(err.secondary.contains("500"));
}
