use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::ingest::types::{
    HeadlinesSnapshot, MetricsSnapshot, SnapshotPair, SnapshotProvider,
};
use crate::ingest::FetchError;

/// HTTP-backed data tier. Fetches `<base>/metrics` and `<base>/headlines`
/// concurrently; any transport error, timeout, or non-success status on
/// either resource fails the whole tier for the cycle.
pub struct HttpTierProvider {
    name: &'static str,
    base_url: String,
    client: reqwest::Client,
}

impl HttpTierProvider {
    pub fn new(name: &'static str, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            name,
            base_url: base_url.into(),
            client,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        cache_bust: u64,
    ) -> Result<T, FetchError> {
        let url = format!(
            "{}/{}?v={}",
            self.base_url.trim_end_matches('/'),
            resource,
            cache_bust
        );
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource,
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            resource,
            source: e,
        })
    }
}

#[async_trait::async_trait]
impl SnapshotProvider for HttpTierProvider {
    async fn fetch_pair(&self, cache_bust: u64) -> Result<SnapshotPair, FetchError> {
        let (metrics, headlines) = tokio::join!(
            self.fetch_json::<MetricsSnapshot>("metrics", cache_bust),
            self.fetch_json::<HeadlinesSnapshot>("headlines", cache_bust),
        );
        // Partial success is failure for this tier.
        Ok(SnapshotPair {
            metrics: metrics?,
            headlines: headlines?,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
