// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod countdown;
pub mod fingerprint;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod severity;
pub mod smoothing;
pub mod sorting;
pub mod view;
pub mod windowing;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::ingest::{DataSourceResolver, DataUnavailable, FetchError};
pub use crate::pipeline::{spawn_refresh_loop, CycleOutcome, Pipeline};
pub use crate::view::DashboardView;
