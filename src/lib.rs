//! Balloon Atlas: polls the WindBorne constellation feed, normalizes the
//! reported positions into chart-ready records, and serves them through a
//! permissive-CORS API plus a live dashboard. Any upstream failure
//! degrades to a fixed sample set, never to an error page.

pub mod fetcher;
pub mod observation;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod stats;

pub use fetcher::{BalloonFetcher, FetchError};
pub use observation::{fallback_records, normalize_records, DisplayRecord, RawObservation};
pub use pipeline::{DataSource, FetchOutcome};
pub use session::ConstellationSession;
pub use stats::AltitudeStats;
