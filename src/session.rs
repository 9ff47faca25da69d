use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::fetcher::BalloonFetcher;
use crate::pipeline::{self, FetchOutcome};

/// One published state of the constellation.
///
/// Replaced wholesale under the write lock, never mutated in place, so
/// readers always observe a complete fetch cycle.
#[derive(Clone)]
pub struct Snapshot {
    pub outcome: FetchOutcome,
    pub generation: u64,
    pub fetched_at: f64,
}

/// Owns the current displayed sequence and the periodic refresh task.
///
/// Each cycle takes a generation number at cycle start; a cycle only
/// publishes if no later-started cycle has published first, so a slow,
/// stale response cannot clobber a fresher one. The task handle is held
/// and aborted on `stop` or drop.
pub struct ConstellationSession {
    fetcher: Arc<BalloonFetcher>,
    snapshot: Arc<RwLock<Snapshot>>,
    next_generation: Arc<AtomicU64>,
    refresh_interval: Duration,
    refresh_handle: Option<JoinHandle<()>>,
}

impl ConstellationSession {
    pub const DEFAULT_REFRESH: Duration = Duration::from_secs(300);

    /// Create a session seeded with the sample data. The seed carries
    /// generation 0, so the first real cycle always replaces it.
    pub fn new(fetcher: BalloonFetcher, refresh_interval: Duration) -> Self {
        let seed = Snapshot {
            outcome: FetchOutcome::seed(),
            generation: 0,
            fetched_at: current_timestamp(),
        };

        ConstellationSession {
            fetcher: Arc::new(fetcher),
            snapshot: Arc::new(RwLock::new(seed)),
            next_generation: Arc::new(AtomicU64::new(0)),
            refresh_interval,
            refresh_handle: None,
        }
    }

    /// Shared handle to the snapshot slot, for the HTTP layer.
    pub fn snapshot_handle(&self) -> Arc<RwLock<Snapshot>> {
        self.snapshot.clone()
    }

    pub async fn current(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Run a single fetch cycle and publish its result.
    pub async fn refresh_once(&self) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = pipeline::refresh(&self.fetcher).await;
        publish(&self.snapshot, outcome, generation).await;
    }

    /// Spawn the periodic refresh task. The first cycle runs
    /// immediately, then one per interval.
    pub fn start(&mut self) {
        if self.refresh_handle.is_some() {
            return;
        }

        let fetcher = self.fetcher.clone();
        let snapshot = self.snapshot.clone();
        let next_generation = self.next_generation.clone();
        let period = self.refresh_interval;

        self.refresh_handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let generation = next_generation.fetch_add(1, Ordering::SeqCst) + 1;
                let outcome = pipeline::refresh(&fetcher).await;
                publish(&snapshot, outcome, generation).await;
            }
        }));
    }

    /// Abort the refresh task. The last published snapshot stays
    /// readable.
    pub fn stop(&mut self) {
        if let Some(handle) = self.refresh_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ConstellationSession {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn publish(slot: &RwLock<Snapshot>, outcome: FetchOutcome, generation: u64) {
    let mut guard = slot.write().await;
    if generation <= guard.generation {
        // A later-started cycle already published; drop this one.
        log::warn!(
            "dropping stale refresh cycle {} (current generation {})",
            generation,
            guard.generation
        );
        return;
    }
    log::info!(
        "refresh cycle {}: {} records ({:?})",
        generation,
        outcome.records.len(),
        outcome.source
    );
    *guard = Snapshot {
        outcome,
        generation,
        fetched_at: current_timestamp(),
    };
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
