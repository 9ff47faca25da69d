use serde::Serialize;

use crate::fetcher::{BalloonFetcher, FetchError};
use crate::observation::{fallback_records, normalize_records, DisplayRecord};

/// Where the currently displayed records came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

/// Result of one fetch cycle. Always usable: a failed fetch is reported
/// as the fallback records plus an advisory message, never as an error.
#[derive(Clone, Debug, Serialize)]
pub struct FetchOutcome {
    pub records: Vec<DisplayRecord>,
    pub source: DataSource,
    pub advisory: Option<String>,
}

impl FetchOutcome {
    pub fn live(records: Vec<DisplayRecord>) -> Self {
        FetchOutcome {
            records,
            source: DataSource::Live,
            advisory: None,
        }
    }

    pub fn fallback(cause: &FetchError) -> Self {
        FetchOutcome {
            records: fallback_records(),
            source: DataSource::Fallback,
            advisory: Some(format!("{}. Displaying sample data.", cause)),
        }
    }

    /// Initial state before the first live fetch completes: sample data,
    /// no advisory.
    pub fn seed() -> Self {
        FetchOutcome {
            records: fallback_records(),
            source: DataSource::Fallback,
            advisory: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

/// Run one fetch-and-normalize cycle.
///
/// Never fails outward: timeout, HTTP error, transport failure and
/// malformed payload all fold into the fallback substitution. The cause
/// is kept in the advisory string and in the warn log.
pub async fn refresh(fetcher: &BalloonFetcher) -> FetchOutcome {
    match fetcher.fetch().await {
        Ok(raw) => {
            log::info!("fetched {} observations from {}", raw.len(), fetcher.url());
            FetchOutcome::live(normalize_records(&raw))
        }
        Err(e) => {
            log::warn!("upstream fetch failed: {}, substituting sample data", e);
            FetchOutcome::fallback(&e)
        }
    }
}
