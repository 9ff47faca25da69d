use std::fmt::{Display, Formatter};
use std::time::Duration;

use crate::observation::RawObservation;

/// Fetch errors from the upstream balloon feed.
///
/// Every variant is recovered the same way (fallback substitution); the
/// distinction exists only so the advisory message can name the cause.
#[derive(Debug, Clone)]
pub enum FetchError {
    Timeout,
    Http(u16),
    Transport(String),
    Parse(String),
    InvalidRecord(usize),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "Connection timed out"),
            FetchError::Http(code) => write!(f, "HTTP error: {}", code),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::InvalidRecord(index) => {
                write!(f, "Out-of-range observation at index {}", index)
            }
        }
    }
}

/// Single-shot HTTP client for the balloon telemetry endpoint
///
/// # Request Policy
/// - One bounded GET per call, no retries, no rate limiting
/// - Client-level timeout (default 10 seconds) aborts slow requests
/// - Non-success status, transport failure and parse failure are all
///   reported as a `FetchError`; the caller decides how to degrade
///
/// # Validation
/// - Body must be a JSON array of `[lat, lon, alt]` triples
/// - One out-of-range triple rejects the whole payload (all-or-nothing
///   per fetch cycle)
/// - An empty array is a valid, successful fetch
pub struct BalloonFetcher {
    client: reqwest::Client,
    url: String,
}

impl BalloonFetcher {
    pub const DEFAULT_URL: &'static str = "https://a.windbornesystems.com/treasure/00.json";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Balloon Atlas/0.1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        BalloonFetcher {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate one payload from the upstream feed.
    pub async fn fetch(&self) -> Result<Vec<RawObservation>, FetchError> {
        let response = match self.client.get(&self.url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    return Err(FetchError::Timeout);
                }
                return Err(FetchError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                if e.is_timeout() {
                    return Err(FetchError::Timeout);
                }
                return Err(FetchError::Transport(format!(
                    "Failed to read response: {}",
                    e
                )));
            }
        };

        let observations: Vec<RawObservation> =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        // All-or-nothing: one bad triple rejects the payload.
        if let Some(index) = observations.iter().position(|obs| !obs.is_valid()) {
            return Err(FetchError::InvalidRecord(index));
        }

        Ok(observations)
    }
}

impl Default for BalloonFetcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL, Self::DEFAULT_TIMEOUT)
    }
}
