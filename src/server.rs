use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observation::DisplayRecord;
use crate::pipeline::DataSource;
use crate::session::Snapshot;
use crate::stats::AltitudeStats;

/// HTTP status served with fallback payloads.
///
/// The public contract never surfaces a hard error: even in
/// `ServiceUnavailable` mode the body is the full fallback payload, only
/// the status differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackStatusPolicy {
    /// Always 200, live or fallback (the default).
    AlwaysOk,
    /// 503 when the payload is fallback data.
    ServiceUnavailable,
}

/// Cross-origin policy for the read-only API.
#[derive(Clone, Debug)]
pub enum CorsPolicy {
    Permissive,
    Origin(String),
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<RwLock<Snapshot>>,
    pub fallback_policy: FallbackStatusPolicy,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(snapshot: Arc<RwLock<Snapshot>>, fallback_policy: FallbackStatusPolicy) -> Self {
        AppState {
            snapshot,
            fallback_policy,
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize)]
struct BalloonsResponse {
    records: Vec<DisplayRecord>,
    source: DataSource,
    advisory: Option<String>,
}

#[derive(Serialize)]
struct StatsResponse {
    stats: Option<AltitudeStats>,
    message: Option<&'static str>,
}

#[derive(Serialize)]
struct DashboardFrame {
    uptime: u64,
    fetched_at: f64,
    source: DataSource,
    advisory: Option<String>,
    records: Vec<DisplayRecord>,
    stats: Option<AltitudeStats>,
}

pub fn router(state: AppState, cors: CorsPolicy) -> Router {
    let cors_layer = match cors {
        CorsPolicy::Permissive => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsPolicy::Origin(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map(AllowOrigin::exact)
                .unwrap_or_else(|_| AllowOrigin::any());
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/balloons", get(balloons_handler))
        .route("/api/stats", get(stats_handler))
        .route("/ws", get(ws_handler))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, cors: CorsPolicy, port: u16) -> anyhow::Result<()> {
    let app = router(state, cors);

    let addr = format!("0.0.0.0:{}", port);
    eprintln!("[ATLAS] Serving dashboard at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("dashboard_static.html"))
}

/// Read-only proxy boundary: the current snapshot's records, live or
/// fallback, with the source and advisory in the envelope so callers
/// can tell degraded data apart.
async fn balloons_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.snapshot.read().await.clone();

    let status = match (snap.outcome.source, state.fallback_policy) {
        (DataSource::Fallback, FallbackStatusPolicy::ServiceUnavailable) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    };

    let body = BalloonsResponse {
        records: snap.outcome.records,
        source: snap.outcome.source,
        advisory: snap.outcome.advisory,
    };
    (status, Json(body))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snap = state.snapshot.read().await;

    match AltitudeStats::compute(&snap.outcome.records) {
        Some(stats) => Json(StatsResponse {
            stats: Some(stats),
            message: None,
        }),
        None => Json(StatsResponse {
            stats: None,
            message: Some("no data"),
        }),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Drain client frames so close handshakes are noticed.
    let mut drain = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    loop {
        let frame = {
            let snap = state.snapshot.read().await;
            let stats = AltitudeStats::compute(&snap.outcome.records);
            DashboardFrame {
                uptime: state.started_at.elapsed().as_secs(),
                fetched_at: snap.fetched_at,
                source: snap.outcome.source,
                advisory: snap.outcome.advisory.clone(),
                records: snap.outcome.records.clone(),
                stats,
            }
        };

        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(_) => break,
        };

        tokio::select! {
            _ = &mut drain => break,
            sent = sender.send(Message::Text(json)) => {
                if sent.is_err() {
                    // Client disconnected
                    break;
                }
            }
        }

        sleep(Duration::from_secs(2)).await;
    }

    drain.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{fallback_records, normalize_records, RawObservation};
    use crate::pipeline::FetchOutcome;
    use crate::session::current_timestamp;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_with(outcome: FetchOutcome, policy: FallbackStatusPolicy) -> AppState {
        let snapshot = Snapshot {
            outcome,
            generation: 1,
            fetched_at: current_timestamp(),
        };
        AppState::new(Arc::new(RwLock::new(snapshot)), policy)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_balloons_live_payload() {
        let records = normalize_records(&[RawObservation(1.0, 2.0, 3.0)]);
        let state = state_with(FetchOutcome::live(records), FallbackStatusPolicy::AlwaysOk);
        let app = router(state, CorsPolicy::Permissive);

        let (status, body) = get_json(app, "/api/balloons").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "live");
        assert!(body["advisory"].is_null());
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
        assert_eq!(body["records"][0]["id"], 1);
        assert_eq!(body["records"][0]["longitude"], 2.0);
    }

    #[tokio::test]
    async fn test_balloons_fallback_is_200_by_default() {
        let state = state_with(
            FetchOutcome::fallback(&crate::fetcher::FetchError::Http(503)),
            FallbackStatusPolicy::AlwaysOk,
        );
        let app = router(state, CorsPolicy::Permissive);

        let (status, body) = get_json(app, "/api/balloons").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fallback");
        assert!(body["advisory"].as_str().unwrap().contains("503"));
        assert_eq!(body["records"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_balloons_fallback_503_policy() {
        let state = state_with(
            FetchOutcome::fallback(&crate::fetcher::FetchError::Timeout),
            FallbackStatusPolicy::ServiceUnavailable,
        );
        let app = router(state, CorsPolicy::Permissive);

        let (status, body) = get_json(app, "/api/balloons").await;

        // Different status, but still the full fallback payload.
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["records"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let state = state_with(
            FetchOutcome::live(fallback_records()),
            FallbackStatusPolicy::AlwaysOk,
        );
        let app = router(state, CorsPolicy::Permissive);

        let (status, body) = get_json(app, "/api/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["count"], 6);
        assert!(body["stats"]["avg_altitude"].as_f64().unwrap() > 8.0);
        assert!(body["message"].is_null());
    }

    #[tokio::test]
    async fn test_stats_endpoint_empty_sequence() {
        let state = state_with(FetchOutcome::live(vec![]), FallbackStatusPolicy::AlwaysOk);
        let app = router(state, CorsPolicy::Permissive);

        let (status, body) = get_json(app, "/api/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["stats"].is_null());
        assert_eq!(body["message"], "no data");
    }

    #[tokio::test]
    async fn test_index_serves_dashboard_page() {
        let state = state_with(FetchOutcome::seed(), FallbackStatusPolicy::AlwaysOk);
        let app = router(state, CorsPolicy::Permissive);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Balloon Atlas"));
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let state = state_with(FetchOutcome::seed(), FallbackStatusPolicy::AlwaysOk);
        let app = router(state, CorsPolicy::Permissive);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/balloons")
                    .header("origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allow_origin = response
            .headers()
            .get("access-control-allow-origin")
            .expect("CORS header set");
        assert_eq!(allow_origin, "*");
    }
}
