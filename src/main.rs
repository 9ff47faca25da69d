use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::time::Duration;

use balloon_atlas_rs::fetcher::BalloonFetcher;
use balloon_atlas_rs::server::{self, AppState, CorsPolicy, FallbackStatusPolicy};
use balloon_atlas_rs::session::ConstellationSession;

#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(about = "Balloon constellation dashboard - polls upstream telemetry, serves charts and stats", long_about = None)]
struct Args {
    /// Port to serve on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Upstream telemetry endpoint
    #[arg(long, default_value = BalloonFetcher::DEFAULT_URL)]
    upstream: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Refresh interval in seconds
    #[arg(long, default_value = "300")]
    refresh_secs: u64,

    /// Respond 503 instead of 200 when serving fallback data
    #[arg(long)]
    fallback_503: bool,

    /// Restrict CORS to one origin instead of allowing any
    #[arg(long)]
    allow_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("[{}] Balloon Atlas starting", ts_now());
    println!("  Upstream: {}", args.upstream);
    println!("  Timeout: {}s", args.timeout_secs);
    println!("  Refresh: every {}s", args.refresh_secs);

    let fetcher = BalloonFetcher::new(args.upstream, Duration::from_secs(args.timeout_secs));
    let mut session = ConstellationSession::new(fetcher, Duration::from_secs(args.refresh_secs));
    session.start();

    let fallback_policy = if args.fallback_503 {
        FallbackStatusPolicy::ServiceUnavailable
    } else {
        FallbackStatusPolicy::AlwaysOk
    };
    let cors = match args.allow_origin {
        Some(origin) => CorsPolicy::Origin(origin),
        None => CorsPolicy::Permissive,
    };

    let state = AppState::new(session.snapshot_handle(), fallback_policy);
    server::serve(state, cors, args.port).await
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
