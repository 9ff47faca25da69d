use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use balloon_atlas_rs::fetcher::BalloonFetcher;
use balloon_atlas_rs::pipeline;
use balloon_atlas_rs::stats::AltitudeStats;

#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(about = "One-shot fetch of the balloon feed, printed as records and stats", long_about = None)]
struct Args {
    /// Upstream telemetry endpoint
    #[arg(long, default_value = BalloonFetcher::DEFAULT_URL)]
    upstream: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Print the record list as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let fetcher = BalloonFetcher::new(args.upstream, Duration::from_secs(args.timeout_secs));
    let outcome = pipeline::refresh(&fetcher).await;

    if let Some(advisory) = &outcome.advisory {
        eprintln!("Warning: {}", advisory);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    } else {
        for record in &outcome.records {
            println!(
                "#{:<3} lat {:>10.4}  lon {:>10.4}  alt {:>7.2} km",
                record.id, record.latitude, record.longitude, record.altitude
            );
        }
    }

    match AltitudeStats::compute(&outcome.records) {
        Some(stats) => println!(
            "\n{} balloons | altitude avg {:.2} km, range {:.1}-{:.1} km",
            stats.count, stats.avg_altitude, stats.min_altitude, stats.max_altitude
        ),
        None => println!("\nNo balloons reported."),
    }

    Ok(())
}
