use wayfarer::config::{DEFAULT_BOOKINGS_DIR, DEFAULT_SERVER_NAME, ensure_env_loaded};
use wayfarer::logging::init_tracing;
use wayfarer::server::ToolServer;
use wayfarer::tools::{BookingStore, DEFAULT_WEATHER_URL, ToolContext, WeatherClient, travel_toolset};

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

const INSTRUCTIONS: &str = "Travel booking tools. Book a trip with book_trip before linking \
transportation to it with book_transportation; use the returned booking ID.";

/// MCP tool server for the travel assistant, speaking JSON-RPC over stdin/stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory where booking files are written
    #[arg(long, env = "WAYFARER_BOOKINGS_DIR", default_value = DEFAULT_BOOKINGS_DIR)]
    bookings_dir: PathBuf,

    /// Base URL of the Open-Meteo forecast API
    #[arg(long, env = "WAYFARER_WEATHER_URL", default_value = DEFAULT_WEATHER_URL)]
    weather_url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    ensure_env_loaded();
    let args = Args::parse();
    init_tracing("info");

    let context = ToolContext::new(
        BookingStore::new(&args.bookings_dir),
        WeatherClient::new(args.weather_url),
    );
    info!(bookings_dir = %args.bookings_dir.display(), "Starting travel tool server");

    ToolServer::new(travel_toolset()?, context)
        .with_name(DEFAULT_SERVER_NAME)
        .with_instructions(INSTRUCTIONS)
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await?;
    Ok(())
}
