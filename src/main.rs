//! CLI entry point for the transit stop board.
//!
//! `run` drives the display refresh loop; the other subcommands are one-shot
//! queries against the 511.org API for checking configuration.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_board::{
    config::{ApiConfig, Config, parse_station_list},
    display::Display,
    fetch::BasicClient,
    refresh::{RefreshLoop, RefreshSettings},
    transit::{BayAreaTransitClient, StopGroups, TransitAgency},
};

#[derive(Parser)]
#[command(name = "transit_board")]
#[command(about = "Shows Bay Area transit stops on a small pixel display", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll 511.org and keep the display updated
    Run {
        /// Agency code, overriding TRANSIT_AGENCY
        #[arg(short, long)]
        agency: Option<TransitAgency>,

        /// Seconds between refreshes, overriding REFRESH_INTERVAL_SECS
        #[arg(short = 'r', long)]
        refresh_interval: Option<u64>,
    },
    /// Fetch stops once and print them grouped by parent station as JSON
    Stops {
        /// Agency code, overriding TRANSIT_AGENCY
        #[arg(short, long)]
        agency: Option<TransitAgency>,

        /// Comma separated parent stations, overriding PARENT_STATIONS
        #[arg(short, long)]
        stations: Option<String>,
    },
    /// Check that the real-time StopMonitoring endpoint answers
    Arrivals {
        #[arg(short, long, default_value = "CT")]
        agency: TransitAgency,

        /// Restrict to a single stop code
        #[arg(long)]
        stopcode: Option<String>,
    },
    /// List the known agency codes
    Agencies,
}

#[derive(Serialize)]
struct StopsReport<'a> {
    fetched_at: chrono::DateTime<Utc>,
    agency: TransitAgency,
    stations: &'a StopGroups,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            agency,
            refresh_interval,
        } => {
            let mut config = Config::from_env()?;
            if let Some(agency) = agency {
                config.agency = agency;
            }
            if let Some(secs) = refresh_interval {
                anyhow::ensure!(secs > 0, "refresh interval must be at least 1 second");
                config.refresh_interval = std::time::Duration::from_secs(secs);
            }
            run(config).await?;
        }
        Commands::Stops { agency, stations } => {
            let config = Config::from_env()?;
            let agency = agency.unwrap_or(config.agency);
            let stations = stations
                .map(|s| parse_station_list(&s))
                .unwrap_or(config.parent_stations);

            let client = BayAreaTransitClient::new(
                config.api_key,
                BasicClient::with_timeout(config.http_timeout)?,
            );
            let groups = client
                .get_stops_for_parent_stations(agency, &stations)
                .await?;

            let report = StopsReport {
                fetched_at: Utc::now(),
                agency,
                stations: &groups,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Arrivals { agency, stopcode } => {
            let api = ApiConfig::from_env()?;
            let client = BayAreaTransitClient::new(
                api.api_key,
                BasicClient::with_timeout(api.http_timeout)?,
            );
            client
                .get_real_time_arrival_departures(agency, stopcode.as_deref())
                .await?;
            info!(agency = %agency, "StopMonitoring answered");
        }
        Commands::Agencies => {
            for agency in TransitAgency::ALL {
                println!("{}  {}", agency.code(), agency.name());
            }
        }
    }

    Ok(())
}

/// Builds the display and client from `config` and polls until Ctrl+C.
#[tracing::instrument(skip_all, fields(agency = %config.agency))]
async fn run(config: Config) -> Result<()> {
    let display = Display::new(config.display_width, config.display_height);
    let client = BayAreaTransitClient::new(
        config.api_key,
        BasicClient::with_timeout(config.http_timeout)?,
    );
    let settings = RefreshSettings {
        agency: config.agency,
        parent_stations: config.parent_stations,
        refresh_interval: config.refresh_interval,
        tick_interval: config.tick_interval,
    };

    let board = RefreshLoop::new(client, display, settings)?;

    info!("Running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = board.run() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutting down");
        }
    }
    Ok(())
}
