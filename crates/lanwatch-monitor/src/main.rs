//! CLI entry point for the lanwatch presence monitor.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lanwatch_monitor::config::MonitorConfig;
use lanwatch_monitor::engine::{Station, StationSettings};
use lanwatch_monitor::notify::{LineNotifier, LogNotifier, Notifier};
use lanwatch_monitor::scanner::{NmapScanner, ScanSource, DUMMY_SCAN};
use lanwatch_monitor::scheduler::Monitor;
use lanwatch_monitor::store::JsonFileStore;
use lanwatch_monitor::watchlist::Watchlist;

#[derive(Parser)]
#[command(name = "lanwatch")]
#[command(about = "Watch a LAN segment and alert when devices come and go")]
struct Cli {
    /// Config file path or prefix (default: lanwatch).
    #[arg(short, long, default_value = "lanwatch")]
    config: String,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let config = MonitorConfig::load(&cli.config)?;
    let watchlist = Watchlist::from_config(&config.watchlist)?;
    let store = JsonFileStore::new(&config.database);
    let station = Station::open(StationSettings::from(&config), watchlist, store)?;

    let scanner = if config.dummy_scan {
        ScanSource::Canned(DUMMY_SCAN.to_string())
    } else {
        let nmap = NmapScanner::new(&config.nmap_path);
        let version = nmap.verify_installation().await?;
        tracing::info!(nmap_version = %version.lines().next().unwrap_or("").trim(), "Nmap verified");
        ScanSource::Nmap(nmap)
    };

    tracing::info!(
        network = %config.network,
        interval_secs = config.interval_secs,
        dead_timeout_secs = config.dead_timeout_secs,
        dummy_scan = config.dummy_scan,
        line_enabled = config.line_enable,
        "Configuration loaded"
    );

    if config.line_enable {
        start(station, scanner, LineNotifier::new(&config.line_token), &config, cli.once).await
    } else {
        start(station, scanner, LogNotifier, &config, cli.once).await
    }
}

async fn start<N: Notifier>(
    station: Station<JsonFileStore>,
    scanner: ScanSource,
    notifier: N,
    config: &MonitorConfig,
    once: bool,
) -> anyhow::Result<()> {
    let mut monitor = Monitor::new(
        station,
        scanner,
        notifier,
        &config.network,
        config.interval_secs,
    );
    monitor.announce().await;

    if once {
        monitor.run_once().await?;
    } else {
        monitor.run().await;
    }

    Ok(())
}
