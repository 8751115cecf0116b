//! Cycle driver.
//!
//! `run_cycle` is the single entry point for one scan → classify →
//! transition → notify → persist pass. `Monitor` re-invokes it on a fixed
//! interval; cycles never overlap because the loop awaits each one.

use tokio::time::{interval, Duration, MissedTickBehavior};
use uuid::Uuid;

use lanwatch_core::events::Notification;

use crate::engine::{CycleOutcome, Station};
use crate::error::Result;
use crate::nmap_text::parse_scan;
use crate::notify::{self, Notifier};
use crate::scanner::ScanSource;
use crate::store::DeviceStore;

/// Run one full cycle: sweep `target`, then apply the result at the current time.
pub async fn run_cycle<S: DeviceStore, N: Notifier>(
    station: &mut Station<S>,
    scanner: &ScanSource,
    notifier: &N,
    target: &str,
) -> Result<CycleOutcome> {
    let text = scanner.sweep(target).await?;
    let now = chrono::Utc::now().timestamp();
    process_scan(station, notifier, &text, now).await
}

/// Apply already-captured scan `text`, taken at `now`, to the station.
pub async fn process_scan<S: DeviceStore, N: Notifier>(
    station: &mut Station<S>,
    notifier: &N,
    text: &str,
    now: i64,
) -> Result<CycleOutcome> {
    let cycle_id = Uuid::new_v4();
    let report = parse_scan(text, now)?;

    tracing::debug!(
        cycle_id = %cycle_id,
        hosts_up = report.summary.hosts_up,
        elapsed_secs = report.summary.elapsed_secs,
        "Discovered hosts"
    );

    let outcome = station.apply_scan(report.hosts, now);

    let settings = station.settings();
    let delivered = notify::dispatch(
        notifier,
        &outcome.notifications,
        &settings.station_name,
        settings.notify_pause,
    )
    .await;

    // A change left unsaved by an earlier failed cycle is written now.
    let saved = station.needs_save();
    if saved {
        station.persist()?;
    }

    tracing::info!(
        cycle_id = %cycle_id,
        present = outcome.summary.present_count,
        new = outcome.summary.new_count,
        absent = outcome.summary.absent_count,
        dead = outcome.summary.dead_count,
        notified = delivered,
        saved,
        "Cycle complete"
    );

    Ok(outcome)
}

/// Runs cycles forever at a fixed interval.
pub struct Monitor<S, N> {
    station: Station<S>,
    scanner: ScanSource,
    notifier: N,
    target: String,
    interval_secs: u64,
}

impl<S: DeviceStore, N: Notifier> Monitor<S, N> {
    pub fn new(
        station: Station<S>,
        scanner: ScanSource,
        notifier: N,
        target: &str,
        interval_secs: u64,
    ) -> Self {
        Self {
            station,
            scanner,
            notifier,
            target: target.to_string(),
            interval_secs,
        }
    }

    /// Announce startup on the notification channel.
    pub async fn announce(&self) {
        let message = Notification::Started.render(&self.station.settings().station_name);
        notify::send(&self.notifier, &message).await;
    }

    /// Run a single cycle and return its result.
    pub async fn run_once(&mut self) -> Result<CycleOutcome> {
        run_cycle(
            &mut self.station,
            &self.scanner,
            &self.notifier,
            &self.target,
        )
        .await
    }

    /// Run a single cycle, logging a failure instead of returning it.
    pub async fn tick(&mut self) {
        if let Err(e) = self.run_once().await {
            tracing::error!(target = %self.target, error = %e, "Cycle failed");
        }
    }

    /// Run the first cycle immediately, then one every interval.
    /// Never returns; the process is stopped from outside.
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs(self.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target = %self.target,
            interval_secs = self.interval_secs,
            "Monitor started"
        );

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}
