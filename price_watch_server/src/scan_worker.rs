use std::{sync::Arc, time::Duration};

use log::*;
use price_watch_engine::SqliteScanner;
use tokio::task::JoinHandle;

/// Starts the periodic scan worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// A cycle that overruns the interval delays the next tick rather than stacking up behind it.
pub fn start_scan_worker(scanner: Arc<SqliteScanner>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("🕰️ Scan worker started. Scanning every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running scheduled scan");
            let summary = scanner.run_scan_cycle().await;
            if summary.executed > 0 || summary.failed > 0 {
                info!(
                    "🕰️ Scheduled scan: {} executed, {} expired, {} failed of {} checked",
                    summary.executed, summary.expired, summary.failed, summary.checked
                );
            } else {
                debug!("🕰️ Scheduled scan: nothing to do ({} checked, {} expired)", summary.checked, summary.expired);
            }
        }
    })
}
