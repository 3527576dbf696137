use std::sync::Arc;

use tokio::{sync::Mutex, time::MissedTickBehavior};

use crate::{
    cli::{SyncOptions, build_cycle, print_report},
    config::Settings,
    info,
    server::{SharedSummary, start_api_server},
    success, warning,
};

/// Runs a cycle immediately and then once per `SYNC_INTERVAL_MINUTES`.
///
/// Cycles never overlap: the next tick is only awaited after the previous
/// cycle, including its eviction and Plex mirror, has finished. Ctrl-C stops
/// the loop, cancelling a running cycle at its next await point.
pub async fn watch(settings: &Settings, options: SyncOptions) {
    let last_cycle: SharedSummary = Arc::new(Mutex::new(None));

    if let Some(address) = settings.health_address.clone() {
        let state = Arc::clone(&last_cycle);
        info!("Serving health endpoint on {}", address);
        tokio::spawn(async move {
            if let Err(e) = start_api_server(&address, state).await {
                warning!("Health endpoint stopped: {}", e);
            }
        });
    }

    let cycle = match build_cycle(settings, &options) {
        Ok(cycle) => cycle,
        Err(e) => {
            warning!("Cannot set up sync: {}", e);
            return;
        }
    };

    let mut ticker = tokio::time::interval(settings.sync_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down.");
                return;
            }
        }

        info!("Starting sync cycle...");
        let report = tokio::select! {
            report = cycle.run() => report,
            _ = tokio::signal::ctrl_c() => {
                warning!("Interrupted; the running cycle was cancelled.");
                return;
            }
        };

        print_report(&report);
        *last_cycle.lock().await = Some(report.summary());
        success!(
            "Sync complete. Waiting {} minutes for the next run...",
            settings.sync_interval.as_secs() / 60
        );
    }
}
