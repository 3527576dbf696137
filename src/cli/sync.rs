use crate::{
    cli::{SyncOptions, build_cycle, print_report},
    config::Settings,
    info, success, warning,
};

pub async fn sync(settings: &Settings, options: SyncOptions) {
    if settings.playlist_ids.is_empty() {
        warning!("No PLAYLIST_IDS configured; every manifest will be empty.");
    }
    if !settings.remote_enabled() {
        warning!("PLEX_TOKEN not set. Skipping Plex API sync.");
    } else if options.no_remote {
        info!("Skipping the Plex mirror; protected playlists are still read.");
    }

    let cycle = match build_cycle(settings, &options) {
        Ok(cycle) => cycle,
        Err(e) => {
            warning!("Cannot set up sync: {}", e);
            return;
        }
    };

    info!("Starting sync cycle...");
    let report = cycle.run().await;
    print_report(&report);
    success!("Sync complete.");
}
