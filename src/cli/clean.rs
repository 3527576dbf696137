use crate::{
    cli::{build_reconciler, build_remote},
    config::Settings,
    info, success, warning,
};

/// Runs protected discovery and eviction without touching the catalog.
///
/// Discovery always runs when a Plex token is configured; files held only by
/// a protected Plex playlist are otherwise indistinguishable from orphans.
/// With `dry_run` the files and directories that would go are listed and
/// nothing is deleted.
pub async fn clean(settings: &Settings, dry_run: bool) {
    if !settings.eviction_enabled {
        warning!("Eviction is disabled (EVICTION_ENABLED=false); nothing to do.");
        return;
    }

    let mut protected_files = Vec::new();
    match build_remote(settings, false) {
        Ok(Some(remote)) => {
            info!("Discovering protected Plex playlists...");
            let state = remote.discover_protected().await;
            if state.incomplete {
                warning!("A protected Plex playlist could not be read; not evicting.");
                return;
            }
            protected_files = state.files();
        }
        Ok(None) => warning!("PLEX_TOKEN not set. Only manifests protect files."),
        Err(e) => {
            warning!("Cannot reach Plex: {}", e);
            return;
        }
    }

    let reconciler = build_reconciler(settings, true);
    let result = tokio::task::spawn_blocking(move || {
        if dry_run {
            reconciler.plan(&protected_files)
        } else {
            reconciler.reconcile(&protected_files)
        }
    })
    .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            warning!("Eviction failed: {}", e);
            return;
        }
    };

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    for file in &report.deleted_files {
        info!("{} {}", verb, file.display());
    }
    for dir in &report.deleted_dirs {
        info!("{} directory {}", verb, dir.display());
    }
    for error in &report.errors {
        warning!("{}", error);
    }

    success!(
        "{} {} files and {} directories ({} protected paths).",
        verb,
        report.deleted_files.len(),
        report.deleted_dirs.len(),
        report.protected
    );
}
