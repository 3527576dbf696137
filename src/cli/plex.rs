use crate::{
    cli::{build_manifests, build_remote},
    config::Settings,
    info, success, warning,
};

/// Mirrors the manifests currently on disk to Plex.
pub async fn plex(settings: &Settings, show_progress: bool) {
    let remote = match build_remote(settings, show_progress) {
        Ok(Some(remote)) => remote,
        Ok(None) => {
            warning!("PLEX_TOKEN not set. Skipping Plex API sync.");
            return;
        }
        Err(e) => {
            warning!("Cannot set up Plex client: {}", e);
            return;
        }
    };

    info!("Connecting to Plex at {}...", remote.client().base_url());
    let report = remote.mirror(&build_manifests(settings)).await;

    if let Some(reason) = &report.aborted {
        warning!("Plex sync aborted: {}", reason);
        return;
    }
    for error in &report.errors {
        warning!("{}", error);
    }
    success!(
        "Plex sync complete: {} deleted, {} uploaded, {} protected left alone.",
        report.deleted.len(),
        report.uploaded.len(),
        report.skipped_protected.len()
    );
}
