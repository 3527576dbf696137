use std::{collections::HashSet, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    info,
    management::{ManifestManager, manifest_title},
    plex::PlexClient,
    success,
    types::RemotePlaylist,
    utils, warning,
};

/// Protected playlists and their member files, read before eviction.
#[derive(Debug, Clone, Default)]
pub struct ProtectedState {
    pub playlists: Vec<RemotePlaylist>,
    pub errors: Vec<String>,
    /// A protected playlist was found but its files could not be read.
    pub incomplete: bool,
}

impl ProtectedState {
    pub fn files(&self) -> Vec<String> {
        self.playlists
            .iter()
            .flat_map(|pl| pl.files.iter().cloned())
            .collect()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.playlists.iter().map(|pl| pl.title.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MirrorReport {
    /// Why the remote phase stopped early, if it did.
    pub aborted: Option<String>,
    pub deleted: Vec<String>,
    pub uploaded: Vec<String>,
    pub skipped_protected: Vec<String>,
    pub errors: Vec<String>,
}

/// Per-cycle protocol against the media server.
pub struct RemoteSync {
    client: PlexClient,
    library: String,
    protection_marker: String,
    settle: Duration,
    show_progress: bool,
}

impl RemoteSync {
    /// Creates the mirror for one Plex music library.
    ///
    /// # Arguments
    ///
    /// * `client` - Authenticated Plex client
    /// * `library` - Title of the music section manifests are uploaded into
    /// * `protection_marker` - Summary text that marks a playlist as protected
    /// * `settle` - Wait between the library refresh and the first upload
    pub fn new(
        client: PlexClient,
        library: impl Into<String>,
        protection_marker: impl Into<String>,
        settle: Duration,
    ) -> Self {
        Self {
            client,
            library: library.into(),
            protection_marker: protection_marker.into(),
            settle,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn client(&self) -> &PlexClient {
        &self.client
    }

    /// Lists protected playlists and fetches their member files.
    ///
    /// Never fails: when the listing itself fails the state is empty and the
    /// error is recorded, so eviction proceeds with manifests as the only
    /// protection.
    pub async fn discover_protected(&self) -> ProtectedState {
        let mut state = ProtectedState::default();

        let playlists = match self.client.list_playlists(&self.protection_marker).await {
            Ok(playlists) => playlists,
            Err(e) => {
                warning!("Could not list Plex playlists: {}", e);
                state.errors.push(format!("list playlists: {}", e));
                return state;
            }
        };

        for mut playlist in playlists.into_iter().filter(|pl| pl.protected) {
            match self.client.playlist_files(&playlist.rating_key).await {
                Ok(files) => {
                    info!(
                        "Protected playlist '{}' holds {} files",
                        playlist.title,
                        files.len()
                    );
                    playlist.files = files;
                }
                Err(e) => {
                    warning!(
                        "Could not read protected playlist '{}': {}",
                        playlist.title,
                        e
                    );
                    state
                        .errors
                        .push(format!("items of '{}': {}", playlist.title, e));
                    state.incomplete = true;
                }
            }
            state.playlists.push(playlist);
        }

        state
    }

    /// Rescans, waits for ingestion, then mirrors local manifests to Plex.
    ///
    /// Non-protected remote playlists are deleted; every manifest whose title
    /// matches a protected playlist is left alone, all others are uploaded.
    /// Single delete/upload failures are recorded and do not stop the pass.
    pub async fn mirror(&self, manifests: &ManifestManager) -> MirrorReport {
        let mut report = MirrorReport::default();

        let section_id = match self.client.section_id(&self.library).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let reason = format!("no Plex library named '{}'", self.library);
                warning!("{}", reason);
                report.aborted = Some(reason);
                return report;
            }
            Err(e) => {
                warning!("Plex sync failed: {}", e);
                report.aborted = Some(e.to_string());
                return report;
            }
        };

        info!("Triggering library scan for '{}'...", self.library);
        if let Err(e) = self.client.refresh_section(&section_id).await {
            warning!("Library scan request failed: {}", e);
            report.errors.push(format!("refresh: {}", e));
        }

        self.wait_for_ingestion().await;

        let remote = match self.client.list_playlists(&self.protection_marker).await {
            Ok(playlists) => playlists,
            Err(e) => {
                warning!("Could not list Plex playlists: {}", e);
                report.aborted = Some(format!("list playlists: {}", e));
                return report;
            }
        };

        let protected_titles: HashSet<String> = remote
            .iter()
            .filter(|pl| pl.protected)
            .map(|pl| utils::sanitize_playlist_name(&pl.title))
            .collect();

        for playlist in remote.iter().filter(|pl| !pl.protected) {
            info!("Deleting old Plex playlist '{}'", playlist.title);
            match self.client.delete_playlist(&playlist.rating_key).await {
                Ok(()) => report.deleted.push(playlist.title.clone()),
                Err(e) => {
                    warning!("Failed to delete '{}': {}", playlist.title, e);
                    report
                        .errors
                        .push(format!("delete '{}': {}", playlist.title, e));
                }
            }
        }

        let local = match manifests.list().await {
            Ok(local) => local,
            Err(e) => {
                warning!("Cannot list manifests: {}", e);
                report.errors.push(e.to_string());
                Vec::new()
            }
        };

        for manifest in local {
            let Some(title) = manifest_title(&manifest) else {
                continue;
            };

            if protected_titles.contains(&title) {
                info!("Skipping '{}': protected on Plex", title);
                report.skipped_protected.push(title);
                continue;
            }

            let remote_path = match manifests.remote_path(&manifest) {
                Ok(path) => path,
                Err(e) => {
                    report.errors.push(format!("upload '{}': {}", title, e));
                    continue;
                }
            };

            info!("Uploading '{}' to Plex", title);
            match self.client.upload_playlist(&section_id, &remote_path).await {
                Ok(()) => {
                    success!("Uploaded '{}'", title);
                    report.uploaded.push(title);
                }
                Err(e) => {
                    warning!("Failed to upload '{}': {}", title, e);
                    report.errors.push(format!("upload '{}': {}", title, e));
                }
            }
        }

        report
    }

    // Plex exposes no scan-completion status, so this is a fixed wait.
    async fn wait_for_ingestion(&self) {
        if self.settle.is_zero() {
            return;
        }

        let pb = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(format!(
            "Waiting {}s for Plex to ingest new files...",
            self.settle.as_secs()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        tokio::time::sleep(self.settle).await;
        pb.finish_and_clear();
    }
}
