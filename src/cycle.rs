//! One sync cycle, strictly sequential between phases:
//!
//! ```text
//! prepare dirs + wipe staging -> clear manifests
//!   -> protected-state discovery (Plex)
//!   -> catalog fetch -> identity scan -> materialize (bounded pool)
//!   -> manifest build (single writer, playlist order)
//!   -> eviction -> Plex mirror
//! ```
//!
//! Only materialization runs concurrently. Nothing in a cycle is retried;
//! the scheduler runs the whole cycle again at the next interval.

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    catalog::PlaylistCatalog,
    download::{Downloader, MaterializeError, Materializer},
    info,
    management::{EvictionReport, LibraryIndex, ManifestManager, StorageReconciler},
    plex::{MirrorReport, ProtectedState, RemoteSync},
    success,
    types::{CatalogPlaylist, CycleSummary, SkippedEntry, Track},
    utils, warning,
};

#[derive(Debug, Clone)]
pub struct PlaylistOutcome {
    pub title: String,
    pub tracks: usize,
    pub written: usize,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub playlists: Vec<PlaylistOutcome>,
    pub catalog_errors: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub resolved: usize,
    pub materialized: usize,
    pub materialize_errors: Vec<(String, MaterializeError)>,
    pub tag_errors: Vec<(String, MaterializeError)>,
    pub fs_errors: Vec<String>,
    pub manifest_errors: Vec<String>,
    pub protected: Option<ProtectedState>,
    pub eviction: Option<EvictionReport>,
    pub eviction_skipped: Option<String>,
    pub mirror: Option<MirrorReport>,
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            started_at: self.started_at,
            finished_at: self.finished_at,
            playlists: self.playlists.len(),
            tracks: self.playlists.iter().map(|p| p.tracks).sum(),
            resolved: self.resolved,
            materialized: self.materialized,
            failed: self.materialize_errors.len(),
            evicted_files: self
                .eviction
                .as_ref()
                .map_or(0, |e| e.deleted_files.len()),
            uploaded: self.mirror.as_ref().map_or(0, |m| m.uploaded.len()),
            remote_errors: self
                .mirror
                .as_ref()
                .map_or(0, |m| m.errors.len() + usize::from(m.aborted.is_some())),
        }
    }
}

pub struct SyncCycle<C, D> {
    catalog: C,
    materializer: Arc<Materializer<D>>,
    manifests: ManifestManager,
    reconciler: StorageReconciler,
    remote: Option<RemoteSync>,
    mirror: bool,
    playlist_ids: Vec<String>,
    max_songs: usize,
    workers: usize,
    show_progress: bool,
}

impl<C, D> SyncCycle<C, D>
where
    C: PlaylistCatalog,
    D: Downloader + 'static,
{
    /// Wires one cycle together.
    ///
    /// # Arguments
    ///
    /// * `remote` - Plex access; `None` means manifests alone protect files
    ///   and nothing is mirrored
    /// * `playlist_ids` - Catalog playlists, fetched and written in this order
    /// * `max_songs` - Per-playlist track limit
    /// * `workers` - Concurrent downloads, at least one
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: C,
        materializer: Materializer<D>,
        manifests: ManifestManager,
        reconciler: StorageReconciler,
        remote: Option<RemoteSync>,
        playlist_ids: Vec<String>,
        max_songs: usize,
        workers: usize,
    ) -> Self {
        Self {
            catalog,
            materializer: Arc::new(materializer),
            manifests,
            reconciler,
            remote,
            mirror: true,
            playlist_ids,
            max_songs,
            workers: workers.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Turns the Plex mirror pass on or off.
    ///
    /// Protected discovery still runs whenever a remote is configured, so
    /// eviction never loses sight of files only Plex references.
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Runs every phase once and reports what happened.
    ///
    /// Never fails as a whole. Errors are collected in the report, and
    /// eviction is skipped whenever a catalog fetch, a manifest write or a
    /// protected playlist read failed.
    pub async fn run(&self) -> CycleReport {
        let mut report = CycleReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        self.prepare(&mut report).await;

        if let Some(remote) = &self.remote {
            info!("Discovering protected Plex playlists...");
            report.protected = Some(remote.discover_protected().await);
        }

        let playlists = self.fetch_playlists(&mut report).await;
        let paths = self.resolve_tracks(&playlists, &mut report).await;
        self.build_manifests(&playlists, &paths, &mut report).await;
        self.evict(&mut report).await;

        if let Some(remote) = self.remote.as_ref().filter(|_| self.mirror) {
            report.mirror = Some(remote.mirror(&self.manifests).await);
        }

        report.finished_at = Some(Utc::now());
        report
    }

    async fn prepare(&self, report: &mut CycleReport) {
        for dir in [self.materializer.library_root(), self.manifests.dir()] {
            if let Err(e) = async_fs::create_dir_all(dir).await {
                warning!("Cannot create {}: {}", dir.display(), e);
                report
                    .fs_errors
                    .push(format!("create {}: {}", dir.display(), e));
            }
        }

        if let Err(e) = self.materializer.reset_staging().await {
            warning!("Cannot reset staging: {}", e);
            report.fs_errors.push(e.to_string());
        }

        info!("Clearing old playlist manifests...");
        if let Err(e) = self.manifests.clear_all().await {
            warning!("Cannot clear manifests: {}", e);
            report.fs_errors.push(e.to_string());
        }
    }

    async fn fetch_playlists(&self, report: &mut CycleReport) -> Vec<CatalogPlaylist> {
        let mut playlists = Vec::new();

        for id in &self.playlist_ids {
            match self.catalog.fetch_playlist(id, self.max_songs).await {
                Ok(playlist) => {
                    info!(
                        "Playlist '{}': {} tracks",
                        playlist.title,
                        playlist.tracks.len()
                    );
                    for skipped in &playlist.skipped {
                        warning!("Skipping '{}': {}", skipped.title, skipped.reason);
                    }
                    report.skipped.extend(playlist.skipped.iter().cloned());
                    playlists.push(playlist);
                }
                Err(e) => {
                    warning!("Error fetching playlist {}: {}", id, e);
                    report.catalog_errors.push(format!("{}: {}", id, e));
                }
            }
        }

        playlists
    }

    /// Maps every external id to a library file, downloading what is missing.
    async fn resolve_tracks(
        &self,
        playlists: &[CatalogPlaylist],
        report: &mut CycleReport,
    ) -> HashMap<String, PathBuf> {
        let root = self.materializer.library_root().to_path_buf();
        let index = match tokio::task::spawn_blocking(move || LibraryIndex::scan(&root)).await {
            Ok(index) => index,
            Err(e) => {
                warning!("Library scan failed: {}", e);
                report.fs_errors.push(format!("library scan: {}", e));
                LibraryIndex::default()
            }
        };

        let mut paths: HashMap<String, PathBuf> = HashMap::new();
        let mut pending: Vec<Track> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for track in playlists.iter().flat_map(|pl| pl.tracks.iter()) {
            if !seen.insert(track.external_id.as_str()) {
                continue;
            }
            if !utils::is_valid_external_id(&track.external_id) {
                report.skipped.push(SkippedEntry {
                    title: track.title.clone(),
                    reason: "missing external id".to_string(),
                });
                continue;
            }
            match index.resolve(&track.external_id) {
                Some(path) => {
                    paths.insert(track.external_id.clone(), path.to_path_buf());
                    report.resolved += 1;
                }
                None => pending.push(track.clone()),
            }
        }

        if pending.is_empty() {
            return paths;
        }

        info!("Downloading {} new tracks...", pending.len());
        let pb = self.progress_bar(pending.len() as u64);
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for track in pending {
            let materializer = Arc::clone(&self.materializer);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let result = materializer.materialize(&track).await;
                (track, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            pb.inc(1);
            let (track, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warning!("Download task failed: {}", e);
                    report.fs_errors.push(format!("download task: {}", e));
                    continue;
                }
            };

            match result {
                Ok(done) => {
                    if let Some(tag_error) = done.tag_error {
                        warning!("Tagging '{}' failed: {}", track.title, tag_error);
                        report.tag_errors.push((track.external_id.clone(), tag_error));
                    }
                    pb.set_message(track.title.clone());
                    paths.insert(track.external_id, done.path);
                    report.materialized += 1;
                }
                Err(e) => {
                    pb.suspend(|| warning!("Failed to process '{}': {}", track.title, e));
                    report.materialize_errors.push((track.external_id, e));
                }
            }
        }
        pb.finish_and_clear();

        paths
    }

    // Single writer: manifests are appended in playlist order, one at a time.
    async fn build_manifests(
        &self,
        playlists: &[CatalogPlaylist],
        paths: &HashMap<String, PathBuf>,
        report: &mut CycleReport,
    ) {
        for playlist in playlists {
            let mut written = 0;
            for track in &playlist.tracks {
                let Some(path) = paths.get(&track.external_id) else {
                    continue;
                };
                match self.manifests.append(&playlist.title, path).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        warning!("Failed to add to manifest '{}': {}", playlist.title, e);
                        report
                            .manifest_errors
                            .push(format!("{}: {}", playlist.title, e));
                    }
                }
            }
            report.playlists.push(PlaylistOutcome {
                title: playlist.title.clone(),
                tracks: playlist.tracks.len(),
                written,
            });
        }
    }

    async fn evict(&self, report: &mut CycleReport) {
        if !self.reconciler.enabled() {
            return;
        }

        if !report.catalog_errors.is_empty() {
            let reason = format!(
                "{} playlist(s) could not be fetched",
                report.catalog_errors.len()
            );
            warning!("Skipping eviction: {}", reason);
            report.eviction_skipped = Some(reason);
            return;
        }

        // A track missing from its manifest would look unreferenced
        if !report.manifest_errors.is_empty() {
            let reason = format!(
                "{} manifest entr{} could not be written",
                report.manifest_errors.len(),
                if report.manifest_errors.len() == 1 { "y" } else { "ies" }
            );
            warning!("Skipping eviction: {}", reason);
            report.eviction_skipped = Some(reason);
            return;
        }

        let protected_files = match &report.protected {
            Some(state) if state.incomplete => {
                let reason = "a protected Plex playlist could not be read".to_string();
                warning!("Skipping eviction: {}", reason);
                report.eviction_skipped = Some(reason);
                return;
            }
            Some(state) => state.files(),
            None => Vec::new(),
        };

        let reconciler = self.reconciler.clone();
        match tokio::task::spawn_blocking(move || reconciler.reconcile(&protected_files)).await {
            Ok(eviction) => {
                if !eviction.is_empty() {
                    success!(
                        "Evicted {} files and {} directories",
                        eviction.deleted_files.len(),
                        eviction.deleted_dirs.len()
                    );
                }
                report.eviction = Some(eviction);
            }
            Err(e) => {
                warning!("Eviction failed: {}", e);
                report.fs_errors.push(format!("eviction: {}", e));
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.blue} {pos}/{len} {wide_msg}")
        {
            pb.set_style(style);
        }
        pb
    }
}
