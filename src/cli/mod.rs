//! # CLI Module
//!
//! Entry points for every `ampsassist` subcommand. Each function takes the
//! validated [`Settings`], wires up the components it needs and reports the
//! outcome on the console. None of them exits the process; failures are
//! printed with `warning!` and the function returns.
//!
//! ## Commands
//!
//! - [`sync`] - run one full cycle
//! - [`watch`] - run a cycle now and then on every interval
//! - [`clean`] - eviction only, optionally as a dry run
//! - [`plex`] - Plex mirror pass only, against the manifests on disk
//! - [`info`] - manifests, library size and protected Plex playlists
//!
//! ## Usage Patterns
//!
//! ```bash
//! ampsassist sync                  # one cycle
//! ampsassist sync --no-evict       # keep every file this time
//! ampsassist sync --no-remote      # leave Plex playlists untouched
//! ampsassist watch                 # long-running container mode
//! ampsassist clean --dry-run       # list what eviction would delete
//! ```

mod clean;
mod info;
mod plex;
mod sync;
mod watch;

use std::io::IsTerminal;

pub use clean::clean;
pub use info::info;
pub use plex::plex;
pub use sync::sync;
pub use watch::watch;

use tabled::Table;

use crate::{
    Res,
    catalog::{CatalogResolver, YtDlpCatalog},
    config::Settings,
    cycle::{CycleReport, SyncCycle},
    download::{Materializer, YtDlpDownloader},
    management::{ManifestManager, StorageReconciler},
    plex::{PlexClient, RemoteSync},
    types::CycleTableRow,
    warning,
};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub no_remote: bool,
    pub no_evict: bool,
    pub quiet: bool,
}

impl SyncOptions {
    pub fn show_progress(&self) -> bool {
        !self.quiet && std::io::stdout().is_terminal()
    }
}

pub type DefaultCycle = SyncCycle<CatalogResolver<YtDlpCatalog>, YtDlpDownloader>;

pub fn build_cycle(settings: &Settings, options: &SyncOptions) -> Res<DefaultCycle> {
    let catalog = match &settings.catalog_cookies {
        Some(cookies) => CatalogResolver::new(
            YtDlpCatalog::new(&settings.downloader_bin, Some(cookies.clone())),
            Some(YtDlpCatalog::new(&settings.downloader_bin, None)),
        ),
        None => CatalogResolver::new(YtDlpCatalog::new(&settings.downloader_bin, None), None),
    };

    let downloader = YtDlpDownloader::new(
        &settings.downloader_bin,
        &settings.audio_format,
        &settings.audio_quality,
        settings.rate_limit.clone(),
    );
    let materializer = Materializer::new(
        settings.library_dir.clone(),
        settings.staging_dir.clone(),
        downloader,
    );

    Ok(SyncCycle::new(
        catalog,
        materializer,
        build_manifests(settings),
        build_reconciler(settings, settings.eviction_enabled && !options.no_evict),
        build_remote(settings, options.show_progress())?,
        settings.playlist_ids.clone(),
        settings.max_songs_per_playlist,
        settings.num_workers,
    )
    .with_progress(options.show_progress())
    .with_mirror(!options.no_remote))
}

/// `None` when no Plex token is configured.
pub fn build_remote(settings: &Settings, show_progress: bool) -> Res<Option<RemoteSync>> {
    let Some(token) = &settings.plex.token else {
        return Ok(None);
    };
    let client = PlexClient::new(&settings.plex.url, token)?;
    Ok(Some(
        RemoteSync::new(
            client,
            &settings.plex.library,
            &settings.plex.protection_marker,
            settings.plex.settle,
        )
        .with_progress(show_progress),
    ))
}

pub fn build_manifests(settings: &Settings) -> ManifestManager {
    ManifestManager::new(settings.playlists_dir.clone(), settings.mapping.clone())
}

pub fn build_reconciler(settings: &Settings, enabled: bool) -> StorageReconciler {
    StorageReconciler::new(
        settings.library_dir.clone(),
        settings.playlists_dir.clone(),
        settings.mapping.clone(),
        enabled,
    )
}

pub fn print_report(report: &CycleReport) {
    let eviction = report.eviction.as_ref();
    let mirror = report.mirror.as_ref();

    let rows = vec![
        row("playlists", report.playlists.len()),
        row("tracks", report.playlists.iter().map(|p| p.tracks).sum()),
        row("already in library", report.resolved),
        row("downloaded", report.materialized),
        row("download failures", report.materialize_errors.len()),
        row("tag failures", report.tag_errors.len()),
        row("skipped entries", report.skipped.len()),
        row("evicted files", eviction.map_or(0, |e| e.deleted_files.len())),
        row("evicted directories", eviction.map_or(0, |e| e.deleted_dirs.len())),
        row("plex playlists deleted", mirror.map_or(0, |m| m.deleted.len())),
        row("plex playlists uploaded", mirror.map_or(0, |m| m.uploaded.len())),
        row("plex protected skipped", mirror.map_or(0, |m| m.skipped_protected.len())),
        row("plex errors", mirror.map_or(0, |m| m.errors.len())),
    ];
    println!("{}", Table::new(rows));

    if let Some(reason) = &report.eviction_skipped {
        warning!("Eviction skipped: {}", reason);
    }
    if let Some(reason) = mirror.and_then(|m| m.aborted.as_ref()) {
        warning!("Plex sync aborted: {}", reason);
    }
}

fn row(step: &str, count: usize) -> CycleTableRow {
    CycleTableRow {
        step: step.to_string(),
        count,
    }
}
