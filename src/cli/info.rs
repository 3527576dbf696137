use tabled::Table;

use crate::{
    cli::{build_manifests, build_remote},
    config::Settings,
    info,
    management::{LibraryIndex, manifest_title, read_manifest},
    types::{ManifestTableRow, RemotePlaylistTableRow},
    warning,
};

/// Shows the manifests on disk, the library size and the Plex playlists.
///
/// `missing` counts manifest entries whose local file no longer exists,
/// which usually means the last eviction ran against a stale manifest.
pub async fn info(settings: &Settings) {
    let root = settings.library_dir.clone();
    match tokio::task::spawn_blocking(move || LibraryIndex::scan(&root)).await {
        Ok(index) => info!(
            "Library {} holds {} identified tracks",
            index.root().display(),
            index.len()
        ),
        Err(e) => warning!("Library scan failed: {}", e),
    }

    let manifests = build_manifests(settings);
    match manifests.list().await {
        Ok(paths) => {
            let rows: Vec<ManifestTableRow> = paths
                .iter()
                .map(|path| {
                    let entries = read_manifest(path).unwrap_or_default();
                    let missing = entries
                        .iter()
                        .filter(|entry| {
                            settings
                                .mapping
                                .to_local(entry)
                                .is_none_or(|local| !local.is_file())
                        })
                        .count();
                    ManifestTableRow {
                        playlist: manifest_title(path).unwrap_or_default(),
                        tracks: entries.len(),
                        missing,
                    }
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => warning!("Cannot list manifests: {}", e),
    }

    let remote = match build_remote(settings, false) {
        Ok(Some(remote)) => remote,
        Ok(None) => {
            info!("PLEX_TOKEN not set; skipping Plex playlists.");
            return;
        }
        Err(e) => {
            warning!("Cannot set up Plex client: {}", e);
            return;
        }
    };

    let state = remote.discover_protected().await;
    let playlists = match remote
        .client()
        .list_playlists(&settings.plex.protection_marker)
        .await
    {
        Ok(playlists) => playlists,
        Err(e) => {
            warning!("Could not list Plex playlists: {}", e);
            return;
        }
    };

    let rows: Vec<RemotePlaylistTableRow> = playlists
        .into_iter()
        .map(|pl| {
            let files = state
                .playlists
                .iter()
                .find(|p| p.rating_key == pl.rating_key)
                .map_or(0, |p| p.files.len());
            RemotePlaylistTableRow {
                title: pl.title,
                protected: if pl.protected { "yes" } else { "no" }.to_string(),
                files,
            }
        })
        .collect();
    println!("{}", Table::new(rows));
}
