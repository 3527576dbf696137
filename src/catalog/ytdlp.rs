use std::{path::PathBuf, process::Stdio};

use tokio::process::Command;

use crate::{
    catalog::{CatalogError, PlaylistCatalog},
    types::{CatalogPlaylist, SkippedEntry, Track, YtDlpEntry, YtDlpPlaylist},
    utils,
};

pub const PLAYLIST_URL: &str = "https://music.youtube.com/playlist?list=";

/// Reads playlist metadata through `yt-dlp --flat-playlist`.
///
/// With a cookies file the requests are made as the account owning the
/// cookies, which is what private and personalised mixes need.
#[derive(Debug, Clone)]
pub struct YtDlpCatalog {
    bin: String,
    cookies: Option<PathBuf>,
}

impl YtDlpCatalog {
    pub fn new(bin: impl Into<String>, cookies: Option<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            cookies,
        }
    }

    pub fn playlist_url(playlist_id: &str) -> String {
        if playlist_id.starts_with("http://") || playlist_id.starts_with("https://") {
            return playlist_id.to_string();
        }
        format!("{}{}", PLAYLIST_URL, playlist_id)
    }
}

impl PlaylistCatalog for YtDlpCatalog {
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<CatalogPlaylist, CatalogError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg("--playlist-end")
            .arg(limit.to_string());
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(Self::playlist_url(playlist_id))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| CatalogError::Command(format!("cannot run {}: {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CatalogError::Command(format!(
                "{} exited with {} for {}: {}",
                self.bin,
                output.status,
                playlist_id,
                stderr.trim()
            )));
        }

        parse_playlist(playlist_id, &String::from_utf8_lossy(&output.stdout), limit)
    }
}

/// Maps the JSON printed by `yt-dlp -J` onto a [`CatalogPlaylist`].
///
/// Entries without a usable id are reported in `skipped` and never become
/// tracks. The playlist title doubles as the album when an entry has none.
pub fn parse_playlist(
    playlist_id: &str,
    json: &str,
    limit: usize,
) -> Result<CatalogPlaylist, CatalogError> {
    let raw: YtDlpPlaylist = serde_json::from_str(json)?;
    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| playlist_id.to_string());

    let mut tracks = Vec::new();
    let mut skipped = Vec::new();

    for entry in raw.entries.into_iter().take(limit) {
        let Some(entry) = entry else {
            skipped.push(SkippedEntry {
                title: "<unavailable>".to_string(),
                reason: "entry is unavailable".to_string(),
            });
            continue;
        };

        let entry_title = entry
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Title".to_string());
        match entry.id.as_deref() {
            Some(id) if utils::is_valid_external_id(id) => {
                tracks.push(Track {
                    external_id: id.to_string(),
                    title: entry_title,
                    artists: entry_artists(&entry),
                    album: entry
                        .album
                        .clone()
                        .filter(|a| !a.trim().is_empty())
                        .unwrap_or_else(|| title.clone()),
                    playlist: title.clone(),
                });
            }
            Some(id) => skipped.push(SkippedEntry {
                title: entry_title,
                reason: format!("unusable external id '{}'", id),
            }),
            None => skipped.push(SkippedEntry {
                title: entry_title,
                reason: "missing external id".to_string(),
            }),
        }
    }

    Ok(CatalogPlaylist {
        source_id: playlist_id.to_string(),
        title,
        tracks,
        skipped,
    })
}

fn entry_artists(entry: &YtDlpEntry) -> Vec<String> {
    if let Some(artists) = &entry.artists {
        let artists: Vec<String> = artists
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !artists.is_empty() {
            return artists;
        }
    }

    if let Some(artist) = entry.artist.as_deref().filter(|a| !a.trim().is_empty()) {
        return utils::split_list(artist);
    }

    entry
        .channel
        .as_deref()
        .or(entry.uploader.as_deref())
        .map(|name| name.trim_end_matches(" - Topic").trim().to_string())
        .filter(|name| !name.is_empty())
        .into_iter()
        .collect()
}
