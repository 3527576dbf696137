use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub external_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub playlist: String,
}

impl Track {
    pub fn primary_artist(&self) -> &str {
        self.artists
            .first()
            .map(String::as_str)
            .unwrap_or("Unknown Artist")
    }

    pub fn artist_credit(&self) -> String {
        if self.artists.is_empty() {
            return self.primary_artist().to_string();
        }
        self.artists.join(", ")
    }
}

/// A catalog entry that could not be turned into a [`Track`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    pub source_id: String,
    pub title: String,
    pub tracks: Vec<Track>,
    pub skipped: Vec<SkippedEntry>,
}

// `yt-dlp --flat-playlist -J` output; unavailable entries come back as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YtDlpPlaylist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<Option<YtDlpEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YtDlpEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<String>>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
}

/// The media server's view of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    pub rating_key: String,
    pub title: String,
    pub protected: bool,
    /// Remote absolute file paths; only fetched for protected playlists.
    pub files: Vec<String>,
}

// Plex answers every JSON request wrapped in a `MediaContainer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    pub directory: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistsContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlaylistMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistItemsContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(rename = "Media", default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "Part", default)]
    pub part: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub file: Option<String>,
}

/// Condensed outcome of one sync cycle, served by the health endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub playlists: usize,
    pub tracks: usize,
    pub resolved: usize,
    pub materialized: usize,
    pub failed: usize,
    pub evicted_files: usize,
    pub uploaded: usize,
    pub remote_errors: usize,
}

#[derive(Tabled)]
pub struct ManifestTableRow {
    pub playlist: String,
    pub tracks: usize,
    pub missing: usize,
}

#[derive(Tabled)]
pub struct RemotePlaylistTableRow {
    pub title: String,
    pub protected: String,
    pub files: usize,
}

#[derive(Tabled)]
pub struct CycleTableRow {
    pub step: String,
    pub count: usize,
}
