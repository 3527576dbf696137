//! Configuration management for ampsassist.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Environment variables always win over
//! the file, and every knob except the media server token has a default.
//!
//! The `.env` file is looked up in:
//! - Linux: `~/.local/share/ampsassist/.env`
//! - macOS: `~/Library/Application Support/ampsassist/.env`
//! - Windows: `%LOCALAPPDATA%/ampsassist/.env`

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::management::{PathMapping, PathMappingError};

pub const DEFAULT_LOCAL_MOUNT: &str = "/app/downloads";
pub const DEFAULT_REMOTE_MOUNT: &str = "/data/music";
pub const DEFAULT_PLEX_URL: &str = "http://127.0.0.1:32400";
pub const DEFAULT_PLEX_LIBRARY: &str = "Music";
pub const DEFAULT_PROTECTION_MARKER: &str = "[saved]";
pub const DEFAULT_SETTLE_SECS: u64 = 60;
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_MAX_SONGS_PER_PLAYLIST: usize = 100;
pub const DEFAULT_NUM_WORKERS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },
    #[error("{key} ({path}) must be located under LOCAL_MOUNT ({mount})")]
    OutsideMount {
        key: &'static str,
        path: String,
        mount: String,
    },
    #[error("{first} ({first_path}) and {second} ({second_path}) must not contain each other")]
    Overlap {
        first: &'static str,
        first_path: String,
        second: &'static str,
        second_path: String,
    },
    #[error(transparent)]
    Mapping(#[from] PathMappingError),
}

/// Loads environment variables from the `.env` file in the local data directory.
///
/// The directory is created when missing. A missing `.env` file is not an
/// error; the process environment and the defaults still apply.
pub async fn load_env() -> Result<(), String> {
    let path = env_file_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn env_file_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("ampsassist/.env");
    path
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mapping: PathMapping,
    pub library_dir: PathBuf,
    pub playlists_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub playlist_ids: Vec<String>,
    pub max_songs_per_playlist: usize,
    pub num_workers: usize,
    pub rate_limit: Option<String>,
    pub audio_format: String,
    pub audio_quality: String,
    pub downloader_bin: String,
    pub catalog_cookies: Option<PathBuf>,
    pub eviction_enabled: bool,
    pub plex: PlexSettings,
    pub sync_interval: Duration,
    pub health_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlexSettings {
    pub url: String,
    /// `None` disables the whole remote phase.
    pub token: Option<String>,
    pub library: String,
    pub protection_marker: String,
    pub settle: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; used by [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let local_mount = get("LOCAL_MOUNT").unwrap_or_else(|| DEFAULT_LOCAL_MOUNT.to_string());
        let remote_mount = get("REMOTE_MOUNT").unwrap_or_else(|| DEFAULT_REMOTE_MOUNT.to_string());
        let mapping = PathMapping::new(&local_mount, &remote_mount)?;

        let mount = mapping.local_root().to_path_buf();
        let library_dir = get("LIBRARY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| mount.join("library"));
        let playlists_dir = get("PLAYLISTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| mount.join("playlists"));
        let staging_dir = get("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| mount.join(".staging"));

        ensure_under_mount("LIBRARY_DIR", &library_dir, &mapping)?;
        ensure_under_mount("PLAYLISTS_DIR", &playlists_dir, &mapping)?;
        ensure_under_mount("STAGING_DIR", &staging_dir, &mapping)?;

        // Eviction prunes the library and staging is wiped every cycle, so
        // neither may hold another managed directory.
        ensure_disjoint(("LIBRARY_DIR", &library_dir), ("PLAYLISTS_DIR", &playlists_dir))?;
        ensure_disjoint(("LIBRARY_DIR", &library_dir), ("STAGING_DIR", &staging_dir))?;
        ensure_disjoint(("PLAYLISTS_DIR", &playlists_dir), ("STAGING_DIR", &staging_dir))?;

        let settle_secs = match get("SETTLE_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "SETTLE_SECS",
                value: v,
            })?,
            None => DEFAULT_SETTLE_SECS,
        };

        Ok(Settings {
            mapping,
            library_dir,
            playlists_dir,
            staging_dir,
            playlist_ids: get("PLAYLIST_IDS")
                .map(|v| crate::utils::split_list(&v))
                .unwrap_or_default(),
            max_songs_per_playlist: positive(
                "MAX_SONGS_PER_PLAYLIST",
                get("MAX_SONGS_PER_PLAYLIST"),
                DEFAULT_MAX_SONGS_PER_PLAYLIST,
            )?,
            num_workers: positive("NUM_WORKERS", get("NUM_WORKERS"), DEFAULT_NUM_WORKERS)?,
            rate_limit: get("RATE_LIMIT"),
            audio_format: get("AUDIO_FORMAT").unwrap_or_else(|| "mp3".to_string()),
            audio_quality: get("AUDIO_QUALITY").unwrap_or_else(|| "192K".to_string()),
            downloader_bin: get("DOWNLOADER_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            catalog_cookies: get("CATALOG_COOKIES").map(PathBuf::from),
            eviction_enabled: boolean("EVICTION_ENABLED", get("EVICTION_ENABLED"), true)?,
            plex: PlexSettings {
                url: get("PLEX_URL")
                    .unwrap_or_else(|| DEFAULT_PLEX_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                token: get("PLEX_TOKEN"),
                library: get("PLEX_LIBRARY").unwrap_or_else(|| DEFAULT_PLEX_LIBRARY.to_string()),
                protection_marker: get("PROTECTION_MARKER")
                    .unwrap_or_else(|| DEFAULT_PROTECTION_MARKER.to_string()),
                settle: Duration::from_secs(settle_secs),
            },
            sync_interval: Duration::from_secs(
                60 * positive(
                    "SYNC_INTERVAL_MINUTES",
                    get("SYNC_INTERVAL_MINUTES"),
                    DEFAULT_SYNC_INTERVAL_MINUTES as usize,
                )? as u64,
            ),
            health_address: get("HEALTH_ADDRESS"),
        })
    }

    pub fn remote_enabled(&self) -> bool {
        self.plex.token.is_some()
    }
}

fn ensure_under_mount(
    key: &'static str,
    path: &Path,
    mapping: &PathMapping,
) -> Result<(), ConfigError> {
    if mapping.contains_local(path) {
        return Ok(());
    }
    Err(ConfigError::OutsideMount {
        key,
        path: path.display().to_string(),
        mount: mapping.local_root().display().to_string(),
    })
}

fn ensure_disjoint(
    (first, first_path): (&'static str, &Path),
    (second, second_path): (&'static str, &Path),
) -> Result<(), ConfigError> {
    if !first_path.starts_with(second_path) && !second_path.starts_with(first_path) {
        return Ok(());
    }
    Err(ConfigError::Overlap {
        first,
        first_path: first_path.display().to_string(),
        second,
        second_path: second_path.display().to_string(),
    })
}

fn positive(key: &'static str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}

fn boolean(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}
