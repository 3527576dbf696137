#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ampsassist::{
    catalog::{CatalogError, PlaylistCatalog},
    download::{Downloader, MaterializeError},
    management::{ManifestManager, PathMapping, StorageReconciler},
    types::{CatalogPlaylist, Track},
};
use axum::{
    Extension, Json, Router,
    extract::{Path as UrlPath, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const REMOTE_MOUNT: &str = "/data/music";
pub const TOKEN: &str = "secret";

/// A throwaway mount with the default `library/`, `playlists/` and
/// `.staging/` layout underneath.
pub struct TestMount {
    _dir: TempDir,
    pub root: PathBuf,
    pub library: PathBuf,
    pub playlists: PathBuf,
    pub staging: PathBuf,
    pub mapping: PathMapping,
}

impl TestMount {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let mapping = PathMapping::new(&root, REMOTE_MOUNT).unwrap();
        Self {
            library: root.join("library"),
            playlists: root.join("playlists"),
            staging: root.join(".staging"),
            root,
            mapping,
            _dir: dir,
        }
    }

    /// Creates a file below the mount root, parents included.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"audio").unwrap();
        path
    }

    pub fn remote(&self, local: &Path) -> String {
        self.mapping.to_remote(local).unwrap()
    }

    pub fn manifests(&self) -> ManifestManager {
        ManifestManager::new(self.playlists.clone(), self.mapping.clone())
    }

    pub fn reconciler(&self, enabled: bool) -> StorageReconciler {
        StorageReconciler::new(
            self.library.clone(),
            self.playlists.clone(),
            self.mapping.clone(),
            enabled,
        )
    }

    pub fn write_manifest(&self, name: &str, entries: &[String]) -> PathBuf {
        fs::create_dir_all(&self.playlists).unwrap();
        let path = self.playlists.join(format!("{}.m3u", name));
        let mut content = entries.join("\n");
        content.push('\n');
        fs::write(&path, content).unwrap();
        path
    }
}

pub fn track(id: &str, title: &str, artist: &str, album: &str) -> Track {
    Track {
        external_id: id.to_string(),
        title: title.to_string(),
        artists: vec![artist.to_string()],
        album: album.to_string(),
        playlist: String::new(),
    }
}

pub fn playlist(source_id: &str, title: &str, tracks: Vec<Track>) -> CatalogPlaylist {
    CatalogPlaylist {
        source_id: source_id.to_string(),
        title: title.to_string(),
        tracks,
        skipped: Vec::new(),
    }
}

/// In-memory catalog; playlists can be swapped between cycles.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    pub playlists: Arc<StdMutex<HashMap<String, CatalogPlaylist>>>,
    pub failing: Arc<StdMutex<HashSet<String>>>,
}

impl FakeCatalog {
    pub fn set(&self, playlist: CatalogPlaylist) {
        self.playlists
            .lock()
            .unwrap()
            .insert(playlist.source_id.clone(), playlist);
    }

    pub fn fail(&self, source_id: &str) {
        self.failing.lock().unwrap().insert(source_id.to_string());
    }
}

impl PlaylistCatalog for FakeCatalog {
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<CatalogPlaylist, CatalogError> {
        if self.failing.lock().unwrap().contains(playlist_id) {
            return Err(CatalogError::Command(format!("{} is offline", playlist_id)));
        }
        let mut playlist = self
            .playlists
            .lock()
            .unwrap()
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| CatalogError::Command(format!("unknown playlist {}", playlist_id)))?;
        playlist.tracks.truncate(limit);
        Ok(playlist)
    }
}

/// Writes placeholder bytes instead of real audio, so tagging always fails
/// while the file itself is committed. Each download takes a few
/// milliseconds and the highest number running at once is recorded.
#[derive(Clone, Default)]
pub struct FakeDownloader {
    pub calls: Arc<StdMutex<Vec<String>>>,
    pub failing: Arc<StdMutex<HashSet<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeDownloader {
    pub fn fail(&self, external_id: &str) {
        self.failing.lock().unwrap().insert(external_id.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Downloader for FakeDownloader {
    async fn download(
        &self,
        external_id: &str,
        output_stem: &Path,
    ) -> Result<PathBuf, MaterializeError> {
        self.calls.lock().unwrap().push(external_id.to_string());
        let failing = self.failing.lock().unwrap().contains(external_id);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if failing {
            return Err(MaterializeError::Download("video unavailable".to_string()));
        }
        let path = PathBuf::from(format!("{}.mp3", output_stem.display()));
        fs::write(&path, b"not really audio").map_err(|source| MaterializeError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePlaylist {
    pub rating_key: String,
    pub title: String,
    pub summary: String,
    pub files: Vec<String>,
}

impl FakePlaylist {
    pub fn new(rating_key: &str, title: &str, summary: &str, files: Vec<String>) -> Self {
        Self {
            rating_key: rating_key.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            files,
        }
    }
}

/// State of the fake Plex server, inspected by tests after a run.
#[derive(Debug, Default)]
pub struct FakePlex {
    pub sections: Vec<(String, String)>,
    pub playlists: Vec<FakePlaylist>,
    pub fail_playlist_list: bool,
    pub fail_items_for: Option<String>,
    pub upload_error: Option<(u16, String)>,
    pub refreshed: Vec<String>,
    pub deleted: Vec<String>,
    pub uploads: Vec<(String, String)>,
    next_key: u32,
}

impl FakePlex {
    pub fn with_music_section() -> Self {
        Self {
            sections: vec![("1".to_string(), "Music".to_string())],
            next_key: 1000,
            ..Default::default()
        }
    }
}

pub type SharedPlex = Arc<Mutex<FakePlex>>;
type Params = Query<HashMap<String, String>>;

fn authorized(params: &HashMap<String, String>) -> bool {
    params.get("X-Plex-Token").map(String::as_str) == Some(TOKEN)
}

async fn sections(Extension(plex): Extension<SharedPlex>, Query(params): Params) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let plex = plex.lock().await;
    let dirs: Vec<_> = plex
        .sections
        .iter()
        .map(|(key, title)| json!({ "key": key, "title": title, "type": "artist" }))
        .collect();
    Json(json!({ "MediaContainer": { "size": dirs.len(), "Directory": dirs } })).into_response()
}

async fn refresh(
    Extension(plex): Extension<SharedPlex>,
    UrlPath(id): UrlPath<String>,
    Query(params): Params,
) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    plex.lock().await.refreshed.push(id);
    StatusCode::OK.into_response()
}

async fn playlists(Extension(plex): Extension<SharedPlex>, Query(params): Params) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let plex = plex.lock().await;
    if plex.fail_playlist_list {
        return (StatusCode::INTERNAL_SERVER_ERROR, "plex is down").into_response();
    }
    let metadata: Vec<_> = plex
        .playlists
        .iter()
        .map(|pl| {
            json!({
                "ratingKey": pl.rating_key,
                "title": pl.title,
                "summary": pl.summary,
                "playlistType": "audio",
            })
        })
        .collect();
    Json(json!({ "MediaContainer": { "size": metadata.len(), "Metadata": metadata } }))
        .into_response()
}

async fn items(
    Extension(plex): Extension<SharedPlex>,
    UrlPath(key): UrlPath<String>,
    Query(params): Params,
) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let plex = plex.lock().await;
    if plex.fail_items_for.as_deref() == Some(key.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "items unavailable").into_response();
    }
    let Some(playlist) = plex.playlists.iter().find(|pl| pl.rating_key == key) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let metadata: Vec<_> = playlist
        .files
        .iter()
        .map(|file| json!({ "Media": [ { "Part": [ { "file": file } ] } ] }))
        .collect();
    Json(json!({ "MediaContainer": { "Metadata": metadata } })).into_response()
}

async fn remove(
    Extension(plex): Extension<SharedPlex>,
    UrlPath(key): UrlPath<String>,
    Query(params): Params,
) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut plex = plex.lock().await;
    plex.playlists.retain(|pl| pl.rating_key != key);
    plex.deleted.push(key);
    StatusCode::OK.into_response()
}

async fn upload(Extension(plex): Extension<SharedPlex>, Query(params): Params) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut plex = plex.lock().await;
    if let Some((status, body)) = plex.upload_error.clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, body).into_response();
    }

    let section = params.get("sectionID").cloned().unwrap_or_default();
    let path = params.get("path").cloned().unwrap_or_default();
    let title = Path::new(&path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    plex.next_key += 1;
    let rating_key = plex.next_key.to_string();
    plex.playlists
        .push(FakePlaylist::new(&rating_key, &title, "", Vec::new()));
    plex.uploads.push((section, path));
    StatusCode::OK.into_response()
}

/// Serves a minimal Plex API on an ephemeral port and returns its base URL.
pub async fn spawn_fake_plex(plex: FakePlex) -> (String, SharedPlex) {
    let shared = Arc::new(Mutex::new(plex));
    let app = Router::new()
        .route("/library/sections", get(sections))
        .route("/library/sections/{id}/refresh", get(refresh))
        .route("/playlists", get(playlists))
        .route("/playlists/upload", post(upload))
        .route("/playlists/{key}", delete(remove))
        .route("/playlists/{key}/items", get(items))
        .layer(Extension(Arc::clone(&shared)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), shared)
}
