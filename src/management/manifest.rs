use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::{
    management::{PathMapping, PathMappingError},
    utils, warning,
};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Mapping(#[from] PathMappingError),
}

/// Owns the playlist manifest directory.
///
/// A manifest is a `.m3u` file holding one media-server path per line.
/// Appends to the same manifest are serialized through a lock keyed by the
/// sanitized playlist name.
pub struct ManifestManager {
    dir: PathBuf,
    mapping: PathMapping,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ManifestManager {
    /// Creates a manager for the manifests in `dir`.
    ///
    /// Nothing is touched on disk until the first append or clear.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding one `.m3u` per playlist
    /// * `mapping` - Translates library paths into the lines Plex reads
    pub fn new(dir: PathBuf, mapping: PathMapping) -> Self {
        Self {
            dir,
            mapping,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path of the manifest for `playlist_name` after sanitizing.
    pub fn manifest_path(&self, playlist_name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            utils::sanitize_playlist_name(playlist_name),
            utils::MANIFEST_EXTENSION
        ))
    }

    /// Media server path of a manifest, as passed to the playlist upload.
    pub fn remote_path(&self, manifest: &Path) -> Result<String, ManifestError> {
        Ok(self.mapping.to_remote(manifest)?)
    }

    /// Deletes every manifest; run once at the start of a cycle.
    ///
    /// Individual delete failures are logged and skipped. Returns the number
    /// of manifests removed.
    pub async fn clear_all(&self) -> Result<usize, ManifestError> {
        let mut removed = 0;
        for path in self.list().await? {
            match async_fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warning!("Could not remove old manifest {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    /// Appends the media-server form of `local_path` to the playlist's manifest.
    ///
    /// Creates the manifest directory and file when missing. Duplicate lines
    /// are not filtered.
    pub async fn append(&self, playlist_name: &str, local_path: &Path) -> Result<(), ManifestError> {
        let remote = self.mapping.to_remote(local_path)?;
        let name = utils::sanitize_playlist_name(playlist_name);
        let path = self.manifest_path(&name);

        let lock = self.lock_for(&name).await;
        let _guard = lock.lock().await;

        let io_err = |source| ManifestError::Io {
            path: path.clone(),
            source,
        };

        async_fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;
        file.write_all(format!("{}\n", remote).as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }

    /// Lists the manifest files currently on disk, sorted by name.
    pub async fn list(&self) -> Result<Vec<PathBuf>, ManifestError> {
        list_manifests(&self.dir).map_err(|source| ManifestError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}

/// Lists `.m3u` files directly inside `dir`; a missing directory lists nothing.
pub fn list_manifests(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && utils::is_manifest_file(p))
        .collect();
    manifests.sort();
    Ok(manifests)
}

/// Reads the entries of one manifest, skipping blank lines and `#` comments.
pub fn read_manifest(path: &Path) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Playlist title a manifest was written for (its file stem).
pub fn manifest_title(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
}
