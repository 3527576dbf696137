use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    download::{Downloader, MaterializeError, write_track_tags},
    types::Track,
    utils,
};

/// A track that now exists in the library.
#[derive(Debug)]
pub struct Materialized {
    pub path: PathBuf,
    /// Set when the file was kept but its tags could not be written.
    pub tag_error: Option<MaterializeError>,
}

pub struct Materializer<D> {
    library_root: PathBuf,
    staging_dir: PathBuf,
    downloader: D,
}

impl<D: Downloader> Materializer<D> {
    /// # Arguments
    ///
    /// * `library_root` - Committed files land in `<artist>/<album>/` below it
    /// * `staging_dir` - Scratch space, one subdirectory per external id
    /// * `downloader` - Fetches the audio for one id into staging
    pub fn new(library_root: PathBuf, staging_dir: PathBuf, downloader: D) -> Self {
        Self {
            library_root,
            staging_dir,
            downloader,
        }
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Directory a track's file belongs in: `<library>/<Artist>/<Album>`.
    pub fn target_dir(&self, track: &Track) -> PathBuf {
        self.library_root
            .join(utils::sanitize_path_component(
                track.primary_artist(),
                "Unknown Artist",
            ))
            .join(utils::sanitize_path_component(&track.album, "Unknown Album"))
    }

    /// Drops whatever an interrupted cycle left in the staging directory.
    pub async fn reset_staging(&self) -> Result<(), MaterializeError> {
        match async_fs::remove_dir_all(&self.staging_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(MaterializeError::Io {
                    path: self.staging_dir.clone(),
                    source,
                });
            }
        }
        async_fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|source| MaterializeError::Io {
                path: self.staging_dir.clone(),
                source,
            })
    }

    /// Downloads, tags and commits one track into the library.
    ///
    /// Only called for tracks the identity scan did not find. The file is
    /// moved into place only after the downloader finished; a failed tag step
    /// still commits the file and is reported through
    /// [`Materialized::tag_error`].
    pub async fn materialize(&self, track: &Track) -> Result<Materialized, MaterializeError> {
        if !utils::is_valid_external_id(&track.external_id) {
            return Err(MaterializeError::MissingId {
                title: track.title.clone(),
            });
        }

        let stem = utils::track_file_stem(&track.title, &track.external_id);
        let staging = self.staging_dir.join(&track.external_id);
        create_dir(&staging).await?;

        let downloaded = match self
            .downloader
            .download(&track.external_id, &staging.join(&stem))
            .await
        {
            Ok(path) => path,
            Err(e) => {
                let _ = async_fs::remove_dir_all(&staging).await;
                return Err(e);
            }
        };

        let tag_path = downloaded.clone();
        let tag_track = track.clone();
        let tag_error =
            match tokio::task::spawn_blocking(move || write_track_tags(&tag_path, &tag_track)).await
            {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(e) => Some(MaterializeError::Tag(format!("tag task failed: {}", e))),
            };

        let target_dir = self.target_dir(track);
        create_dir(&target_dir).await?;

        let file_name = match downloaded.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };
        let target = target_dir.join(file_name);
        commit(&downloaded, &target).await?;

        let _ = async_fs::remove_dir_all(&staging).await;

        Ok(Materialized {
            path: target,
            tag_error,
        })
    }
}

async fn create_dir(path: &Path) -> Result<(), MaterializeError> {
    async_fs::create_dir_all(path)
        .await
        .map_err(|source| MaterializeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

// Rename when possible; staging may sit on another filesystem.
async fn commit(from: &Path, to: &Path) -> Result<(), MaterializeError> {
    if async_fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    if let Err(source) = async_fs::copy(from, to).await {
        // A half-copied file would carry the id marker and count as resolved.
        let _ = async_fs::remove_file(to).await;
        return Err(MaterializeError::Io {
            path: to.to_path_buf(),
            source,
        });
    }
    let _ = async_fs::remove_file(from).await;
    Ok(())
}
