//! # Download Module
//!
//! Turns catalog tracks into tagged audio files inside the library.
//!
//! The actual fetch and encode is delegated to an external tool behind the
//! [`Downloader`] trait; [`YtDlpDownloader`] drives `yt-dlp`. The
//! [`Materializer`] wraps a downloader with the library conventions:
//!
//! ```text
//! <library>/<Artist>/<Album>/<Title> [<external_id>].<ext>
//! ```
//!
//! Downloads land in a staging directory first and are only moved into the
//! library once the encode finished and the tag step ran, so an interrupted
//! download is never picked up by the identity scan.

mod materialize;
mod tags;
mod ytdlp;

use std::{future::Future, io, path::Path, path::PathBuf};

pub use materialize::Materialized;
pub use materialize::Materializer;
pub use tags::write_track_tags;
pub use ytdlp::YtDlpDownloader;

#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("track '{title}' has no usable external id")]
    MissingId { title: String },
    #[error("download failed: {0}")]
    Download(String),
    #[error("tagging failed: {0}")]
    Tag(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// External download + encode collaborator.
///
/// `output_stem` is the destination path without extension; the downloader
/// picks the extension and returns the path of the finished file.
pub trait Downloader: Send + Sync {
    fn download(
        &self,
        external_id: &str,
        output_stem: &Path,
    ) -> impl Future<Output = Result<PathBuf, MaterializeError>> + Send;
}
