//! # Catalog Module
//!
//! Source of truth for playlist membership. A catalog turns a configured
//! playlist id into a title and an ordered list of [`Track`]s.
//!
//! Clients are explicit values passed down the call chain. The
//! [`CatalogResolver`] bundles a primary client (usually authenticated) with
//! an optional anonymous fallback that is tried when the primary fails.
//!
//! [`Track`]: crate::types::Track

mod ytdlp;

use std::future::Future;

pub use ytdlp::YtDlpCatalog;
pub use ytdlp::parse_playlist;

use crate::types::CatalogPlaylist;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog command failed: {0}")]
    Command(String),
    #[error("cannot decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("primary catalog failed ({primary}); fallback failed ({fallback})")]
    Exhausted { primary: String, fallback: String },
}

pub trait PlaylistCatalog: Send + Sync {
    /// Fetches at most `limit` tracks of a playlist, in playlist order.
    fn fetch_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<CatalogPlaylist, CatalogError>> + Send;
}

pub struct CatalogResolver<C> {
    primary: C,
    fallback: Option<C>,
}

impl<C: PlaylistCatalog> CatalogResolver<C> {
    /// `fallback` is only asked when `primary` fails for a playlist.
    pub fn new(primary: C, fallback: Option<C>) -> Self {
        Self { primary, fallback }
    }
}

impl<C: PlaylistCatalog> PlaylistCatalog for CatalogResolver<C> {
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<CatalogPlaylist, CatalogError> {
        let primary_err = match self.primary.fetch_playlist(playlist_id, limit).await {
            Ok(playlist) => return Ok(playlist),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        fallback
            .fetch_playlist(playlist_id, limit)
            .await
            .map_err(|fallback_err| CatalogError::Exhausted {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            })
    }
}
