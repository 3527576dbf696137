//! # Plex Integration Module
//!
//! HTTP client for the parts of the Plex Media Server API the mirror needs,
//! plus the per-cycle remote sync protocol built on top of it.
//!
//! ## API Coverage
//!
//! - `GET /library/sections` - resolve the music section id by title
//! - `GET /library/sections/{id}/refresh` - trigger a rescan (fire and forget)
//! - `GET /playlists` - list playlists with their `summary`
//! - `GET /playlists/{ratingKey}/items` - member files of a playlist
//! - `DELETE /playlists/{ratingKey}` - remove a playlist
//! - `POST /playlists/upload` - register an `.m3u` already on the server's disk
//!
//! Every request carries the token as the `X-Plex-Token` query parameter and
//! asks for JSON. A playlist counts as protected when its summary contains
//! the configured marker, compared case-insensitively.
//!
//! ## Consistency
//!
//! Plex indexes new files asynchronously and exposes no completion signal
//! for a rescan. [`RemoteSync`] therefore waits a fixed settle interval
//! after triggering the scan. Uploads issued before indexing finished can
//! reference files Plex does not know yet; those entries show up after the
//! next cycle's upload.

mod playlists;
mod sections;
mod sync;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, header::ACCEPT};
use serde::de::DeserializeOwned;

pub use sync::MirrorReport;
pub use sync::ProtectedState;
pub use sync::RemoteSync;

use crate::types::PlexResponse;

#[derive(Debug, thiserror::Error)]
pub enum PlexError {
    #[error("request to Plex failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Plex answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone)]
pub struct PlexClient {
    http: Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    /// Creates a client for one Plex server.
    ///
    /// Every request carries `token` as the `X-Plex-Token` query parameter
    /// and times out after 30 seconds.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server address such as `http://plex:32400`; a trailing
    ///   slash is dropped
    /// * `token` - Plex authentication token
    ///
    /// # Returns
    ///
    /// The client, or [`PlexError::Http`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str) -> Result<Self, PlexError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query(&[("X-Plex-Token", self.token.as_str())])
            .header(ACCEPT, "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlexError> {
        let response = self
            .authorized(self.http.get(self.url(path)))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.json::<PlexResponse<T>>().await?;
        Ok(body.media_container)
    }
}

async fn ensure_success(response: Response) -> Result<Response, PlexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlexError::Status {
        status,
        body: body.trim().to_string(),
    })
}
