use reqwest::StatusCode;

use crate::{
    plex::{PlexClient, PlexError, ensure_success},
    types::{PlaylistItemsContainer, PlaylistsContainer, RemotePlaylist},
    utils,
};

impl PlexClient {
    /// Lists all playlists; `files` is left empty.
    pub async fn list_playlists(
        &self,
        protection_marker: &str,
    ) -> Result<Vec<RemotePlaylist>, PlexError> {
        let playlists: PlaylistsContainer = self.get_json("/playlists").await?;
        Ok(playlists
            .metadata
            .into_iter()
            .map(|pl| RemotePlaylist {
                protected: utils::has_protection_marker(&pl.summary, protection_marker),
                rating_key: pl.rating_key,
                title: pl.title,
                files: Vec::new(),
            })
            .collect())
    }

    /// Remote absolute paths of every part of every item, in playlist order.
    pub async fn playlist_files(&self, rating_key: &str) -> Result<Vec<String>, PlexError> {
        let items: PlaylistItemsContainer = self
            .get_json(&format!("/playlists/{}/items", rating_key))
            .await?;
        Ok(items
            .metadata
            .into_iter()
            .flat_map(|item| item.media)
            .flat_map(|media| media.part)
            .filter_map(|part| part.file)
            .collect())
    }

    /// Deletes one playlist by its rating key.
    ///
    /// Only the playlist goes; the media files it lists are left alone.
    ///
    /// # Arguments
    ///
    /// * `rating_key` - Plex's identifier for the playlist
    ///
    /// # Returns
    ///
    /// `Ok(())` on any success status, otherwise [`PlexError::Status`] with
    /// the response body.
    pub async fn delete_playlist(&self, rating_key: &str) -> Result<(), PlexError> {
        let response = self
            .authorized(
                self.http
                    .delete(self.url(&format!("/playlists/{}", rating_key))),
            )
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Registers an `.m3u` that already exists at `path` on the Plex host.
    ///
    /// Anything but `200 OK` is an error carrying Plex's response body.
    pub async fn upload_playlist(&self, section_id: &str, path: &str) -> Result<(), PlexError> {
        let response = self
            .http
            .post(self.url("/playlists/upload"))
            .query(&[
                ("sectionID", section_id),
                ("path", path),
                ("X-Plex-Token", self.token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlexError::Status {
            status,
            body: body.trim().to_string(),
        })
    }
}
