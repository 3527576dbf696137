use crate::{
    plex::{PlexClient, PlexError, ensure_success},
    types::SectionsContainer,
};

impl PlexClient {
    /// Resolves a library section id by its title.
    pub async fn section_id(&self, title: &str) -> Result<Option<String>, PlexError> {
        let sections: SectionsContainer = self.get_json("/library/sections").await?;
        Ok(sections
            .directory
            .into_iter()
            .find(|section| section.title == title)
            .map(|section| section.key))
    }

    /// Asks Plex to rescan a section. Plex acknowledges the request only;
    /// there is no way to learn when the scan is done.
    pub async fn refresh_section(&self, section_id: &str) -> Result<(), PlexError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("/library/sections/{}/refresh", section_id))),
            )
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
