use std::path::Path;

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;

use crate::{download::MaterializeError, types::Track};

/// Writes title, artist, album artist and album into the file's primary tag.
///
/// Values the downloader may have written are overwritten. Synchronous;
/// async callers go through `spawn_blocking`.
pub fn write_track_tags(path: &Path, track: &Track) -> Result<(), MaterializeError> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| MaterializeError::Tag(format!("failed to open {}: {}", path.display(), e)))?
        .read()
        .map_err(|e| MaterializeError::Tag(format!("failed to read {}: {}", path.display(), e)))?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
        MaterializeError::Tag(format!("{} does not support {:?} tags", path.display(), tag_type))
    })?;

    tag.set_title(track.title.clone());
    tag.set_artist(track.artist_credit());
    tag.insert_text(ItemKey::AlbumArtist, track.primary_artist().to_string());
    tag.set_album(track.album.clone());

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| MaterializeError::Tag(format!("failed to write {}: {}", path.display(), e)))
}
