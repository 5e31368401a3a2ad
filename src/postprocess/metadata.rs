// Metadata normalizer - strips the artist from the title, backfills album

use std::path::Path;

use id3::{Tag, TagLike, Version};
use regex::Regex;

use crate::downloader::errors::DownloadError;

/// Remove the first `<artist><ws>...<ws>` run from `title`.
///
/// "Artist - Song (Official Video)" with artist "Artist" becomes
/// "Song (Official Video)". The artist is matched literally.
pub fn strip_artist(title: &str, artist: &str) -> Result<String, DownloadError> {
    let pattern = Regex::new(&format!(r"{}\s.*?\s", regex::escape(artist)))?;
    Ok(pattern.replacen(title, 1, "").into_owned())
}

/// Clean the title tag of `mp3` and backfill a missing album from it.
///
/// Returns the cleaned title and the artist. Title and artist tags are
/// required.
pub fn cleanup_metadata(mp3: &Path) -> Result<(String, String), DownloadError> {
    let mut tag = Tag::read_from_path(mp3)?;

    let title = tag.title().ok_or(DownloadError::MissingTag("title"))?;
    let artist = tag
        .artist()
        .ok_or(DownloadError::MissingTag("artist"))?
        .to_string();

    let cleaned = strip_artist(title, &artist)?;
    tag.set_title(cleaned.as_str());
    if tag.album().is_none() {
        tag.set_album(cleaned.as_str());
    }
    tag.write_to_path(mp3, Version::Id3v23)?;

    tracing::debug!("Metadata of {} cleaned: {:?} by {:?}", mp3.display(), cleaned, artist);
    Ok((cleaned, artist))
}
