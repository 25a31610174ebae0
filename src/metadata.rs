//! Audio file tag reading for M3U entries

use crate::model::Track;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;

/// Source of per-file track metadata
pub trait MetadataReader {
    /// Read the tags of an audio file
    ///
    /// Never fails: a missing or unreadable file yields a track that only
    /// carries its location.
    fn read_tags(&self, path: &Path) -> Track;
}

/// Tag reader backed by lofty
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyReader;

impl LoftyReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for LoftyReader {
    fn read_tags(&self, path: &Path) -> Track {
        let location = path.to_string_lossy().into_owned();

        if !path.exists() {
            return Track::with_location(location);
        }

        let tagged_file = match Probe::open(path).and_then(|probe| probe.read()) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("No readable tags in {:?}: {}", path, e);
                return Track::with_location(location);
            }
        };

        let mut track = Track::with_location(location);

        let duration = tagged_file.properties().duration();
        if !duration.is_zero() {
            track.duration = Some(duration.as_millis().to_string());
        }

        if let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        {
            track.title = joined(tag, &ItemKey::TrackTitle);
            track.creator = joined(tag, &ItemKey::TrackArtist);
            track.album = joined(tag, &ItemKey::AlbumTitle);
            track.annotation = joined(tag, &ItemKey::Comment);
        }

        track
    }
}

/// All values of a tag item joined with "; "
fn joined(tag: &lofty::tag::Tag, key: &ItemKey) -> Option<String> {
    let values: Vec<&str> = tag
        .get_strings(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_keeps_location() {
        let track = LoftyReader::new().read_tags(Path::new("/nonexistent/song.mp3"));
        assert_eq!(track, Track::with_location("/nonexistent/song.mp3"));
    }

    #[test]
    fn test_unreadable_file_keeps_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.mp3");
        fs::write(&path, b"not really audio").unwrap();

        let track = LoftyReader::new().read_tags(&path);
        assert_eq!(track.location(), Some(path.to_string_lossy().as_ref()));
        assert!(track.title.is_none());
    }
}
