//! M3U / extended M3U parser

use crate::metadata::MetadataReader;
use crate::model::{Playlist, Track};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `#EXTINF:<seconds>,<title>[,logo=<url>]`
fn extinf_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^#EXTINF:\s*(-?\d+)?[^,]*,(.*?)(?:,(?:\s*logo=(.*))?)?$")
            .expect("EXTINF pattern is valid")
    })
}

/// Parse an M3U file
///
/// Relative entries are resolved against the playlist's own directory.
pub fn parse_m3u<M: MetadataReader + ?Sized>(path: &Path, tags: &M) -> Result<Playlist> {
    let file = File::open(path).with_context(|| format!("Failed to open M3U playlist: {:?}", path))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let playlist = read_m3u(BufReader::new(file), base_dir, tags)
        .with_context(|| format!("Failed to read M3U playlist: {:?}", path))?;

    log::info!("Parsed {} entries from {:?}", playlist.len(), path);
    Ok(playlist)
}

/// Parse M3U lines from any buffered reader
pub fn read_m3u<R: BufRead, M: MetadataReader + ?Sized>(
    source: R,
    base_dir: &Path,
    tags: &M,
) -> Result<Playlist> {
    let mut playlist = Playlist::new();
    let mut extended = false;
    let mut pending: Option<Track> = None;

    for line in source.lines() {
        let line = line?;
        let line = line.trim_end();

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("#EXTM3U") {
            extended = true;
        } else if line
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("#EXTINF"))
        {
            pending = parse_extinf(line);
            if pending.is_none() {
                log::warn!("Ignoring malformed EXTINF line: {}", line);
            }
        } else if line.starts_with('#') {
            continue;
        } else {
            // EXTINF data belongs to the entry right after it, and only
            // counts in extended playlists
            let info = pending.take().filter(|_| extended);

            if line.starts_with("http") {
                let mut track = info.unwrap_or_default();
                track.location = Some(line.to_string());
                playlist.add_track(track);
            } else {
                let path = local_path(line, base_dir);
                let mut track = tags.read_tags(&path);

                // EXTINF data only fills what the file's own tags leave empty
                if let Some(info) = info {
                    track.title = track.title.or(info.title);
                    track.image = track.image.or(info.image);
                    track.duration = track.duration.or(info.duration);
                }
                playlist.add_track(track);
            }
        }
    }

    Ok(playlist)
}

/// Turn an `#EXTINF` line into a partially filled track
fn parse_extinf(line: &str) -> Option<Track> {
    let caps = extinf_pattern().captures(line)?;

    let duration = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|secs| *secs >= 0)
        .map(|secs| (secs * 1000).to_string());

    let title = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let image = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|i| !i.is_empty());

    Some(Track {
        title,
        image,
        duration,
        ..Track::default()
    })
}

/// Resolve a playlist line to a filesystem path
fn local_path(line: &str, base_dir: &Path) -> PathBuf {
    let decoded = match line.strip_prefix("file://") {
        Some(uri) => urlencoding::decode(uri)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| uri.to_string()),
        None => line.to_string(),
    };

    let path = PathBuf::from(decoded);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
