//! M3U line writer

use crate::model::Track;
use std::io::{self, Write};

/// Writes playlist entries and diagnostic comments, one per line
///
/// In extended mode an `#EXTM3U` header is written up front and every entry
/// is preceded by an `#EXTINF` line built from the track's metadata.
pub struct M3uWriter<W: Write> {
    out: W,
    extended: bool,
    header_written: bool,
}

impl<W: Write> M3uWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            extended: false,
            header_written: false,
        }
    }

    /// Emit `#EXTM3U` / `#EXTINF` lines
    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Write one playlist entry
    pub fn write_entry(&mut self, location: &str, track: &Track) -> io::Result<()> {
        self.write_header()?;
        if self.extended {
            writeln!(self.out, "{}", extinf_line(track))?;
        }
        writeln!(self.out, "{}", location)
    }

    /// Write a `#`-prefixed comment line
    pub fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.write_header()?;
        writeln!(self.out, "# {}", text)
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.write_header()?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_header(&mut self) -> io::Result<()> {
        if self.extended && !self.header_written {
            writeln!(self.out, "#EXTM3U")?;
        }
        self.header_written = true;
        Ok(())
    }
}

/// `#EXTINF:<seconds>,<title>[,logo=<image>]`, -1 seconds when unknown
fn extinf_line(track: &Track) -> String {
    let secs = track
        .duration_ms()
        .map(|ms| (ms / 1000).to_string())
        .unwrap_or_else(|| "-1".to_string());

    let title = match (track.field("creator"), track.title()) {
        (Some(creator), Some(title)) => format!("{} - {}", creator, title),
        (None, Some(title)) => title.to_string(),
        (Some(creator), None) => creator.to_string(),
        (None, None) => String::new(),
    };

    match track.field("image") {
        Some(image) => format!("#EXTINF:{},{},logo={}", secs, title, image),
        None => format!("#EXTINF:{},{}", secs, title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(extended: bool, f: impl FnOnce(&mut M3uWriter<Vec<u8>>)) -> String {
        let mut writer = M3uWriter::new(Vec::new()).extended(extended);
        f(&mut writer);
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_plain_entries_and_comments() {
        let out = written(false, |w| {
            w.write_entry("/music/a.mp3", &Track::default()).unwrap();
            w.write_comment("Warning: title: Intro").unwrap();
        });

        assert_eq!(out, "/music/a.mp3\n# Warning: title: Intro\n");
    }

    #[test]
    fn test_extended_entries() {
        let track = Track {
            title: Some("Song".to_string()),
            creator: Some("Band".to_string()),
            duration: Some("215500".to_string()),
            ..Track::default()
        };

        let out = written(true, |w| {
            w.write_entry("/music/a.mp3", &track).unwrap();
            w.write_entry("/music/b.mp3", &Track::default()).unwrap();
        });

        assert_eq!(
            out,
            "#EXTM3U\n#EXTINF:215,Band - Song\n/music/a.mp3\n#EXTINF:-1,\n/music/b.mp3\n"
        );
    }

    #[test]
    fn test_extended_empty_playlist_still_has_header() {
        assert_eq!(written(true, |_| {}), "#EXTM3U\n");
    }
}
