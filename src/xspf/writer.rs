//! XSPF playlist writer

use super::XSPF_NS;
use crate::model::Playlist;
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Write a playlist as an XSPF document
///
/// Track fields are written in sorted key order; empty fields are omitted.
pub fn write_xspf<W: Write>(playlist: &Playlist, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let root = BytesStart::new("playlist").with_attributes([("version", "1"), ("xmlns", XSPF_NS)]);
    writer
        .write_event(Event::Start(root))
        .context("Failed to write playlist element")?;

    if let Some(title) = playlist.title.as_deref().filter(|t| !t.is_empty()) {
        writer
            .create_element("title")
            .write_text_content(BytesText::new(title))
            .context("Failed to write playlist title")?;
    }

    writer
        .write_event(Event::Start(BytesStart::new("trackList")))
        .context("Failed to write trackList")?;

    for track in &playlist.tracks {
        writer
            .write_event(Event::Start(BytesStart::new("track")))
            .context("Failed to write track")?;

        let mut fields: Vec<_> = track.fields().collect();
        fields.sort_by_key(|(key, _)| *key);

        for (key, value) in fields {
            writer
                .create_element(key)
                .write_text_content(BytesText::new(value))
                .with_context(|| format!("Failed to write <{}>", key))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("track")))
            .context("Failed to write track")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("trackList")))
        .context("Failed to write trackList")?;
    writer
        .write_event(Event::End(BytesEnd::new("playlist")))
        .context("Failed to write playlist element")?;

    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;
    use crate::xspf::read_xspf;

    fn sample() -> Playlist {
        let mut playlist = Playlist::new();
        playlist.add_track(Track {
            location: Some("/music/rock & roll.mp3".to_string()),
            title: Some("Rock <Live>".to_string()),
            creator: Some("Band".to_string()),
            ..Track::default()
        });
        playlist.add_track(Track::with_location("http://radio.example/stream"));
        playlist
    }

    #[test]
    fn test_output_shape() {
        let mut out = Vec::new();
        write_xspf(&sample(), &mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<playlist version=\"1\" xmlns=\"http://xspf.org/ns/0/\">"));
        assert!(xml.contains("<title>Rock &lt;Live&gt;</title>"));
        assert!(xml.contains("rock &amp; roll.mp3"));

        // sorted keys: creator before location before title
        let creator = xml.find("<creator>").unwrap();
        let location = xml.find("<location>/music").unwrap();
        let title = xml.find("<title>Rock").unwrap();
        assert!(creator < location && location < title);
    }

    #[test]
    fn test_reader_accepts_written_document() {
        let mut out = Vec::new();
        write_xspf(&sample(), &mut out).unwrap();

        let parsed = read_xspf(out.as_slice()).unwrap();
        assert_eq!(parsed, sample());
    }
}
