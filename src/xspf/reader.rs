//! XSPF playlist parser

use super::XSPF_NS;
use crate::model::{Playlist, Track, FIELD_ORDER};
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse an XSPF file into a playlist
pub fn parse_xspf(path: &Path) -> Result<Playlist> {
    let file =
        File::open(path).with_context(|| format!("Failed to open XSPF playlist: {:?}", path))?;

    let playlist = read_xspf(BufReader::new(file))
        .with_context(|| format!("Failed to parse XSPF playlist: {:?}", path))?;

    log::info!("Parsed {} tracks from {:?}", playlist.len(), path);
    Ok(playlist)
}

/// Parse XSPF from any buffered reader
///
/// Only elements in the XSPF namespace are read. Any prefix may be bound to
/// it (`<xspf:track>`), and elements from other namespaces are skipped
/// together with their content.
pub fn read_xspf<R: BufRead>(source: R) -> Result<Playlist> {
    let mut reader = NsReader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut playlist = Playlist::new();
    // Local names of open elements, `None` for foreign ones
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut current_track: Option<Track> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_resolved_event_into(&mut buf)
            .map(|(ns, event)| (in_xspf_ns(&ns), event));

        match event {
            Ok((is_xspf, Event::Start(e))) => {
                let name =
                    is_xspf.then(|| String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                if name.as_deref() == Some("track") && in_track_list(&stack) {
                    current_track = Some(Track::default());
                }
                text.clear();
                stack.push(name);
            }

            Ok((is_xspf, Event::Empty(e))) => {
                // <track/> is a track with no fields, <title/> an empty field
                if is_xspf && e.local_name().as_ref() == b"track" && in_track_list(&stack) {
                    playlist.add_track(Track::default());
                }
            }

            Ok((_, Event::Text(e))) => {
                let chunk = e
                    .unescape()
                    .with_context(|| format!("Bad text at byte {}", reader.buffer_position()))?;
                text.push_str(&chunk);
            }

            Ok((_, Event::CData(e))) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }

            Ok((_, Event::End(_))) => {
                let name = stack.pop().flatten().unwrap_or_default();

                if name == "track" {
                    if let Some(track) = current_track.take() {
                        playlist.add_track(track);
                    }
                } else if let Some(ref mut track) = current_track {
                    // Only direct children of <track> are track fields
                    if parent_is(&stack, "track") && FIELD_ORDER.contains(&name.as_str()) {
                        track.set_field(&name, text.trim().to_string());
                    }
                } else if name == "title" && stack.len() == 1 && stack[0].is_some() {
                    playlist.title = Some(text.trim().to_string());
                }
                text.clear();
            }

            Ok((_, Event::Eof)) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("XML parsing error at position {}", reader.buffer_position())
                });
            }
            _ => {}
        }

        buf.clear();
    }

    Ok(playlist)
}

fn in_xspf_ns(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == XSPF_NS.as_bytes())
}

fn parent_is(stack: &[Option<String>], name: &str) -> bool {
    stack.last().and_then(|n| n.as_deref()) == Some(name)
}

fn in_track_list(stack: &[Option<String>]) -> bool {
    parent_is(stack, "trackList")
}
