//! Format-independent playlist data model
//!
//! Both the XSPF and M3U sides read into and write from these types.

mod playlist;
mod track;

pub use playlist::Playlist;
pub use track::{Track, FIELD_ORDER};
