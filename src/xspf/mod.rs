//! XSPF ("spiff") playlist reading and writing
//!
//! Only the per-track tags this tool understands are kept:
//! location, title, creator, album, annotation, image and duration.

mod reader;
mod writer;

pub use reader::{parse_xspf, read_xspf};
pub use writer::write_xspf;

/// XSPF version 1 namespace
pub const XSPF_NS: &str = "http://xspf.org/ns/0/";
