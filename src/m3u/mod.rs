//! M3U playlist reading and writing
//!
//! Plain M3U is one location per line. Extended M3U adds `#EXTINF`
//! lines carrying a duration, a title and optionally a logo URL.

mod reader;
mod writer;

pub use reader::{parse_m3u, read_m3u};
pub use writer::M3uWriter;
