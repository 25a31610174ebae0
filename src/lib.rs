//! xspfm3u - convert playlists between XSPF and M3U
//!
//! XSPF → M3U resolves tracks that have no location against a local music
//! folder and, optionally, a remote search whose results are downloaded in
//! the background. M3U → XSPF reads each file's tags.

pub mod download;
pub mod m3u;
pub mod metadata;
pub mod model;
pub mod resolve;
pub mod search;
pub mod xspf;

pub use resolve::{ResolveConfig, ResolvePipeline};
