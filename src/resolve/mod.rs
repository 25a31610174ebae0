//! Track resolution for XSPF → M3U conversion
//!
//! A track without a location is looked up in the local library by
//! normalized title, then optionally searched for remotely. Remote matches
//! are downloaded in the background when a destination directory is set.

pub mod config;
pub mod index;
pub mod normalize;
pub mod organizer;
pub mod pipeline;

pub use config::{LinkMode, ResolveConfig};
pub use index::{FileIndex, FileIndexEntry, AUDIO_EXTENSIONS};
pub use normalize::normalize;
pub use organizer::DestinationOrganizer;
pub use pipeline::{ResolvePipeline, ResolvedLocation, RunReport, RunStats};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot read library folder {path:?}")]
    IndexRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create destination directory {path:?}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot link or copy {from:?} to {to:?}")]
    Link {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write playlist output")]
    Output(#[from] io::Error),
}
