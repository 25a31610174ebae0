//! Resolution configuration

use crate::download::DEFAULT_POLL_INTERVAL;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for resolving an XSPF playlist into M3U
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Library folder searched for local matches
    pub library: PathBuf,

    /// Destination directory for linked and downloaded files
    pub outdir: Option<PathBuf>,

    /// Whether tracks missing locally are searched remotely
    pub remote_search: bool,

    /// How local matches are placed into the destination directory
    pub link_mode: LinkMode,

    /// Pause between download sweeps at the end of the run
    pub poll_interval: Duration,

    /// Write `#EXTM3U` / `#EXTINF` lines
    pub extended: bool,
}

/// What happens to a local match when a destination directory is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Hard-link into the destination, copying when linking fails
    #[default]
    HardLink,

    /// Always copy into the destination
    Copy,

    /// Leave the file where it is and list its library path
    Reference,
}

impl ResolveConfig {
    /// Create a new configuration for the given library folder
    pub fn new(library: PathBuf) -> Self {
        Self {
            library,
            outdir: None,
            remote_search: false,
            link_mode: LinkMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            extended: false,
        }
    }

    /// Set the destination directory
    pub fn with_outdir(mut self, outdir: PathBuf) -> Self {
        self.outdir = Some(outdir);
        self
    }

    /// Enable or disable remote search
    pub fn with_remote_search(mut self, enable: bool) -> Self {
        self.remote_search = enable;
        self
    }

    /// Set how local matches are placed into the destination directory
    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    /// Set the download sweep interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enable extended M3U output
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}
