//! Background downloads of remote search results
//!
//! Each download runs as an independent external process. The pool only
//! tracks whether a process is still running; a failed download leaves a
//! missing or partial file and is reported in the drain summary.

mod fetcher;
mod pool;

pub use fetcher::{CommandFetcher, FetchHandle, Fetcher, JobOutcome};
pub use pool::{DownloadPool, DrainSummary, FailedDownload, JobId, DEFAULT_POLL_INTERVAL};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to start `{program}` for {url}")]
    Spawn {
        program: String,
        url: String,
        #[source]
        source: std::io::Error,
    },
}
