//! Per-track resolution and M3U emission

use super::config::{LinkMode, ResolveConfig};
use super::index::FileIndex;
use super::organizer::DestinationOrganizer;
use super::ResolveError;
use crate::download::{DownloadPool, DrainSummary, Fetcher};
use crate::m3u::M3uWriter;
use crate::model::{Playlist, Track};
use crate::search::RemoteSearch;
use std::io::Write;
use std::path::PathBuf;

/// Where a track ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    /// The playlist already carried a location
    Explicit(String),

    /// Matched file in the library, listed in place
    LocalPath(PathBuf),

    /// Matched file linked or copied into the destination directory
    HardLinkedPath(PathBuf),

    /// Remote media URL, listed directly
    RemoteUrl(String),

    /// Destination path of a download that is still running
    PendingDownloadPath(PathBuf),

    Unresolved,
}

impl ResolvedLocation {
    /// Playlist line for this location, `None` when unresolved
    pub fn as_entry(&self) -> Option<String> {
        match self {
            ResolvedLocation::Explicit(location) | ResolvedLocation::RemoteUrl(location) => {
                Some(location.clone())
            }
            ResolvedLocation::LocalPath(path)
            | ResolvedLocation::HardLinkedPath(path)
            | ResolvedLocation::PendingDownloadPath(path) => {
                Some(path.to_string_lossy().into_owned())
            }
            ResolvedLocation::Unresolved => None,
        }
    }
}

/// Per-kind counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub explicit: usize,
    pub local: usize,
    pub linked: usize,
    pub remote: usize,
    pub pending: usize,
    pub unresolved: usize,
}

impl RunStats {
    fn record(&mut self, location: &ResolvedLocation) {
        match location {
            ResolvedLocation::Explicit(_) => self.explicit += 1,
            ResolvedLocation::LocalPath(_) => self.local += 1,
            ResolvedLocation::HardLinkedPath(_) => self.linked += 1,
            ResolvedLocation::RemoteUrl(_) => self.remote += 1,
            ResolvedLocation::PendingDownloadPath(_) => self.pending += 1,
            ResolvedLocation::Unresolved => self.unresolved += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.explicit + self.local + self.linked + self.remote + self.pending + self.unresolved
    }
}

/// Outcome of a complete export
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub downloads: DrainSummary,
}

/// Resolves XSPF tracks and writes them as M3U
pub struct ResolvePipeline<S: RemoteSearch> {
    config: ResolveConfig,
    index: FileIndex,
    organizer: Option<DestinationOrganizer>,
    search: S,
}

impl<S: RemoteSearch> ResolvePipeline<S> {
    /// Create a pipeline; creates the destination directory if one is set
    pub fn new(config: ResolveConfig, index: FileIndex, search: S) -> Result<Self, ResolveError> {
        let organizer = config.outdir.clone().map(DestinationOrganizer::new);
        if let Some(ref organizer) = organizer {
            organizer.init()?;
        }

        Ok(Self {
            config,
            index,
            organizer,
            search,
        })
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve, write and download a whole playlist
    ///
    /// Downloads started along the way are waited for before returning. If
    /// writing fails, running downloads are terminated first.
    pub fn export<W: Write>(
        &self,
        playlist: &Playlist,
        out: W,
        fetcher: impl Fetcher + 'static,
    ) -> Result<RunReport, ResolveError> {
        let mut writer = M3uWriter::new(out).extended(self.config.extended);

        let (stats, downloads) =
            DownloadPool::scope(fetcher, self.config.poll_interval, |pool| {
                self.run(playlist, &mut writer, Some(pool))
            })?;

        writer.finish()?;

        log::info!(
            "Resolved {} tracks: {} explicit, {} local, {} linked, {} remote, {} downloading, {} unresolved",
            stats.total(),
            stats.explicit,
            stats.local,
            stats.linked,
            stats.remote,
            stats.pending,
            stats.unresolved
        );

        Ok(RunReport { stats, downloads })
    }

    /// Resolve every track in order, writing one line per track
    ///
    /// Unresolved tracks produce a `# Warning: ...` comment instead of an entry.
    pub fn run<W: Write>(
        &self,
        playlist: &Playlist,
        writer: &mut M3uWriter<W>,
        pool: Option<&DownloadPool>,
    ) -> Result<RunStats, ResolveError> {
        let mut stats = RunStats::default();

        for (i, track) in playlist.tracks.iter().enumerate() {
            log::debug!(
                "[{}/{}] Resolving: {}",
                i + 1,
                playlist.len(),
                track.title().unwrap_or("<untitled>")
            );

            let location = self.resolve(track, pool);
            stats.record(&location);

            match location.as_entry() {
                Some(entry) => writer.write_entry(&entry, track)?,
                None => {
                    log::warn!("Unresolved track: {}", track.describe());
                    writer.write_comment(&format!("Warning: {}", track.describe()))?;
                }
            }
        }

        Ok(stats)
    }

    /// Decide where a single track comes from
    ///
    /// Order: explicit location, local library match, remote search.
    pub fn resolve(&self, track: &Track, pool: Option<&DownloadPool>) -> ResolvedLocation {
        if let Some(location) = track.location() {
            return ResolvedLocation::Explicit(location.to_string());
        }

        if let Some(found) = self.resolve_local(track) {
            return found;
        }

        if self.config.remote_search {
            if let Some(found) = self.resolve_remote(track, pool) {
                return found;
            }
        }

        ResolvedLocation::Unresolved
    }

    fn resolve_local(&self, track: &Track) -> Option<ResolvedLocation> {
        let title = track.title()?;
        let entry = self.index.match_local(title, &track.context_fields())?;
        let path = entry.path();
        log::debug!("Local match for {:?}: {:?}", title, path);

        let organizer = match self.organizer {
            Some(ref organizer) if self.config.link_mode != LinkMode::Reference => organizer,
            _ => return Some(ResolvedLocation::LocalPath(path)),
        };

        match organizer.place(&path, self.config.link_mode) {
            Ok(placed) => Some(ResolvedLocation::HardLinkedPath(placed)),
            Err(e) => {
                log::warn!("{}; listing library path instead", e);
                Some(ResolvedLocation::LocalPath(path))
            }
        }
    }

    fn resolve_remote(&self, track: &Track, pool: Option<&DownloadPool>) -> Option<ResolvedLocation> {
        let hit = self.search.search(&track.search_terms())?;
        log::debug!("Remote match: {}", hit.filename);

        let (Some(organizer), Some(pool)) = (self.organizer.as_ref(), pool) else {
            return Some(ResolvedLocation::RemoteUrl(hit.url));
        };

        let dest = organizer.file_path(&hit.filename);
        match pool.submit(&hit.url, &dest) {
            Ok(_) => Some(ResolvedLocation::PendingDownloadPath(dest)),
            Err(e) => {
                log::warn!("{}; listing remote URL instead", e);
                Some(ResolvedLocation::RemoteUrl(hit.url))
            }
        }
    }
}
