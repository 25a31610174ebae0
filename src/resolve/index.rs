//! Local audio file index and title matching

use super::normalize::normalize;
use super::ResolveError;
use rayon::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as audio
pub const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "ogg", "opus", "mp4", "m4a", "wav", "flac", "wma"];

/// One audio file found in the library folder
#[derive(Debug, Clone)]
pub struct FileIndexEntry {
    dir: PathBuf,
    file_name: OsString,
    /// Match key of the file name, spaces removed
    name_key: String,
    /// Match key of the full path, spaces removed
    path_key: String,
}

impl FileIndexEntry {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<OsString>) -> Self {
        let dir = dir.into();
        let file_name = file_name.into();
        let path = dir.join(&file_name);

        Self {
            name_key: compact(&normalize(&file_name.to_string_lossy())),
            path_key: compact(&normalize(&path.to_string_lossy())),
            dir,
            file_name,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &OsString {
        &self.file_name
    }

    /// Full path of the file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// In-memory snapshot of a library folder's audio files
///
/// Entries keep walk order. When several files match a track the first one
/// in this order wins, so duplicates are picked by filesystem traversal order.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    entries: Vec<FileIndexEntry>,
}

impl FileIndex {
    /// Walk `root` recursively and collect every audio file
    ///
    /// Unreadable subtrees are logged and skipped. Only an unreadable root
    /// is an error.
    pub fn scan(root: &Path) -> Result<Self, ResolveError> {
        fs::read_dir(root).map_err(|source| ResolveError::IndexRoot {
            path: root.to_path_buf(),
            source,
        })?;

        log::info!("Scanning library folder {:?}", root);

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for item in WalkDir::new(root) {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable library entry: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            let is_file =
                file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !has_audio_extension(&name) {
                continue;
            }

            let dir = entry
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            entries.push(FileIndexEntry::new(dir, entry.file_name()));
        }

        log::info!(
            "Indexed {} audio files ({} entries skipped)",
            entries.len(),
            skipped
        );

        Ok(Self { entries })
    }

    /// Build an index from known entries
    pub fn from_entries(entries: Vec<FileIndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FileIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first file whose name contains the title
    ///
    /// Every non-empty context field (artist, comment...) must also appear
    /// somewhere in the file's full path. Comparison is on normalized keys
    /// with spaces removed, so punctuation, case and spacing differences
    /// are tolerated. A title with an empty key never matches.
    pub fn match_local(&self, title: &str, context: &[&str]) -> Option<&FileIndexEntry> {
        let title_key = compact(&normalize(title));
        if title_key.is_empty() {
            return None;
        }

        let context_keys: Vec<String> = context
            .iter()
            .filter(|field| !field.is_empty())
            .map(|field| compact(&normalize(field)))
            .collect();

        self.entries.par_iter().find_first(|entry| {
            entry.name_key.contains(&title_key)
                && context_keys.iter().all(|key| entry.path_key.contains(key))
        })
    }
}

fn has_audio_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| AUDIO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn compact(key: &str) -> String {
    key.chars().filter(|c| *c != ' ').collect()
}
