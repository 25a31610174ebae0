//! Destination directory management

use super::config::LinkMode;
use super::ResolveError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Places resolved files into the destination directory
pub struct DestinationOrganizer {
    root: PathBuf,
}

impl DestinationOrganizer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the destination directory tree if it does not exist
    pub fn init(&self) -> Result<(), ResolveError> {
        fs::create_dir_all(&self.root).map_err(|source| ResolveError::Destination {
            path: self.root.clone(),
            source,
        })?;

        log::info!("Destination directory ready at {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for a file name
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Materialize a library file inside the destination directory
    ///
    /// A destination file that is already the same file as `source` is
    /// reused. A different file holding the name pushes the new one to
    /// `Name (2).ext`, `Name (3).ext`, and so on.
    pub fn place(&self, source: &Path, mode: LinkMode) -> Result<PathBuf, ResolveError> {
        if mode == LinkMode::Reference {
            return Ok(source.to_path_buf());
        }

        let file_name = Path::new(source.file_name().unwrap_or_else(|| source.as_os_str()));
        let mut dest = self.root.join(file_name);
        let mut attempt = 1;

        while dest.exists() {
            if is_same_file(source, &dest) {
                log::debug!("Already in destination: {:?}", dest);
                return Ok(dest);
            }
            attempt += 1;
            dest = self.root.join(numbered_name(file_name, attempt));
        }

        if attempt > 1 {
            log::warn!(
                "{:?} is taken by another file, placing {:?} as {:?}",
                file_name,
                source,
                dest
            );
        }

        let result = match mode {
            LinkMode::Copy => fs::copy(source, &dest).map(|_| ()),
            _ => link_or_copy(source, &dest),
        };

        result.map_err(|e| ResolveError::Link {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;

        Ok(dest)
    }
}

/// `Intro.mp3` -> `Intro (2).mp3`
fn numbered_name(file_name: &Path, n: u32) -> OsString {
    let stem = file_name
        .file_stem()
        .unwrap_or_else(|| file_name.as_os_str())
        .to_string_lossy();

    match file_name.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()).into(),
        None => format!("{} ({})", stem, n).into(),
    }
}

/// Whether `dest` already holds `source`: a hard link to it, or an
/// identical copy
fn is_same_file(source: &Path, dest: &Path) -> bool {
    let (Ok(src_meta), Ok(dest_meta)) = (fs::metadata(source), fs::metadata(dest)) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if src_meta.dev() == dest_meta.dev() && src_meta.ino() == dest_meta.ino() {
            return true;
        }
    }

    src_meta.len() == dest_meta.len()
        && matches!((fs::read(source), fs::read(dest)), (Ok(a), Ok(b)) if a == b)
}

/// Hard-link, falling back to a copy (e.g. across filesystems)
fn link_or_copy(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::hard_link(source, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("Hard link {:?} failed ({}), copying instead", dest, e);
            fs::copy(source, dest).map(|_| ())
        }
    }
}
