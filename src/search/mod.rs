//! Remote search for tracks missing from the local library

mod ytdlp;

pub use ytdlp::YtDlpSearch;

/// A downloadable remote match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHit {
    /// Direct media URL; these expire after a few hours
    pub url: String,

    /// Suggested local file name, `{title}-{id}.{ext}`
    pub filename: String,
}

/// Remote search provider
///
/// Implementations return `None` for no results, no usable encoding and
/// provider failures alike. They must not panic on any of those.
pub trait RemoteSearch {
    fn search(&self, terms: &[&str]) -> Option<RemoteHit>;
}

/// Search provider used when remote search is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSearch;

impl RemoteSearch for NoSearch {
    fn search(&self, _terms: &[&str]) -> Option<RemoteHit> {
        None
    }
}

impl<S: RemoteSearch + ?Sized> RemoteSearch for Box<S> {
    fn search(&self, terms: &[&str]) -> Option<RemoteHit> {
        (**self).search(terms)
    }
}
