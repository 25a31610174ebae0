//! Background download pool with scoped cleanup

use super::fetcher::{FetchHandle, Fetcher, JobOutcome};
use super::DownloadError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Default pause between sweeps while draining
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Identifier of a submitted download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One in-flight fetch, owned by the pool until it finishes
struct DownloadJob {
    url: String,
    dest: PathBuf,
    handle: Box<dyn FetchHandle>,
}

/// A download that ended unsuccessfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDownload {
    pub url: String,
    pub dest: PathBuf,
    pub reason: String,
}

/// Result of waiting for every download to finish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Downloads that finished successfully
    pub completed: usize,

    /// Downloads that failed; their destination may be missing or partial
    pub failed: Vec<FailedDownload>,
}

/// Manages concurrent background downloads
///
/// Submission never blocks. Finished jobs are dropped from the registry on
/// the next sweep. Any job still registered when the pool is dropped is
/// terminated, so no download outlives the pool.
pub struct DownloadPool {
    fetcher: Box<dyn Fetcher>,
    jobs: Mutex<HashMap<JobId, DownloadJob>>,
    summary: Mutex<DrainSummary>,
    next_id: AtomicU64,
    poll_interval: Duration,
}

impl DownloadPool {
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            jobs: Mutex::new(HashMap::new()),
            summary: Mutex::new(DrainSummary::default()),
            next_id: AtomicU64::new(1),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the pause between sweeps while draining
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run `body` with a fresh pool, then wait for or kill its downloads
    ///
    /// When `body` succeeds the pool is drained and its summary returned with
    /// the body's value. When `body` fails every in-flight download is
    /// terminated before the error is returned. A panic in `body` drops the
    /// pool, which terminates the downloads as well.
    pub fn scope<T, E, F>(
        fetcher: impl Fetcher + 'static,
        poll_interval: Duration,
        body: F,
    ) -> Result<(T, DrainSummary), E>
    where
        F: FnOnce(&DownloadPool) -> Result<T, E>,
    {
        let pool = DownloadPool::new(fetcher).with_poll_interval(poll_interval);

        match body(&pool) {
            Ok(value) => {
                let summary = pool.drain();
                Ok((value, summary))
            }
            Err(e) => {
                let killed = pool.abort();
                if killed > 0 {
                    log::warn!("Aborted {} unfinished download(s)", killed);
                }
                Err(e)
            }
        }
    }

    /// Start downloading `url` into `dest` and return immediately
    pub fn submit(&self, url: &str, dest: &Path) -> Result<JobId, DownloadError> {
        let handle = self.fetcher.start(url, dest)?;
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.jobs.lock().insert(
            id,
            DownloadJob {
                url: url.to_string(),
                dest: dest.to_path_buf(),
                handle,
            },
        );

        log::info!("Download {} queued: {:?}", id, dest);
        Ok(id)
    }

    /// Drop finished jobs and return how many are still running
    pub fn poll_count(&self) -> usize {
        let mut jobs = self.jobs.lock();
        let mut finished = Vec::new();

        for (id, job) in jobs.iter_mut() {
            if let Some(outcome) = job.handle.try_finish() {
                finished.push((*id, outcome));
            }
        }

        if !finished.is_empty() {
            let mut summary = self.summary.lock();
            for (id, outcome) in finished {
                let Some(job) = jobs.remove(&id) else {
                    continue;
                };
                match outcome {
                    JobOutcome::Succeeded => {
                        log::debug!("Download {} finished: {:?}", id, job.dest);
                        summary.completed += 1;
                    }
                    JobOutcome::Failed(reason) => {
                        log::debug!("Download {} failed ({}): {:?}", id, reason, job.dest);
                        summary.failed.push(FailedDownload {
                            url: job.url,
                            dest: job.dest,
                            reason,
                        });
                    }
                }
            }
        }

        jobs.len()
    }

    /// Destinations of the downloads currently registered, in submission order
    pub fn in_flight(&self) -> Vec<(JobId, String, PathBuf)> {
        let jobs = self.jobs.lock();
        let mut list: Vec<_> = jobs
            .iter()
            .map(|(id, job)| (*id, job.url.clone(), job.dest.clone()))
            .collect();
        list.sort_by_key(|(id, _, _)| *id);
        list
    }

    /// Block until every download has finished
    ///
    /// Sweeps every poll interval and logs progress on each sweep. There is
    /// no timeout: a hung download keeps this waiting.
    pub fn drain(&self) -> DrainSummary {
        loop {
            let remaining = self.poll_count();
            if remaining == 0 {
                break;
            }
            log::info!("Waiting for {} download(s) to finish...", remaining);
            thread::sleep(self.poll_interval);
        }

        let summary = std::mem::take(&mut *self.summary.lock());
        if summary.completed > 0 || !summary.failed.is_empty() {
            log::info!(
                "Downloads finished: {} completed, {} failed",
                summary.completed,
                summary.failed.len()
            );
        }
        for failed in &summary.failed {
            log::warn!(
                "Download failed ({}): {:?} may be missing or incomplete",
                failed.reason,
                failed.dest
            );
        }
        summary
    }

    /// Terminate every registered download; returns how many were stopped
    pub fn abort(&self) -> usize {
        let mut jobs = self.jobs.lock();
        let count = jobs.len();

        for (id, mut job) in jobs.drain() {
            log::debug!("Terminating download {}: {:?}", id, job.dest);
            job.handle.terminate();
        }

        count
    }
}

impl Drop for DownloadPool {
    fn drop(&mut self) {
        let killed = self.abort();
        if killed > 0 {
            log::warn!("Download pool dropped with {} download(s) running; terminated", killed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// Handle that finishes after a fixed number of polls
    struct FakeHandle {
        polls_left: usize,
        outcome: JobOutcome,
        terminated: Arc<AtomicBool>,
    }

    impl FetchHandle for FakeHandle {
        fn try_finish(&mut self) -> Option<JobOutcome> {
            if self.polls_left == 0 {
                Some(self.outcome.clone())
            } else {
                self.polls_left -= 1;
                None
            }
        }

        fn terminate(&mut self) {
            self.terminated.store(true, Ordering::SeqCst);
        }
    }

    /// Fetcher whose jobs need `polls` sweeps; urls containing "fail" fail
    #[derive(Clone, Default)]
    struct FakeFetcher {
        polls: usize,
        terminated: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    }

    impl FakeFetcher {
        fn hanging() -> Self {
            Self {
                polls: usize::MAX,
                ..Self::default()
            }
        }

        fn terminated_count(&self) -> usize {
            self.terminated
                .lock()
                .iter()
                .filter(|flag| flag.load(Ordering::SeqCst))
                .count()
        }
    }

    impl Fetcher for FakeFetcher {
        fn start(&self, url: &str, _dest: &Path) -> Result<Box<dyn FetchHandle>, DownloadError> {
            let flag = Arc::new(AtomicBool::new(false));
            self.terminated.lock().push(flag.clone());

            let outcome = if url.contains("fail") {
                JobOutcome::Failed("exit status: 22".to_string())
            } else {
                JobOutcome::Succeeded
            };
            Ok(Box::new(FakeHandle {
                polls_left: self.polls,
                outcome,
                terminated: flag,
            }))
        }
    }

    fn fast(pool: DownloadPool) -> DownloadPool {
        pool.with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_poll_count_removes_finished_jobs() {
        let pool = fast(DownloadPool::new(FakeFetcher {
            polls: 1,
            ..FakeFetcher::default()
        }));

        pool.submit("http://a", Path::new("/out/a")).unwrap();
        pool.submit("http://b", Path::new("/out/b")).unwrap();

        assert_eq!(pool.poll_count(), 2);
        assert_eq!(pool.poll_count(), 0);
        assert!(pool.in_flight().is_empty());
    }

    #[test]
    fn test_drain_waits_for_all_jobs() {
        let pool = fast(DownloadPool::new(FakeFetcher {
            polls: 3,
            ..FakeFetcher::default()
        }));

        for i in 0..5 {
            pool.submit(&format!("http://{}", i), Path::new("/out/x"))
                .unwrap();
        }

        let summary = pool.drain();
        assert_eq!(summary.completed, 5);
        assert!(summary.failed.is_empty());
        assert_eq!(pool.poll_count(), 0);
        assert!(pool.in_flight().is_empty());
    }

    #[test]
    fn test_failures_are_summarised_not_raised() {
        let pool = fast(DownloadPool::new(FakeFetcher::default()));

        pool.submit("http://ok", Path::new("/out/ok")).unwrap();
        pool.submit("http://fail", Path::new("/out/bad")).unwrap();

        let summary = pool.drain();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].dest, PathBuf::from("/out/bad"));
    }

    #[test]
    fn test_in_flight_keeps_submission_order() {
        let pool = DownloadPool::new(FakeFetcher::hanging());

        let first = pool.submit("http://1", Path::new("/out/1")).unwrap();
        let second = pool.submit("http://2", Path::new("/out/2")).unwrap();

        let listed: Vec<_> = pool.in_flight().into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(listed, vec![first, second]);
        pool.abort();
    }

    #[test]
    fn test_scope_drains_on_success() {
        let fetcher = FakeFetcher {
            polls: 2,
            ..FakeFetcher::default()
        };

        let (value, summary) = DownloadPool::scope(
            fetcher.clone(),
            Duration::from_millis(1),
            |pool| -> Result<u32, String> {
                pool.submit("http://a", Path::new("/out/a")).unwrap();
                pool.submit("http://b", Path::new("/out/b")).unwrap();
                Ok(7)
            },
        )
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(summary.completed, 2);
        assert_eq!(fetcher.terminated_count(), 0);
    }

    #[test]
    fn test_scope_terminates_all_jobs_on_error() {
        let fetcher = FakeFetcher::hanging();

        let result = DownloadPool::scope(
            fetcher.clone(),
            Duration::from_millis(1),
            |pool| -> Result<(), String> {
                for i in 0..3 {
                    pool.submit(&format!("http://{}", i), Path::new("/out/x"))
                        .unwrap();
                }
                Err("playlist went away".to_string())
            },
        );

        assert_eq!(result.unwrap_err(), "playlist went away");
        assert_eq!(fetcher.terminated_count(), 3);
    }

    #[test]
    fn test_drop_terminates_running_jobs() {
        let fetcher = FakeFetcher::hanging();
        {
            let pool = DownloadPool::new(fetcher.clone());
            pool.submit("http://a", Path::new("/out/a")).unwrap();
            pool.submit("http://b", Path::new("/out/b")).unwrap();
        }
        assert_eq!(fetcher.terminated_count(), 2);
    }

    #[test]
    fn test_panic_in_scope_terminates_jobs() {
        let fetcher = FakeFetcher::hanging();
        let inner = fetcher.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ = DownloadPool::scope(inner, Duration::from_millis(1), |pool| -> Result<(), ()> {
                pool.submit("http://a", Path::new("/out/a")).unwrap();
                panic!("boom");
            });
        }));

        assert!(result.is_err());
        assert_eq!(fetcher.terminated_count(), 1);
    }
}
