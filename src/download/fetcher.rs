//! Fetch operation trait and the external-process implementation

use super::DownloadError;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// How a finished fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
}

/// A running fetch operation
pub trait FetchHandle: Send {
    /// Non-blocking check; `None` while still running
    fn try_finish(&mut self) -> Option<JobOutcome>;

    /// Stop the operation and release its resources
    fn terminate(&mut self);
}

/// Starts fetch operations
pub trait Fetcher: Send + Sync {
    fn start(&self, url: &str, dest: &Path) -> Result<Box<dyn FetchHandle>, DownloadError>;
}

/// Runs one external program per download
///
/// `{url}` and `{dest}` in the argument list are replaced per job.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
}

impl CommandFetcher {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `curl` writing the response body to the destination path
    pub fn curl() -> Self {
        Self::new(
            "curl",
            [
                "--silent",
                "--show-error",
                "--location",
                "--fail",
                "--output",
                "{dest}",
                "{url}",
            ],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_for(&self, url: &str, dest: &Path) -> Command {
        let dest = dest.to_string_lossy();
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            command.arg(arg.replace("{url}", url).replace("{dest}", &dest));
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        command
    }
}

impl Default for CommandFetcher {
    fn default() -> Self {
        Self::curl()
    }
}

impl Fetcher for CommandFetcher {
    fn start(&self, url: &str, dest: &Path) -> Result<Box<dyn FetchHandle>, DownloadError> {
        let child = self
            .command_for(url, dest)
            .spawn()
            .map_err(|source| DownloadError::Spawn {
                program: self.program.clone(),
                url: url.to_string(),
                source,
            })?;

        log::debug!("Started {} (pid {}) for {:?}", self.program, child.id(), dest);
        Ok(Box::new(ProcessHandle { child }))
    }
}

/// Handle on a spawned download process
struct ProcessHandle {
    child: Child,
}

impl FetchHandle for ProcessHandle {
    fn try_finish(&mut self) -> Option<JobOutcome> {
        match self.child.try_wait() {
            Ok(Some(status)) if status.success() => Some(JobOutcome::Succeeded),
            Ok(Some(status)) => Some(JobOutcome::Failed(format!("process {}", status))),
            Ok(None) => None,
            Err(e) => {
                // The process can no longer be observed; make sure it is gone
                self.terminate();
                Some(JobOutcome::Failed(e.to_string()))
            }
        }
    }

    fn terminate(&mut self) {
        if let Err(e) = self.child.kill() {
            log::debug!("kill({}) failed: {}", self.child.id(), e);
        }
        let _ = self.child.wait();
    }
}
