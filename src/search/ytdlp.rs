//! YouTube search through the `yt-dlp` program

use super::{RemoteHit, RemoteSearch};
use serde::Deserialize;
use std::cmp::Ordering;
use std::process::{Command, Stdio};

/// Search results as printed by `yt-dlp --dump-single-json ytsearch1:...`
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entries: Vec<Option<VideoInfo>>,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    id: String,
    title: String,
    #[serde(default)]
    formats: Vec<MediaFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct MediaFormat {
    url: Option<String>,
    ext: Option<String>,
    acodec: Option<String>,
    vcodec: Option<String>,
    /// Audio bitrate, kbit/s
    abr: Option<f64>,
    /// Total bitrate, kbit/s
    tbr: Option<f64>,
}

impl MediaFormat {
    fn is_usable(&self) -> bool {
        self.url.is_some() && self.ext.is_some()
    }

    fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    fn audio_only(&self) -> bool {
        self.has_audio() && self.vcodec.as_deref() == Some("none")
    }
}

/// Remote search backed by the `yt-dlp` command line program
///
/// Every call runs a fresh search; nothing is cached.
#[derive(Debug, Clone)]
pub struct YtDlpSearch {
    program: String,
}

impl YtDlpSearch {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Use a specific `yt-dlp` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, query: &str) -> Option<Vec<u8>> {
        let output = Command::new(&self.program)
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--quiet",
                "--no-warnings",
            ])
            .arg(format!("ytsearch1:{}", query))
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => Some(output.stdout),
            Ok(output) => {
                log::warn!(
                    "{} search for {:?} failed ({}): {}",
                    self.program,
                    query,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                log::warn!("Could not run {}: {}", self.program, e);
                None
            }
        }
    }
}

impl Default for YtDlpSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSearch for YtDlpSearch {
    fn search(&self, terms: &[&str]) -> Option<RemoteHit> {
        let query = terms.join(" ");
        if query.trim().is_empty() {
            return None;
        }

        log::debug!("Searching remotely for {:?}", query);
        let json = self.run(&query)?;

        match hit_from_json(&json) {
            Ok(Some(hit)) => Some(hit),
            Ok(None) => {
                log::debug!("No usable remote result for {:?}", query);
                None
            }
            Err(e) => {
                log::warn!("Unreadable search result for {:?}: {}", query, e);
                None
            }
        }
    }
}

/// Pick the first result and its best encoding from yt-dlp's JSON
fn hit_from_json(json: &[u8]) -> serde_json::Result<Option<RemoteHit>> {
    let response: SearchResponse = serde_json::from_slice(json)?;

    let Some(video) = response.entries.into_iter().flatten().next() else {
        return Ok(None);
    };

    let Some(format) = select_format(&video.formats) else {
        return Ok(None);
    };

    let (Some(url), Some(ext)) = (format.url.clone(), format.ext.as_deref()) else {
        return Ok(None);
    };

    Ok(Some(RemoteHit {
        url,
        filename: format!("{}-{}.{}", video.title.replace('/', "_"), video.id, ext),
    }))
}

/// Best audio-only encoding, else the best stream carrying both audio and video
///
/// Formats are ranked by bitrate; on a tie the later entry wins, since
/// yt-dlp lists formats from worst to best.
fn select_format(formats: &[MediaFormat]) -> Option<&MediaFormat> {
    let usable = || formats.iter().filter(|f| f.is_usable());

    usable()
        .filter(|f| f.audio_only())
        .max_by(|a, b| compare_bitrate(a.abr.or(a.tbr), b.abr.or(b.tbr)))
        .or_else(|| {
            usable()
                .filter(|f| f.has_audio() && f.has_video())
                .max_by(|a, b| compare_bitrate(a.tbr, b.tbr))
        })
}

fn compare_bitrate(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0)
        .partial_cmp(&b.unwrap_or(0.0))
        .unwrap_or(Ordering::Equal)
}
