use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xspfm3u::download::CommandFetcher;
use xspfm3u::metadata::LoftyReader;
use xspfm3u::resolve::{FileIndex, LinkMode};
use xspfm3u::search::{NoSearch, RemoteSearch, YtDlpSearch};
use xspfm3u::{ResolveConfig, ResolvePipeline};

#[derive(Parser, Debug)]
#[command(name = "xspfm3u")]
#[command(about = "Convert playlists between XSPF and M3U", long_about = None)]
struct Args {
    /// Source playlist (.xspf or .m3u)
    src: String,

    /// Music library folder searched for tracks without a location (required for m3u output)
    folder: Option<String>,

    /// Output format (default: m3u for .xspf sources, xspf otherwise)
    #[arg(short = 't', long = "to", value_enum)]
    to: Option<Format>,

    /// Destination directory for linked and downloaded files
    #[arg(short = 'O', long)]
    outdir: Option<String>,

    /// Search YouTube for tracks missing from the library
    #[arg(short = 'Y', long)]
    youtube: bool,

    /// Write the playlist to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Write extended M3U (#EXTM3U / #EXTINF lines)
    #[arg(long)]
    extended: bool,

    /// How library matches are placed into the destination directory
    #[arg(long, value_enum, default_value = "hardlink")]
    link_mode: LinkArg,

    /// Seconds between checks while waiting for downloads
    #[arg(long, default_value = "5")]
    poll_interval: u64,

    /// yt-dlp executable used for remote search
    #[arg(long = "yt-dlp", default_value = "yt-dlp")]
    yt_dlp: String,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    M3u,
    Xspf,
}

impl Format {
    fn for_source(src: &Path) -> Self {
        let is_xspf = src
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xspf"))
            .unwrap_or(false);
        if is_xspf {
            Format::M3u
        } else {
            Format::Xspf
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LinkArg {
    /// Hard-link, copying across filesystems
    Hardlink,
    /// Always copy
    Copy,
    /// List library paths even when a destination is set
    None,
}

impl From<LinkArg> for LinkMode {
    fn from(arg: LinkArg) -> Self {
        match arg {
            LinkArg::Hardlink => LinkMode::HardLink,
            LinkArg::Copy => LinkMode::Copy,
            LinkArg::None => LinkMode::Reference,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let src = expand(&args.src);
    let target = args.to.unwrap_or_else(|| Format::for_source(&src));

    if target == Format::M3u && args.folder.is_none() {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the library FOLDER is required when converting to m3u",
            )
            .exit();
    }

    if !src.exists() {
        println!("Can not open file '{}'", args.src);
        return Ok(());
    }

    let out: Box<dyn Write> = match args.output {
        Some(ref path) => {
            let path = expand(path);
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            log::info!("Writing playlist to {:?}", path);
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    match target {
        Format::M3u => to_m3u(&args, &src, out),
        Format::Xspf => to_xspf(&src, out),
    }
}

fn to_m3u(args: &Args, src: &Path, out: Box<dyn Write>) -> Result<()> {
    let folder = expand(args.folder.as_deref().unwrap_or("."));

    log::info!("Loading XSPF playlist...");
    let playlist = xspfm3u::xspf::parse_xspf(src)?;

    let index = FileIndex::scan(&folder)?;

    let mut config = ResolveConfig::new(folder)
        .with_remote_search(args.youtube)
        .with_link_mode(args.link_mode.into())
        .with_poll_interval(Duration::from_secs(args.poll_interval))
        .with_extended(args.extended);

    if let Some(ref outdir) = args.outdir {
        config = config.with_outdir(expand(outdir));
    }

    let search: Box<dyn RemoteSearch> = if args.youtube {
        log::info!("Remote search enabled via {}", args.yt_dlp);
        Box::new(YtDlpSearch::with_program(args.yt_dlp.clone()))
    } else {
        Box::new(NoSearch)
    };

    let pipeline = ResolvePipeline::new(config, index, search)?;
    let report = pipeline
        .export(&playlist, out, CommandFetcher::curl())
        .context("Playlist conversion failed")?;

    if !report.downloads.failed.is_empty() {
        log::warn!(
            "{} download(s) failed; their playlist entries point at missing files",
            report.downloads.failed.len()
        );
    }

    log::info!("Conversion completed successfully!");
    Ok(())
}

fn to_xspf(src: &Path, out: Box<dyn Write>) -> Result<()> {
    log::info!("Loading M3U playlist...");
    let playlist = xspfm3u::m3u::parse_m3u(src, &LoftyReader::new())?;

    xspfm3u::xspf::write_xspf(&playlist, out)?;

    log::info!("Conversion completed successfully!");
    Ok(())
}

/// Expand ~ in a user-supplied path
fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
