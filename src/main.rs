//! youtube-mp3: save a YouTube video as a tagged MP3 with square cover art.
//!
//! Set YT_MP3_YTDLP / YT_MP3_FFMPEG to pin tool locations and
//! YT_MP3_DOWNLOAD_DIR for the default output folder.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use youtube_mp3_lib::downloader::{DiscardLog, DownloaderLog, ToolManager, TracingLog};
use youtube_mp3_lib::{extract_video_id, init_tracing, spawn_download, DownloadOptions, Downloader};

#[derive(Parser)]
#[command(name = "youtube-mp3", about = "Download a YouTube video as a tagged MP3")]
struct Cli {
    /// YouTube video URL
    #[arg(required_unless_present = "check_tools")]
    url: Option<String>,
    /// Destination folder (defaults to the download directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the cleaned title and artist after saving
    #[arg(long)]
    show_tags: bool,
    /// Forward yt-dlp's own output to the log
    #[arg(long)]
    verbose_downloader: bool,
    /// List the external tools and exit
    #[arg(long)]
    check_tools: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let tools = ToolManager::new();

    if cli.check_tools {
        for info in tools.get_all_tools() {
            match (&info.path, &info.version) {
                (Some(path), version) => println!(
                    "{:<8} {} ({})",
                    info.name,
                    path,
                    version.as_deref().unwrap_or("unknown version")
                ),
                (None, _) => println!("{:<8} missing", info.name),
            }
        }
        return ExitCode::SUCCESS;
    }

    let url = cli.url.unwrap_or_default();
    let Some(video_id) = extract_video_id(url.trim()) else {
        eprintln!("Not a YouTube video URL: {}", url);
        return ExitCode::from(2);
    };

    let missing = tools.missing_tools();
    if !missing.is_empty() {
        eprintln!("Missing required tools: {}", missing.join(", "));
        return ExitCode::from(3);
    }

    let destination = cli.output.unwrap_or_else(DownloadOptions::default_destination);
    let log: Arc<dyn DownloaderLog> = if cli.verbose_downloader {
        Arc::new(TracingLog)
    } else {
        Arc::new(DiscardLog)
    };
    let downloader = Arc::new(Downloader::with_ytdlp(DownloadOptions::default(), log));

    let handle = spawn_download(downloader, video_id, destination, cli.show_tags);
    match handle.drain(|status| println!("{}", status)).await {
        Ok(track) => {
            if let (Some(title), Some(artist)) = (&track.title, &track.artist) {
                println!("Title:  {}", title);
                println!("Artist: {}", artist);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Download failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
