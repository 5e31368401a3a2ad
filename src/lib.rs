pub mod downloader;
pub mod postprocess;

pub use downloader::{
    detect_missing_tools, download, extract_video_id, spawn_download, DownloadError, DownloadOptions,
    Downloader, SavedTrack, VideoId,
};
pub use postprocess::{cleanup_metadata, crop_thumbnail};

/// Install the fmt subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "youtube_mp3_lib=info,youtube_mp3=info,ytdlp=info".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
