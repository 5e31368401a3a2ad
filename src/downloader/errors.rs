// Error types for the download pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp or ffmpeg not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// yt-dlp reported a progress status outside downloading/finished/error
    #[error("Unknown progress status: {0}")]
    UnknownProgressStatus(String),

    /// Failed to decode a progress record
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The downloader failed; carries its stderr as-is
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// A tag the normalizer depends on is absent
    #[error("Missing tag: {0}")]
    MissingTag(&'static str),

    /// Cover image has a zero-sized extent
    #[error("Invalid cover geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Tag error: {0}")]
    Tag(#[from] id3::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Background download task panicked or was aborted
    #[error("Download task failed: {0}")]
    TaskFailed(String),
}
