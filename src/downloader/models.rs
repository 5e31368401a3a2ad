// Common data models for the download pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::DownloadError;
use super::tools::{ToolManager, ToolType};

pub const AUDIO_FORMAT: &str = "mp3";
pub const AUDIO_QUALITY_KBPS: u32 = 320;
pub const THUMBNAIL_SIZE: (u32, u32) = (512, 512);

/// Video identifier extracted from a YouTube URL.
///
/// Only [`VideoId::from_url`] creates one, so holding a `VideoId` means the
/// URL it came from matched the accepted URL forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoId(pub(crate) String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL handed to the downloader
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status keyword of a yt-dlp progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Finished,
    Error,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

impl FromStr for DownloadStatus {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloading" => Ok(Self::Downloading),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            other => Err(DownloadError::UnknownProgressStatus(other.to_string())),
        }
    }
}

/// One progress update from the downloader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    pub status: DownloadStatus,
    /// Only meaningful while downloading, e.g. "42.0%"
    pub completion_percentage: Option<String>,
}

/// Download options
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub ytdlp_path: String,
    pub ffmpeg_location: Option<String>,
    pub audio_format: String,
    /// Target bitrate in kbps
    pub audio_quality: u32,
    /// Bounding box for the re-embedded cover
    pub thumbnail_size: (u32, u32),
    pub jpeg_quality: u8,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        let tools = ToolManager::new();
        Self {
            ytdlp_path: tools
                .locate(&ToolType::YtDlp)
                .unwrap_or_else(|| ToolType::YtDlp.as_str().to_string()),
            ffmpeg_location: ToolType::Ffmpeg.existing_override(),
            audio_format: AUDIO_FORMAT.to_string(),
            audio_quality: AUDIO_QUALITY_KBPS,
            thumbnail_size: THUMBNAIL_SIZE,
            jpeg_quality: 90,
        }
    }
}

impl DownloadOptions {
    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_ffmpeg_location(mut self, location: Option<String>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    pub fn with_thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.thumbnail_size = (width, height);
        self
    }

    /// Default destination folder: `YT_MP3_DOWNLOAD_DIR`, then the user's
    /// download directory, then the working directory.
    pub fn default_destination() -> PathBuf {
        std::env::var_os("YT_MP3_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Result of a finished pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedTrack {
    pub path: PathBuf,
    /// Cleaned title, present when the caller asked for it
    pub title: Option<String>,
    pub artist: Option<String>,
}
