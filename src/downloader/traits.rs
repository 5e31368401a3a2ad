// Downloader backend trait and the capabilities handed to it

use std::path::{Path, PathBuf};

use super::errors::DownloadError;
use super::models::{DownloadOptions, DownloadProgress, VideoId};

/// Trait for downloader backend implementations
pub trait DownloaderBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Fetch `id` as audio into `destination`, reporting progress to `progress`.
    ///
    /// Blocks until the downloader finishes. Returns the `<id>.<audio_format>`
    /// path inside `destination`.
    fn download_audio(
        &self,
        id: &VideoId,
        destination: &Path,
        options: &DownloadOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError>;
}

/// Receives progress events for one download call
pub trait ProgressSink {
    fn on_progress(&mut self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(DownloadProgress),
{
    fn on_progress(&mut self, progress: DownloadProgress) {
        self(progress)
    }
}

/// Where the downloader's own diagnostic output goes
pub trait DownloaderLog: Send + Sync {
    fn line(&self, line: &str);
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLog;

impl DownloaderLog for DiscardLog {
    fn line(&self, _line: &str) {}
}

/// Forwards each line to `tracing` under the `ytdlp` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl DownloaderLog for TracingLog {
    fn line(&self, line: &str) {
        tracing::info!(target: "ytdlp", "{}", line);
    }
}

/// Deterministic output path for a download
pub fn output_path(destination: &Path, id: &VideoId, extension: &str) -> PathBuf {
    destination.join(format!("{}.{}", id, extension))
}
