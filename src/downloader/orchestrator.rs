// Pipeline orchestrator - download, crop cover, clean tags

use std::path::Path;
use std::sync::Arc;

use super::backends::YtDlpBackend;
use super::errors::DownloadError;
use super::models::{DownloadOptions, DownloadProgress, DownloadStatus, SavedTrack, VideoId};
use super::traits::{DownloaderBackend, DownloaderLog, ProgressSink};
use crate::postprocess::{cleanup_metadata, ThumbnailCropper};

pub const STATUS_INITIALIZING: &str = "Initializing download";
pub const STATUS_CONVERTING: &str = "Converting";
pub const STATUS_ERROR: &str = "Error occurred";
pub const STATUS_CROPPING: &str = "Cropping thumbnail";
pub const STATUS_CLEANING: &str = "Cleaning up metadata";

/// Maps downloader progress onto status strings.
///
/// Every downloading event is reported; "Converting" and "Error occurred"
/// at most once per run.
struct StatusRelay<'a> {
    on_status: &'a mut dyn FnMut(String),
    converting_reported: bool,
    error_reported: bool,
}

impl<'a> StatusRelay<'a> {
    fn new(on_status: &'a mut dyn FnMut(String)) -> Self {
        Self {
            on_status,
            converting_reported: false,
            error_reported: false,
        }
    }
}

impl ProgressSink for StatusRelay<'_> {
    fn on_progress(&mut self, progress: DownloadProgress) {
        match progress.status {
            DownloadStatus::Downloading => {
                let percent = progress.completion_percentage.unwrap_or_default();
                (self.on_status)(format!("Downloading {}", percent).trim_end().to_string());
            }
            DownloadStatus::Finished if !self.converting_reported => {
                self.converting_reported = true;
                (self.on_status)(STATUS_CONVERTING.to_string());
            }
            DownloadStatus::Error if !self.error_reported => {
                self.error_reported = true;
                (self.on_status)(STATUS_ERROR.to_string());
            }
            _ => {}
        }
    }
}

pub struct Downloader {
    backend: Box<dyn DownloaderBackend>,
    options: DownloadOptions,
}

impl Downloader {
    pub fn new(backend: Box<dyn DownloaderBackend>, options: DownloadOptions) -> Self {
        Self { backend, options }
    }

    /// yt-dlp backend with its output routed to `log`
    pub fn with_ytdlp(options: DownloadOptions, log: Arc<dyn DownloaderLog>) -> Self {
        Self::new(Box::new(YtDlpBackend::new(log)), options)
    }

    /// Run the whole pipeline for `id`, saving into `destination`.
    ///
    /// `on_status` is called synchronously on the calling thread, in
    /// pipeline order. Any failure aborts the remaining steps and is
    /// returned as-is; whatever was written to disk stays there.
    pub fn download(
        &self,
        id: &VideoId,
        destination: &Path,
        on_status: &mut dyn FnMut(String),
        include_title_artist: bool,
    ) -> Result<SavedTrack, DownloadError> {
        tracing::info!("[Downloader] {} -> {} via {}", id, destination.display(), self.backend.name());

        on_status(STATUS_INITIALIZING.to_string());
        let mp3_path = {
            let mut relay = StatusRelay::new(on_status);
            self.backend
                .download_audio(id, destination, &self.options, &mut relay)?
        };
        tracing::info!("[Downloader] ✓ Downloaded {}", mp3_path.display());

        on_status(STATUS_CROPPING.to_string());
        ThumbnailCropper::new(self.options.thumbnail_size, self.options.jpeg_quality)
            .crop(&mp3_path)?;

        on_status(STATUS_CLEANING.to_string());
        let (title, artist) = cleanup_metadata(&mp3_path)?;

        on_status(format!("Saved as {}", mp3_path.display()));
        tracing::info!("[Downloader] ✓ Saved {} ({} - {})", mp3_path.display(), artist, title);

        Ok(SavedTrack {
            path: mp3_path,
            title: include_title_artist.then_some(title),
            artist: include_title_artist.then_some(artist),
        })
    }
}

/// Convenience wrapper: default options, downloader output discarded
pub fn download(
    id: &VideoId,
    destination: &Path,
    on_status: &mut dyn FnMut(String),
    include_title_artist: bool,
) -> Result<SavedTrack, DownloadError> {
    Downloader::with_ytdlp(DownloadOptions::default(), Arc::new(super::traits::DiscardLog))
        .download(id, destination, on_status, include_title_artist)
}
