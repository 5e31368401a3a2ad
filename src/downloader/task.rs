// Background task wrapper: runs the blocking pipeline off the caller's
// thread and streams statuses over a channel.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;

use super::errors::DownloadError;
use super::models::{SavedTrack, VideoId};
use super::orchestrator::Downloader;

pub struct DownloadHandle {
    /// Status strings in pipeline order; closes when the pipeline ends
    pub statuses: UnboundedReceiver<String>,
    join: JoinHandle<Result<SavedTrack, DownloadError>>,
}

impl DownloadHandle {
    /// Wait for the pipeline result
    pub async fn wait(self) -> Result<SavedTrack, DownloadError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(DownloadError::TaskFailed(e.to_string())),
        }
    }

    /// Forward every status to `on_status`, then return the result
    pub async fn drain(mut self, mut on_status: impl FnMut(String)) -> Result<SavedTrack, DownloadError> {
        while let Some(status) = self.statuses.recv().await {
            on_status(status);
        }
        self.wait().await
    }
}

/// Start a download on the blocking pool.
///
/// Dropping the status receiver does not stop the download; statuses are
/// then discarded.
pub fn spawn_download(
    downloader: Arc<Downloader>,
    id: VideoId,
    destination: PathBuf,
    include_title_artist: bool,
) -> DownloadHandle {
    let (tx, rx) = unbounded_channel();

    let join = tokio::task::spawn_blocking(move || {
        let mut on_status = |status: String| {
            let _ = tx.send(status);
        };
        downloader.download(&id, &destination, &mut on_status, include_title_artist)
    });

    DownloadHandle { statuses: rx, join }
}
