// Downloader module - URL parsing, yt-dlp invocation and the pipeline

pub mod backends;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod task;
pub mod tools;
pub mod traits;
pub mod url;

pub use errors::DownloadError;
pub use models::{DownloadOptions, DownloadProgress, DownloadStatus, SavedTrack, VideoId};
pub use orchestrator::{download, Downloader};
pub use progress::parse_progress_line;
pub use task::{spawn_download, DownloadHandle};
pub use tools::{detect_missing_tools, ToolInfo, ToolManager, ToolType};
pub use traits::{DiscardLog, DownloaderBackend, DownloaderLog, ProgressSink, TracingLog};
pub use url::extract_video_id;
