// Progress adapter - turns yt-dlp progress records into DownloadProgress

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::DownloadError;
use super::models::{DownloadProgress, DownloadStatus};

/// Prefix the yt-dlp backend puts in front of every progress line
pub const PROGRESS_MARKER: &str = "ytmp3-progress:";

/// `--progress-template` value that makes yt-dlp dump the full progress
/// dict as JSON behind [`PROGRESS_MARKER`]
pub fn progress_template() -> String {
    format!("download:{}%(progress)j", PROGRESS_MARKER)
}

/// The two keys we care about; everything else in the record is ignored
#[derive(Debug, Deserialize)]
struct RawProgress {
    status: Option<String>,
    #[serde(rename = "_percent_str")]
    percent: Option<String>,
}

impl RawProgress {
    fn into_progress(self) -> Result<DownloadProgress, DownloadError> {
        let keyword = self
            .status
            .ok_or_else(|| DownloadError::UnknownProgressStatus("<missing>".to_string()))?;
        let status: DownloadStatus = keyword.parse()?;

        Ok(DownloadProgress {
            status,
            completion_percentage: self
                .percent
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

impl DownloadProgress {
    /// Build an event from a raw progress mapping
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, DownloadError> {
        let raw = RawProgress {
            status: record
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string),
            percent: record
                .get("_percent_str")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        raw.into_progress()
    }
}

/// Decode one stdout line from yt-dlp.
///
/// Returns `None` for lines that are not progress lines, `Some(Err(..))`
/// when a progress line cannot be decoded.
pub fn parse_progress_line(line: &str) -> Option<Result<DownloadProgress, DownloadError>> {
    let payload = line.trim_end().strip_prefix(PROGRESS_MARKER)?;

    let decoded = serde_json::from_str::<RawProgress>(payload)
        .map_err(|e| DownloadError::ParseError(format!("Invalid progress JSON: {}", e)))
        .and_then(RawProgress::into_progress);

    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_downloading_record() {
        let progress = DownloadProgress::from_record(&record(json!({
            "status": "downloading",
            "_percent_str": " 42.5%",
            "_speed_str": "1.2MiB/s",
            "downloaded_bytes": 1024,
        })))
        .unwrap();

        assert_eq!(progress.status, DownloadStatus::Downloading);
        assert_eq!(progress.completion_percentage.as_deref(), Some("42.5%"));
    }

    #[test]
    fn test_finished_and_error_records() {
        let finished = DownloadProgress::from_record(&record(json!({"status": "finished"}))).unwrap();
        assert_eq!(finished.status, DownloadStatus::Finished);
        assert_eq!(finished.completion_percentage, None);

        let error = DownloadProgress::from_record(&record(json!({"status": "error"}))).unwrap();
        assert_eq!(error.status, DownloadStatus::Error);
    }

    #[test]
    fn test_unknown_status_is_fatal() {
        let err = DownloadProgress::from_record(&record(json!({"status": "paused"}))).unwrap_err();
        assert!(matches!(err, DownloadError::UnknownProgressStatus(_)));

        let err = DownloadProgress::from_record(&record(json!({"_percent_str": "1%"}))).unwrap_err();
        assert!(matches!(err, DownloadError::UnknownProgressStatus(_)));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = r#"ytmp3-progress:{"status": "downloading", "_percent_str": "  7.1%", "eta": 12}"#;
        let progress = parse_progress_line(line).unwrap().unwrap();
        assert_eq!(progress.completion_percentage.as_deref(), Some("7.1%"));

        assert!(parse_progress_line("[ExtractAudio] Destination: x.mp3").is_none());
        assert!(matches!(
            parse_progress_line("ytmp3-progress:{not json"),
            Some(Err(DownloadError::ParseError(_)))
        ));
    }

    #[test]
    fn test_template_carries_marker() {
        assert_eq!(progress_template(), "download:ytmp3-progress:%(progress)j");
    }
}
