use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadOptions, VideoId};
use crate::downloader::progress::{parse_progress_line, progress_template};
use crate::downloader::traits::{output_path, DiscardLog, DownloaderBackend, DownloaderLog, ProgressSink};

/// Line iterator that survives non-UTF-8 output. Invalid bytes are
/// replaced and reading continues; it stops at EOF or on an I/O error.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new() }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                Some(line.trim_end_matches(['\n', '\r']).to_string())
            }
        }
    }
}

/// yt-dlp binary backend: best audio, transcoded by ffmpeg, thumbnail and
/// metadata embedded.
pub struct YtDlpBackend {
    log: Arc<dyn DownloaderLog>,
}

impl YtDlpBackend {
    pub fn new(log: Arc<dyn DownloaderLog>) -> Self {
        Self { log }
    }

    /// Build command arguments
    pub fn build_args(id: &VideoId, destination: &Path, options: &DownloadOptions) -> Vec<String> {
        let template = destination.join("%(id)s.%(ext)s");

        let mut args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            options.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", options.audio_quality),
            "--embed-metadata".to_string(),
            "--embed-thumbnail".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--progress".to_string(),
            "--newline".to_string(),
            "--no-colors".to_string(),
            "--progress-template".to_string(),
            progress_template(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
        ];

        if let Some(ffmpeg) = &options.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.clone());
        }

        args.push(id.watch_url());
        args
    }
}

impl Default for YtDlpBackend {
    fn default() -> Self {
        Self::new(Arc::new(DiscardLog))
    }
}

impl DownloaderBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn download_audio(
        &self,
        id: &VideoId,
        destination: &Path,
        options: &DownloadOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError> {
        let args = Self::build_args(id, destination, options);
        tracing::debug!("[yt-dlp] {} {:?}", options.ytdlp_path, args);

        let mut child = Command::new(&options.ytdlp_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("{}: {}", options.ytdlp_path, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

        // Spawn thread to collect stderr
        let stderr_handle = std::thread::spawn(move || {
            LossyLines::new(BufReader::new(stderr)).collect::<Vec<_>>()
        });

        for line in LossyLines::new(BufReader::new(stdout)) {
            match parse_progress_line(&line) {
                Some(Ok(event)) => progress.on_progress(event),
                Some(Err(e)) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
                None => self.log.line(&line),
            }
        }

        let status = child.wait()?;
        let stderr_lines = stderr_handle.join().unwrap_or_default();
        for line in &stderr_lines {
            self.log.line(line);
        }

        if !status.success() {
            let stderr_output = stderr_lines.join("\n");
            return Err(DownloadError::ExecutionError(if stderr_output.trim().is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                stderr_output
            }));
        }

        Ok(output_path(destination, id, &options.audio_format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{DownloadProgress, DownloadStatus};

    fn options() -> DownloadOptions {
        DownloadOptions::default()
            .with_ytdlp_path("yt-dlp")
            .with_ffmpeg_location(None)
    }

    #[test]
    fn test_build_args() {
        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();
        let args = YtDlpBackend::build_args(&id, Path::new("/music"), &options());

        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc123");
        assert!(args.windows(2).any(|w| w == ["-f", "bestaudio/best"]));
        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert!(args.windows(2).any(|w| w == ["--audio-quality", "320K"]));
        assert!(args.windows(2).any(|w| w[0] == "-o" && w[1].ends_with("%(id)s.%(ext)s")));
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert!(args.contains(&"--embed-metadata".to_string()));
        assert!(args.contains(&"--quiet".to_string()));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
    }

    #[test]
    fn test_ffmpeg_location_forwarded() {
        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();
        let opts = options().with_ffmpeg_location(Some("/opt/ffmpeg".to_string()));
        let args = YtDlpBackend::build_args(&id, Path::new("/music"), &opts);
        assert!(args.windows(2).any(|w| w == ["--ffmpeg-location", "/opt/ffmpeg"]));
    }

    #[test]
    fn test_missing_binary_is_tool_not_found() {
        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();
        let opts = options().with_ytdlp_path("/nonexistent/yt-dlp-binary");
        let mut sink = |_p: DownloadProgress| {};
        let err = YtDlpBackend::default()
            .download_audio(&id, Path::new("."), &opts, &mut sink)
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    #[test]
    fn test_lossy_lines_keep_reading_past_invalid_utf8() {
        let input: &[u8] = b"first\n[download] caf\xe9 tmp\r\nytmp3-progress:{}\nlast";
        let lines: Vec<_> = LossyLines::new(std::io::Cursor::new(input)).collect();
        assert_eq!(
            lines,
            vec!["first", "[download] caf\u{fffd} tmp", "ytmp3-progress:{}", "last"]
        );
    }

    /// Stand-in yt-dlp: a shell script with the given body
    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[cfg(unix)]
    fn run_fake(body: &str) -> (Vec<DownloadProgress>, Result<PathBuf, DownloadError>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let opts = options().with_ytdlp_path(fake_ytdlp(dir.path(), body));
        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();

        let mut events = Vec::new();
        let mut sink = |p: DownloadProgress| events.push(p);
        let result = YtDlpBackend::default().download_audio(&id, dir.path(), &opts, &mut sink);
        (events, result, dir)
    }

    #[cfg(unix)]
    #[test]
    fn test_progress_decoded_from_stdout() {
        let (events, result, dir) = run_fake(
            r#"echo 'ytmp3-progress:{"status":"downloading","_percent_str":"  5.0%"}'
echo '[ExtractAudio] Destination: abc123.mp3'
echo 'ytmp3-progress:{"status":"finished"}'
exit 0"#,
        );

        assert_eq!(result.unwrap(), dir.path().join("abc123.mp3"));
        assert_eq!(
            events,
            vec![
                DownloadProgress {
                    status: DownloadStatus::Downloading,
                    completion_percentage: Some("5.0%".to_string()),
                },
                DownloadProgress {
                    status: DownloadStatus::Finished,
                    completion_percentage: None,
                },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let (events, result, _dir) = run_fake(
            r#"echo 'ytmp3-progress:{"status":"downloading","_percent_str":"5.0%"}'
echo 'ytmp3-progress:{"status":"finished"}'
echo 'ERROR: Video unavailable' >&2
exit 1"#,
        );

        match result {
            Err(DownloadError::ExecutionError(msg)) => assert_eq!(msg, "ERROR: Video unavailable"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].completion_percentage.as_deref(), Some("5.0%"));
        assert_eq!(events[1].status, DownloadStatus::Finished);
    }

    #[cfg(unix)]
    #[test]
    fn test_unknown_status_kills_downloader() {
        let started = std::time::Instant::now();
        let (events, result, _dir) = run_fake(
            r#"echo 'ytmp3-progress:{"status":"paused"}'
sleep 30
exit 0"#,
        );

        assert!(matches!(result, Err(DownloadError::UnknownProgressStatus(s)) if s == "paused"));
        assert!(events.is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
