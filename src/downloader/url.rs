// URL validation - extracts the video id from a pasted YouTube link

use regex::Regex;

use super::models::VideoId;

lazy_static::lazy_static! {
    // Anchored on both ends: the whole input must be a video URL.
    static ref VIDEO_URL_RE: Regex = Regex::new(
        r"^https?://(?:www\.)?youtu(?:\.be/|be\.com/(?:watch\?v=|v/|embed/|user/(?:[\w#]+/)+))([^&#?\n]+)[^\s]*$"
    ).unwrap();
}

/// Extract the video id from a YouTube URL.
///
/// Accepts `youtu.be/<id>`, `youtube.com/watch?v=<id>`, `youtube.com/v/<id>`,
/// `youtube.com/embed/<id>` and `youtube.com/user/<segment>/.../<id>`, over
/// http or https, with or without `www.`. Anything after the id (query,
/// fragment) is dropped. Returns `None` instead of an error so callers can
/// use it as a validity check.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    VIDEO_URL_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

impl VideoId {
    pub fn from_url(url: &str) -> Option<Self> {
        extract_video_id(url)
    }
}
