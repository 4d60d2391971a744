pub mod ytdlp;

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::ArchiveResult;

pub use ytdlp::YtDlpDownloader;

/// Links accepted by the bot. Only the two canonical YouTube hosts; other
/// forms of the same video are not rewritten.
const VIDEO_LINK_PATTERN: &str = r"^https?://(?:www\.youtube\.com|youtu\.be)/.*";

/// Archivo descargado junto con su metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub title: String,
    pub author: String,
}

impl DownloadedFile {
    /// File name used for the remote copy and in user messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.title.clone())
    }
}

/// Fetches a video into a local directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads the best single-file format of `source_link` into
    /// `target_dir`. Fails with `ResourceUnavailable` for missing, private
    /// or blocked videos.
    async fn download(&self, source_link: &str, target_dir: &Path) -> ArchiveResult<DownloadedFile>;
}

pub fn is_video_link(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(VIDEO_LINK_PATTERN).expect("valid video link pattern"))
        .is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_link_detection() {
        assert!(is_video_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_video_link("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_video_link("http://youtu.be/dQw4w9WgXcQ?t=42"));
        assert!(!is_video_link("https://example.com/video"));
        assert!(!is_video_link("https://music.youtube.com/watch?v=test"));
        assert!(!is_video_link("https://wwwXyoutube.com/watch?v=test"));
        assert!(!is_video_link("look: https://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn test_file_name_falls_back_to_title() {
        let file = DownloadedFile {
            path: PathBuf::from("/tmp/x/Никогда.mp4"),
            title: "Никогда".to_string(),
            author: "Автор".to_string(),
        };
        assert_eq!(file.file_name(), "Никогда.mp4");

        let bare = DownloadedFile {
            path: PathBuf::from("/"),
            ..file
        };
        assert_eq!(bare.file_name(), "Никогда");
    }
}
