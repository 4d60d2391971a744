use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{DownloadedFile, Downloader};
use crate::error::{ArchiveError, ArchiveResult};

/// Output template relative to the target directory.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Cliente de descarga basado en yt-dlp
pub struct YtDlpDownloader {
    binary: String,
    // Limitar descargas concurrentes
    rate_limiter: Semaphore,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    #[serde(rename = "_filename")]
    private_filename: Option<String>,
    filename: Option<String>,
}

impl YtDlpInfo {
    fn author(&self) -> String {
        self.uploader
            .clone()
            .or_else(|| self.channel.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn output_path(&self) -> Option<PathBuf> {
        self.filename
            .as_ref()
            .or(self.private_filename.as_ref())
            .map(PathBuf::from)
    }
}

impl YtDlpDownloader {
    pub fn new(binary: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            binary: binary.into(),
            rate_limiter: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Checks that the yt-dlp binary runs and returns its version.
    pub async fn verify(&self) -> anyhow::Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("could not run {}", self.binary))?;

        if !output.status.success() {
            anyhow::bail!("{} --version exited with {}", self.binary, output.status);
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("✅ yt-dlp version: {}", version);
        Ok(version)
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, source_link: &str, target_dir: &Path) -> ArchiveResult<DownloadedFile> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| ArchiveError::ResourceUnavailable(e.to_string()))?;

        info!("📥 Downloading {}", source_link);

        let template = target_dir.join(OUTPUT_TEMPLATE);
        let output = Command::new(&self.binary)
            .args([
                "--no-playlist",
                "--no-warnings",
                "--no-progress",
                "-f",
                "best",
                "--dump-json",
                "--no-simulate",
                "--socket-timeout",
                "30",
                "--retries",
                "3",
                "-o",
            ])
            .arg(&template)
            .arg(source_link)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                warn!("❌ Could not run {}: {}", self.binary, e);
                ArchiveError::ResourceUnavailable(format!("{}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArchiveError::ResourceUnavailable(error_reason(&stderr)));
        }

        let info = parse_info(&String::from_utf8_lossy(&output.stdout))?;
        let path = info
            .output_path()
            .ok_or_else(|| ArchiveError::ResourceUnavailable("yt-dlp reported no file name".to_string()))?;

        if tokio::fs::metadata(&path).await.is_err() {
            return Err(ArchiveError::ResourceUnavailable(format!(
                "downloaded file missing: {}",
                path.display()
            )));
        }

        debug!("📦 {} -> {}", source_link, path.display());

        Ok(DownloadedFile {
            author: info.author(),
            title: info.title,
            path,
        })
    }
}

/// Takes the last JSON line; yt-dlp prints one object per video.
fn parse_info(stdout: &str) -> ArchiveResult<YtDlpInfo> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| ArchiveError::ResourceUnavailable("yt-dlp returned no metadata".to_string()))?;

    serde_json::from_str(line)
        .map_err(|e| ArchiveError::ResourceUnavailable(format!("unreadable yt-dlp metadata: {e}")))
}

/// Picks the `ERROR:` line out of yt-dlp's stderr.
fn error_reason(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "yt-dlp failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_prefers_filename() {
        let stdout = r#"{"id": "abc", "title": "Clip", "uploader": "Chan", "_filename": "/tmp/a/Clip.webm", "filename": "/tmp/a/Clip.mp4"}"#;

        let info = parse_info(stdout).unwrap();
        assert_eq!(info.title, "Clip");
        assert_eq!(info.author(), "Chan");
        assert_eq!(info.output_path(), Some(PathBuf::from("/tmp/a/Clip.mp4")));
    }

    #[test]
    fn test_parse_info_author_fallbacks() {
        let info = parse_info(r#"{"title": "Clip", "channel": "Chan", "_filename": "x.mp4"}"#).unwrap();
        assert_eq!(info.author(), "Chan");
        assert_eq!(info.output_path(), Some(PathBuf::from("x.mp4")));

        let info = parse_info(r#"{"title": "Clip"}"#).unwrap();
        assert_eq!(info.author(), "Unknown");
        assert_eq!(info.output_path(), None);
    }

    #[test]
    fn test_parse_info_skips_noise() {
        let stdout = "[youtube] abc: Downloading webpage\n{\"title\": \"Clip\", \"filename\": \"c.mp4\"}\n";
        assert_eq!(parse_info(stdout).unwrap().title, "Clip");
        assert!(matches!(parse_info(""), Err(ArchiveError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_error_reason() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Private video. Sign in if you've been granted access\n";
        assert_eq!(
            error_reason(stderr),
            "ERROR: [youtube] abc: Private video. Sign in if you've been granted access"
        );
        assert_eq!(error_reason("boom\n"), "boom");
        assert_eq!(error_reason(""), "yt-dlp failed");
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let downloader = YtDlpDownloader::new("/nonexistent/yt-dlp", 1);
        let dir = tempfile::TempDir::new().unwrap();

        let err = downloader
            .download("https://youtu.be/abc", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::ResourceUnavailable(_)));
        assert!(downloader.verify().await.is_err());
    }
}
