//! # Storage Module
//!
//! Cloud storage for the archived copies. A video is uploaded once under
//! `<folder>/<file name>` (overwriting anything already there) and later
//! served through the download link returned by the backend.

pub mod yandex_disk;

use async_trait::async_trait;
use std::path::Path;

use crate::error::ArchiveResult;

pub use yandex_disk::YandexDisk;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CloudStorage: Send + Sync {
    /// Uploads `local` to `remote_path`, replacing an existing file.
    async fn upload(&self, local: &Path, remote_path: &str) -> ArchiveResult<()>;

    /// Returns a link the stored file can be downloaded from.
    async fn download_link(&self, remote_path: &str) -> ArchiveResult<String>;
}

/// `/video_storage/` + `clip.mp4` -> `/video_storage/clip.mp4`
pub fn remote_path(folder: &str, file_name: &str) -> String {
    format!("{}/{}", folder.trim_end_matches('/'), file_name)
}
