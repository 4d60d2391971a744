//! # Archive Context
//!
//! The one object the chat handlers talk to. It owns the in-memory
//! [`Archive`] together with handles to the ledger, the cloud storage and the
//! downloader, and runs the archive-or-serve flow for a link:
//!
//! 1. take the per-link lock so the same link is never archived twice,
//! 2. serve the stored record if the link is already archived,
//! 3. otherwise download, upload, fetch the download link,
//! 4. append the row to the ledger, then to the in-memory archive.
//!
//! Step 4 always writes the ledger first. If the process dies between the two
//! writes the archive is stale until the next start, when it is reloaded from
//! the ledger.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::cache::{single_flight::KeyedLocks, Archive, ArchiveRecord};
use crate::error::{ArchiveError, ArchiveResult};
use crate::ledger::Ledger;
use crate::sources::{DownloadedFile, Downloader};
use crate::storage::{remote_path, CloudStorage};

/// Paths used by the archive flow.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// Parent of the per-request temporary download directories
    pub download_dir: PathBuf,
    /// Remote folder for the stored copies, e.g. `/video_storage`
    pub storage_folder: String,
}

/// A freshly downloaded file. Dropping it deletes the local copy.
#[derive(Debug)]
pub struct DownloadedVideo {
    pub file: DownloadedFile,
    _workdir: TempDir,
}

/// Result of [`ArchiveContext::request`].
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// The link was archived before; nothing was downloaded.
    Cached(ArchiveRecord),
    /// The link was downloaded and archived by this request.
    Fresh {
        record: ArchiveRecord,
        video: DownloadedVideo,
    },
}

pub struct ArchiveContext {
    archive: RwLock<Archive>,
    ledger: Arc<dyn Ledger>,
    storage: Arc<dyn CloudStorage>,
    downloader: Arc<dyn Downloader>,
    in_flight: KeyedLocks,
    settings: ArchiveSettings,
}

impl ArchiveContext {
    pub fn new(
        archive: Archive,
        ledger: Arc<dyn Ledger>,
        storage: Arc<dyn CloudStorage>,
        downloader: Arc<dyn Downloader>,
        settings: ArchiveSettings,
    ) -> Self {
        Self {
            archive: RwLock::new(archive),
            ledger,
            storage,
            downloader,
            in_flight: KeyedLocks::new(),
            settings,
        }
    }

    /// Loads every ledger row into a new archive.
    ///
    /// A malformed row fails the whole load; the bot must not start with a
    /// partial archive.
    pub async fn bootstrap(
        ledger: Arc<dyn Ledger>,
        storage: Arc<dyn CloudStorage>,
        downloader: Arc<dyn Downloader>,
        settings: ArchiveSettings,
    ) -> ArchiveResult<Self> {
        let rows = ledger.records().await?;
        let archive = Archive::load(rows)?;

        info!(
            "📚 Archive loaded from {} ledger: {} records",
            ledger.name(),
            archive.len()
        );

        Ok(Self::new(archive, ledger, storage, downloader, settings))
    }

    /// Cache-only check, no downloads.
    pub fn lookup(&self, source_link: &str) -> Option<ArchiveRecord> {
        self.archive.read().find(source_link).ok().cloned()
    }

    /// Serves `source_link` from the archive or archives it now.
    pub async fn request(&self, source_link: &str) -> ArchiveResult<ArchiveOutcome> {
        let _guard = self.in_flight.lock(source_link).await;

        if let Some(record) = self.lookup(source_link) {
            info!("♻️ Already archived: {}", source_link);
            return Ok(ArchiveOutcome::Cached(record));
        }

        let workdir = tempfile::Builder::new()
            .prefix("video-")
            .tempdir_in(&self.settings.download_dir)
            .map_err(|e| {
                ArchiveError::ResourceUnavailable(format!(
                    "cannot create download dir in {}: {}",
                    self.settings.download_dir.display(),
                    e
                ))
            })?;

        let file = self.downloader.download(source_link, workdir.path()).await?;
        let remote = remote_path(&self.settings.storage_folder, &file.file_name());

        self.storage.upload(&file.path, &remote).await?;
        let storage_link = self.storage.download_link(&remote).await?;
        debug!("☁️ {} stored at {}", source_link, remote);

        let record = ArchiveRecord::new(
            file.title.clone(),
            file.author.clone(),
            source_link,
            storage_link,
        );

        self.ledger.append_row(record.to_row()).await?;
        self.archive.write().append(record.clone())?;

        info!("✅ Archived \"{}\" by {}", record.title, record.author);

        Ok(ArchiveOutcome::Fresh {
            record,
            video: DownloadedVideo {
                file,
                _workdir: workdir,
            },
        })
    }

    /// Record behind a menu button.
    pub fn record_at(&self, index: usize) -> ArchiveResult<ArchiveRecord> {
        self.archive.read().at(index).cloned()
    }

    /// Copy of all records, in ledger order, for menu rendering.
    pub fn snapshot(&self) -> Vec<ArchiveRecord> {
        self.archive.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.archive.read().len()
    }
}
