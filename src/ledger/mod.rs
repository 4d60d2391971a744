//! # Ledger Module
//!
//! Durable, tabular store of archived videos. One row per video with the
//! columns `title | author | source_link | storage_link`, preceded by a
//! header row. The in-memory [`Archive`](crate::cache::Archive) is rebuilt
//! from here on every start.
//!
//! Two backends are available, selected with `LEDGER_BACKEND`:
//!
//! - [`SheetsLedger`]: a Google Sheets worksheet (service-account auth)
//! - [`JsonLedger`]: a local JSON file, handy for development

pub mod json;
pub mod sheets;

use async_trait::async_trait;

use crate::cache::RECORD_FIELDS;
use crate::error::ArchiveResult;

pub use json::JsonLedger;
pub use sheets::SheetsLedger;

/// Labels written as the first row of a fresh ledger.
pub const HEADER: [&str; RECORD_FIELDS] = ["Название", "Автор", "Ссылка на видео", "Ссылка на архив"];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every row except the header, in ledger order.
    async fn records(&self) -> ArchiveResult<Vec<Vec<String>>>;

    /// Appends one row durably.
    async fn append_row(&self, row: [String; RECORD_FIELDS]) -> ArchiveResult<()>;

    /// All values of a 1-based column, header included.
    async fn column_values(&self, column: usize) -> ArchiveResult<Vec<String>>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Drops the header row from a full table dump.
pub(crate) fn strip_header(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    if !rows.is_empty() {
        rows.remove(0);
    }
    rows
}
