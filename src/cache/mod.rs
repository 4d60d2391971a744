//! # Cache Module
//!
//! In-memory mirror of the archive ledger.
//!
//! The ledger (a spreadsheet or a JSON file) is the durable source of truth.
//! At startup every ledger row except the header is loaded into an
//! [`Archive`], which then answers "was this link archived already?" without
//! touching the network, and resolves menu button indices back to records.
//!
//! ## Invariants
//!
//! - Records keep ledger order (oldest first). Nothing is ever removed or
//!   reordered, so an index handed out in a menu stays valid for the life of
//!   the process.
//! - `source_link` is the dedup key. Lookups use exact string equality:
//!   `https://youtu.be/x` and `https://www.youtube.com/watch?v=x` are two
//!   different keys.
//! - A record is appended here only after the ledger append succeeded, so the
//!   mirror is always a prefix of the ledger. If the process dies in between,
//!   the next startup reload picks the row up.
//!
//! ## Example
//!
//! ```text
//! let mut archive = Archive::default();
//! archive.append(ArchiveRecord::new("T1", "A1", "L1", "S1"))?;
//!
//! assert!(archive.contains("L1"));
//! assert_eq!(archive.at(0)?.storage_link, "S1");
//! ```

pub mod single_flight;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{ArchiveError, ArchiveResult};

/// Number of columns in a ledger row.
pub const RECORD_FIELDS: usize = 4;

/// One archived video, as stored in a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Video title
    pub title: String,
    /// Uploader or channel name
    pub author: String,
    /// Link the user submitted; unique key of the archive
    pub source_link: String,
    /// Download link of the stored copy
    pub storage_link: String,
}

impl ArchiveRecord {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        source_link: impl Into<String>,
        storage_link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            source_link: source_link.into(),
            storage_link: storage_link.into(),
        }
    }

    /// Parses a ledger row. `row_number` is only used for the error.
    pub fn from_row(row_number: usize, row: &[String]) -> ArchiveResult<Self> {
        match row {
            [title, author, source_link, storage_link] => {
                if source_link.trim().is_empty() {
                    return Err(ArchiveError::MalformedRecord {
                        row: row_number,
                        reason: "empty source link".to_string(),
                    });
                }
                Ok(Self::new(
                    title.clone(),
                    author.clone(),
                    source_link.clone(),
                    storage_link.clone(),
                ))
            }
            _ => Err(ArchiveError::MalformedRecord {
                row: row_number,
                reason: format!("expected {} fields, got {}", RECORD_FIELDS, row.len()),
            }),
        }
    }

    /// Ledger column order: title, author, source link, storage link.
    pub fn to_row(&self) -> [String; RECORD_FIELDS] {
        [
            self.title.clone(),
            self.author.clone(),
            self.source_link.clone(),
            self.storage_link.clone(),
        ]
    }

    /// Label used for menu buttons.
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }
}

/// Ordered, append-only collection of archived records.
///
/// Backed by a `Vec` in ledger order plus a `source_link -> index` map for
/// lookups. Both are only modified together in [`Archive::append`].
#[derive(Debug, Default, Clone)]
pub struct Archive {
    records: Vec<ArchiveRecord>,
    index: HashMap<String, usize>,
}

impl Archive {
    /// Builds the archive from ledger rows, header already stripped.
    ///
    /// Every row must have exactly four fields. Error row numbers are
    /// 1-based ledger rows, so the first data row is reported as row 2.
    ///
    /// If the ledger already holds the same link twice, both rows keep their
    /// position and lookups resolve to the first one.
    pub fn load<R>(rows: impl IntoIterator<Item = R>) -> ArchiveResult<Self>
    where
        R: AsRef<[String]>,
    {
        let mut archive = Self::default();

        for (offset, row) in rows.into_iter().enumerate() {
            let record = ArchiveRecord::from_row(offset + 2, row.as_ref())?;
            let position = archive.records.len();

            if archive.index.contains_key(&record.source_link) {
                warn!(
                    "⚠️ Duplicate source link in ledger row {}: {}",
                    offset + 2,
                    record.source_link
                );
            } else {
                archive.index.insert(record.source_link.clone(), position);
            }
            archive.records.push(record);
        }

        debug!("Archive loaded with {} records", archive.records.len());
        Ok(archive)
    }

    pub fn contains(&self, source_link: &str) -> bool {
        self.index.contains_key(source_link)
    }

    pub fn find(&self, source_link: &str) -> ArchiveResult<&ArchiveRecord> {
        self.position(source_link)
            .map(|i| &self.records[i])
            .ok_or_else(|| ArchiveError::NotFound(source_link.to_string()))
    }

    /// Position of the record for `source_link`, if archived.
    pub fn position(&self, source_link: &str) -> Option<usize> {
        self.index.get(source_link).copied()
    }

    /// Adds a record at the end. The caller persists it to the ledger first.
    pub fn append(&mut self, record: ArchiveRecord) -> ArchiveResult<()> {
        if self.contains(&record.source_link) {
            return Err(ArchiveError::DuplicateRecord(record.source_link));
        }

        let position = self.records.len();
        self.index.insert(record.source_link.clone(), position);
        self.records.push(record);
        Ok(())
    }

    pub fn at(&self, index: usize) -> ArchiveResult<&ArchiveRecord> {
        self.records.get(index).ok_or(ArchiveError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn two_rows() -> Vec<Vec<String>> {
        vec![row(&["T1", "A1", "L1", "S1"]), row(&["T2", "A2", "L2", "S2"])]
    }

    #[test]
    fn test_append_to_empty_archive() {
        let mut archive = Archive::default();
        archive
            .append(ArchiveRecord::new("T1", "A1", "L1", "S1"))
            .unwrap();

        assert!(archive.contains("L1"));
        assert_eq!(archive.at(0).unwrap(), &ArchiveRecord::new("T1", "A1", "L1", "S1"));
        assert!(matches!(archive.find("L2"), Err(ArchiveError::NotFound(link)) if link == "L2"));
    }

    #[test]
    fn test_load_two_rows() {
        let archive = Archive::load(two_rows()).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.at(1).unwrap(), &ArchiveRecord::new("T2", "A2", "L2", "S2"));
        let labels: Vec<String> = archive.iter().map(ArchiveRecord::label).collect();
        assert_eq!(labels, vec!["T1 - A1", "T2 - A2"]);
    }

    #[test]
    fn test_load_then_find_every_record() {
        let rows = two_rows();
        let archive = Archive::load(&rows).unwrap();

        for fields in &rows {
            let record = archive.find(&fields[2]).unwrap();
            assert_eq!(record.to_row().to_vec(), *fields);
        }
    }

    #[test]
    fn test_contains_only_appended_links() {
        let mut archive = Archive::default();
        let links: Vec<String> = (0..50).map(|i| format!("https://youtu.be/{i}")).collect();

        for (i, link) in links.iter().enumerate() {
            archive
                .append(ArchiveRecord::new(format!("T{i}"), "A", link.clone(), "S"))
                .unwrap();
        }

        assert!(links.iter().all(|link| archive.contains(link)));
        assert!(!archive.contains("https://youtu.be/50"));
        assert!(!archive.contains(""));
    }

    #[test]
    fn test_positional_access_in_insertion_order() {
        let mut archive = Archive::default();
        for i in 0..5 {
            archive
                .append(ArchiveRecord::new(format!("T{i}"), "A", format!("L{i}"), "S"))
                .unwrap();
        }

        for i in 0..5 {
            assert_eq!(archive.at(i).unwrap().source_link, format!("L{i}"));
        }
        assert!(matches!(
            archive.at(5),
            Err(ArchiveError::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_reads_are_idempotent() {
        let archive = Archive::load(two_rows()).unwrap();

        let first = (archive.contains("L2"), archive.find("L2").unwrap().clone(), archive.at(0).unwrap().clone());
        for _ in 0..3 {
            assert_eq!(archive.contains("L2"), first.0);
            assert_eq!(archive.find("L2").unwrap(), &first.1);
            assert_eq!(archive.at(0).unwrap(), &first.2);
        }
    }

    #[test]
    fn test_link_variants_are_not_unified() {
        let mut archive = Archive::default();
        archive
            .append(ArchiveRecord::new("T", "A", "https://youtu.be/abc", "S"))
            .unwrap();

        assert!(!archive.contains("https://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn test_duplicate_append_is_rejected() {
        let mut archive = Archive::load(two_rows()).unwrap();

        let err = archive
            .append(ArchiveRecord::new("Other", "Other", "L1", "S9"))
            .unwrap_err();

        assert!(matches!(err, ArchiveError::DuplicateRecord(link) if link == "L1"));
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.find("L1").unwrap().storage_link, "S1");
    }

    #[test]
    fn test_load_rejects_short_row() {
        let rows = vec![row(&["T1", "A1", "L1", "S1"]), row(&["T2", "A2", "L2"])];

        let err = Archive::load(rows).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedRecord { row: 3, .. }));
    }

    #[test]
    fn test_load_rejects_empty_source_link() {
        let err = Archive::load(vec![row(&["T1", "A1", " ", "S1"])]).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedRecord { row: 2, .. }));
    }

    #[test]
    fn test_load_keeps_ledger_duplicates_in_place() {
        let rows = vec![
            row(&["T1", "A1", "L1", "S1"]),
            row(&["T1 again", "A1", "L1", "S1b"]),
        ];
        let archive = Archive::load(rows).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.find("L1").unwrap().storage_link, "S1");
        assert_eq!(archive.at(1).unwrap().title, "T1 again");
    }
}
