use thiserror::Error;

/// Errors produced by the archive and its collaborators.
///
/// Request-time failures of the external services (`ResourceUnavailable`,
/// `StorageRequest`, `LedgerRequest`) are caught at the chat handler and turned
/// into a retry prompt. `MalformedRecord` only appears while loading the ledger
/// at startup and aborts the process.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("video unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("storage request failed: {0}")]
    StorageRequest(String),

    #[error("ledger request failed: {0}")]
    LedgerRequest(String),

    /// `row` is the 1-based ledger row number (the header is row 1).
    #[error("malformed ledger row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("no archived record for {0}")]
    NotFound(String),

    #[error("archive index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("source link already archived: {0}")]
    DuplicateRecord(String),
}

impl ArchiveError {
    /// Failures the user can simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ResourceUnavailable(_) | Self::StorageRequest(_) | Self::LedgerRequest(_)
        )
    }

    /// Lookups that went stale between rendering a menu and pressing a button.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::IndexOutOfRange { .. })
    }
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        Self::StorageRequest(e.to_string())
    }
}

pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ArchiveError::ResourceUnavailable("private".into()).is_retryable());
        assert!(ArchiveError::StorageRequest("quota".into()).is_retryable());
        assert!(ArchiveError::LedgerRequest("503".into()).is_retryable());
        assert!(!ArchiveError::NotFound("L1".into()).is_retryable());

        assert!(ArchiveError::IndexOutOfRange { index: 3, len: 2 }.is_stale_reference());
        assert!(!ArchiveError::DuplicateRecord("L1".into()).is_stale_reference());
    }

    #[test]
    fn test_malformed_record_message() {
        let err = ArchiveError::MalformedRecord {
            row: 3,
            reason: "expected 4 fields, got 3".into(),
        };
        assert_eq!(err.to_string(), "malformed ledger row 3: expected 4 fields, got 3");
    }
}
