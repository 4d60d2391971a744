use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{strip_header, Ledger, HEADER};
use crate::cache::RECORD_FIELDS;
use crate::error::{ArchiveError, ArchiveResult};

/// Ledger stored as a JSON array of rows, header first.
///
/// ```json
/// [["Название", "Автор", "Ссылка на видео", "Ссылка на архив"],
///  ["T1", "A1", "https://youtu.be/x", "https://downloader.disk.yandex.ru/..."]]
/// ```
pub struct JsonLedger {
    path: PathBuf,
    // Serializa lectura-modificación-escritura del archivo
    write_lock: Mutex<()>,
}

impl JsonLedger {
    /// Opens `<data_dir>/ledger.json`, creating it with a header if missing.
    pub async fn open(data_dir: &Path) -> ArchiveResult<Self> {
        fs::create_dir_all(data_dir).await.map_err(io_error)?;

        let path = data_dir.join("ledger.json");
        let ledger = Self {
            path,
            write_lock: Mutex::new(()),
        };

        if !fs::try_exists(&ledger.path).await.map_err(io_error)? {
            let header = vec![HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
            ledger.write_rows(&header).await?;
            info!("📝 Ledger created at {}", ledger.path.display());
        } else {
            info!("📁 Ledger opened at {}", ledger.path.display());
        }

        Ok(ledger)
    }

    async fn read_rows(&self) -> ArchiveResult<Vec<Vec<String>>> {
        let content = fs::read_to_string(&self.path).await.map_err(io_error)?;
        serde_json::from_str(&content)
            .map_err(|e| ArchiveError::LedgerRequest(format!("{}: {}", self.path.display(), e)))
    }

    /// Writes to a sibling temp file and renames it over the ledger.
    async fn write_rows(&self, rows: &[Vec<String>]) -> ArchiveResult<()> {
        let content = serde_json::to_string_pretty(rows)
            .map_err(|e| ArchiveError::LedgerRequest(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await.map_err(io_error)?;
        fs::rename(&tmp, &self.path).await.map_err(io_error)?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for JsonLedger {
    async fn records(&self) -> ArchiveResult<Vec<Vec<String>>> {
        Ok(strip_header(self.read_rows().await?))
    }

    async fn append_row(&self, row: [String; RECORD_FIELDS]) -> ArchiveResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut rows = self.read_rows().await?;
        rows.push(row.to_vec());
        self.write_rows(&rows).await?;

        debug!("💾 Row {} appended to {}", rows.len(), self.path.display());
        Ok(())
    }

    async fn column_values(&self, column: usize) -> ArchiveResult<Vec<String>> {
        if column == 0 {
            return Err(ArchiveError::LedgerRequest("columns are 1-based".to_string()));
        }

        let rows = self.read_rows().await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| (row.len() >= column).then(|| row.swap_remove(column - 1)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

fn io_error(e: std::io::Error) -> ArchiveError {
    ArchiveError::LedgerRequest(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn row(title: &str, link: &str) -> [String; RECORD_FIELDS] {
        [
            title.to_string(),
            "Author".to_string(),
            link.to_string(),
            format!("https://storage/{title}"),
        ]
    }

    #[tokio::test]
    async fn test_new_ledger_has_only_header() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::open(dir.path()).await.unwrap();

        assert!(ledger.records().await.unwrap().is_empty());
        assert_eq!(ledger.column_values(1).await.unwrap(), vec![HEADER[0].to_string()]);
    }

    #[tokio::test]
    async fn test_appended_rows_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let ledger = JsonLedger::open(dir.path()).await.unwrap();
            ledger.append_row(row("T1", "L1")).await.unwrap();
            ledger.append_row(row("T2", "L2")).await.unwrap();
        }

        let ledger = JsonLedger::open(dir.path()).await.unwrap();
        let records = ledger.records().await.unwrap();

        assert_eq!(records, vec![row("T1", "L1").to_vec(), row("T2", "L2").to_vec()]);
        assert_eq!(
            ledger.column_values(3).await.unwrap(),
            vec![HEADER[2].to_string(), "L1".to_string(), "L2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_ledger_error() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::open(dir.path()).await.unwrap();
        fs::write(dir.path().join("ledger.json"), "not json").await.unwrap();

        assert!(matches!(ledger.records().await, Err(ArchiveError::LedgerRequest(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_ledger_is_not_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        // Self-referencing link: stat fails with ELOOP, not NotFound.
        std::os::unix::fs::symlink(&path, &path).unwrap();

        let result = JsonLedger::open(dir.path()).await;

        assert!(matches!(result, Err(ArchiveError::LedgerRequest(_))));
        assert!(std::fs::symlink_metadata(&path).unwrap().file_type().is_symlink());
    }

    #[tokio::test]
    async fn test_column_zero_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::open(dir.path()).await.unwrap();

        assert!(ledger.column_values(0).await.is_err());
    }
}
