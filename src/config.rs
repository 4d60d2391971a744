use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;

/// Where archive rows are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Sheets,
    Json,
}

impl FromStr for LedgerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" | "google" | "google-sheets" => Ok(Self::Sheets),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown LEDGER_BACKEND '{}', expected 'sheets' or 'json'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub channel_id: Option<u64>, // Solo escuchar este canal (los DMs siempre)

    // Almacenamiento
    pub yandex_disk_token: String,
    pub storage_folder: String,
    pub upload_timeout_secs: u64,

    // Ledger
    pub ledger_backend: LedgerBackend,
    pub google_credentials: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,

    // Descargas
    pub ytdlp_path: String,
    pub max_concurrent_downloads: usize,

    // Paths
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Create directories if they don't exist
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.download_dir)?;

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Builds the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} must be set", key))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            // Discord
            discord_token: required("DISCORD_TOKEN")?,
            channel_id: lookup("CHANNEL_ID").and_then(|s| s.parse().ok()),

            // Almacenamiento
            yandex_disk_token: required("YANDEX_DISK_TOKEN")?,
            storage_folder: or_default("STORAGE_FOLDER", "/video_storage"),
            upload_timeout_secs: or_default("UPLOAD_TIMEOUT_SECS", "60").parse()?,

            // Ledger
            ledger_backend: or_default("LEDGER_BACKEND", "sheets").parse()?,
            google_credentials: or_default("GOOGLE_CREDENTIALS", "credentials.json").into(),
            spreadsheet_id: lookup("SPREADSHEET_ID").filter(|v| !v.trim().is_empty()),
            sheet_name: or_default("SHEET_NAME", "Sheet1"),

            // Descargas
            ytdlp_path: or_default("YTDLP_PATH", "yt-dlp"),
            max_concurrent_downloads: or_default("MAX_CONCURRENT_DOWNLOADS", "2").parse()?,

            // Paths
            data_dir: or_default("DATA_DIR", "./data").into(),
            download_dir: or_default("DOWNLOAD_DIR", "./downloads").into(),
        })
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Upload timeout and download concurrency must be greater than 0
    /// - The storage folder must be an absolute Disk path
    /// - The Google Sheets backend needs a spreadsheet id
    pub fn validate(&self) -> Result<()> {
        if self.upload_timeout_secs == 0 {
            anyhow::bail!("Upload timeout must be greater than 0");
        }

        if self.max_concurrent_downloads == 0 {
            anyhow::bail!("Max concurrent downloads must be greater than 0");
        }

        if !self.storage_folder.starts_with('/') {
            anyhow::bail!(
                "Storage folder must be an absolute path, got: {}",
                self.storage_folder
            );
        }

        if self.ledger_backend == LedgerBackend::Sheets && self.spreadsheet_id.is_none() {
            anyhow::bail!("SPREADSHEET_ID is required when LEDGER_BACKEND=sheets");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Tokens are left out.
    pub fn summary(&self) -> String {
        let ledger = match self.ledger_backend {
            LedgerBackend::Sheets => format!(
                "Google Sheets {} ({})",
                self.spreadsheet_id.as_deref().unwrap_or("-"),
                self.sheet_name
            ),
            LedgerBackend::Json => format!("JSON in {}", self.data_dir.display()),
        };

        format!(
            "Config Summary:\n  \
            Discord: channel {}\n  \
            Ledger: {}\n  \
            Storage: Yandex Disk {} ({}s upload timeout)\n  \
            Downloads: {} (max {} at once) into {}",
            self.channel_id.map_or("any".to_string(), |id| id.to_string()),
            ledger,
            self.storage_folder,
            self.upload_timeout_secs,
            self.ytdlp_path,
            self.max_concurrent_downloads,
            self.download_dir.display()
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            channel_id: None,

            yandex_disk_token: String::new(),
            storage_folder: "/video_storage".to_string(),
            upload_timeout_secs: 60,

            ledger_backend: LedgerBackend::Json,
            google_credentials: "credentials.json".into(),
            spreadsheet_id: None,
            sheet_name: "Sheet1".to_string(),

            ytdlp_path: "yt-dlp".to_string(),
            max_concurrent_downloads: 2,

            data_dir: "./data".into(),
            download_dir: "./downloads".into(),
        }
    }
}
