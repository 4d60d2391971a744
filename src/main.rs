use anyhow::{Context as _, Result};
use serenity::{model::gateway::GatewayIntents, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod bot;
mod cache;
mod config;
mod context;
mod error;
mod ledger;
mod sources;
mod storage;
mod ui;

use crate::bot::ArchiveBot;
use crate::config::{Config, LedgerBackend};
use crate::context::{ArchiveContext, ArchiveSettings};
use crate::ledger::{JsonLedger, Ledger, SheetsLedger};
use crate::sources::YtDlpDownloader;
use crate::storage::YandexDisk;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("video_archive_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?),
        )
        .init();

    info!("📼 Starting Video Archive Bot v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    let downloader = Arc::new(YtDlpDownloader::new(
        config.ytdlp_path.clone(),
        config.max_concurrent_downloads,
    ));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        downloader.verify().await?;
        println!("OK");
        return Ok(());
    }

    if let Err(e) = downloader.verify().await {
        warn!("⚠️ yt-dlp check failed, downloads will fail: {:?}", e);
    }

    // Almacenamiento en la nube
    let disk = YandexDisk::new(
        config.yandex_disk_token.clone(),
        Duration::from_secs(config.upload_timeout_secs),
    )?;
    if let Err(e) = disk.ensure_folder(&config.storage_folder).await {
        warn!("⚠️ Could not prepare {}: {}", config.storage_folder, e);
    }

    let ledger = open_ledger(&config).await?;

    // Sin archivo consistente no arrancamos
    let settings = ArchiveSettings {
        download_dir: config.download_dir.clone(),
        storage_folder: config.storage_folder.clone(),
    };
    let archive = ArchiveContext::bootstrap(ledger, Arc::new(disk), downloader, settings)
        .await
        .context("failed to load archive from ledger")?;

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = ArchiveBot::new(config.clone(), Arc::new(archive));

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not register Ctrl+C handler: {:?}", e);
            return;
        }
        info!("⚠️ Shutdown signal received, closing...");
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot started");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}

async fn open_ledger(config: &Config) -> Result<Arc<dyn Ledger>> {
    let ledger: Arc<dyn Ledger> = match config.ledger_backend {
        LedgerBackend::Sheets => {
            let spreadsheet_id = config
                .spreadsheet_id
                .clone()
                .context("SPREADSHEET_ID is required for the sheets ledger")?;

            Arc::new(
                SheetsLedger::open(
                    &config.google_credentials,
                    spreadsheet_id,
                    config.sheet_name.clone(),
                )
                .await?,
            )
        }
        LedgerBackend::Json => Arc::new(JsonLedger::open(&config.data_dir).await?),
    };

    Ok(ledger)
}
