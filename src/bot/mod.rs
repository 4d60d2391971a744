//! # Bot Module
//!
//! Discord front end of the video archive.
//!
//! ## Architecture
//!
//! [`ArchiveBot`] implements Serenity's [`EventHandler`] and holds the
//! [`ArchiveContext`] behind an [`Arc`]. Every event runs on its own task, so
//! two users can send the same link at the same time; the context serializes
//! those requests per link.
//!
//! - Text messages go through [`handlers::handle_message`]
//! - Button presses go through [`handlers::handle_component`]
//!
//! Errors from a single event are logged and never stop the bot.

use serenity::{
    all::{ActivityData, Context, EventHandler, Interaction, Message, Ready},
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod handlers;

use crate::{config::Config, context::ArchiveContext};

pub struct ArchiveBot {
    /// Bot configuration loaded from environment variables
    config: Arc<Config>,
    /// Archive plus ledger, storage and downloader handles
    pub archive: Arc<ArchiveContext>,
}

impl ArchiveBot {
    pub fn new(config: Config, archive: Arc<ArchiveContext>) -> Self {
        Self {
            config: Arc::new(config),
            archive,
        }
    }

    /// Guild messages are only handled in the configured channel, if any.
    /// Direct messages are always handled.
    fn listens_to(&self, msg: &Message) -> bool {
        match (msg.guild_id, self.config.channel_id) {
            (None, _) | (Some(_), None) => true,
            (Some(_), Some(channel)) => msg.channel_id.get() == channel,
        }
    }
}

#[async_trait]
impl EventHandler for ArchiveBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} is online!", ready.user.name);
        info!("📊 Connected to {} servers", ready.guilds.len());
        info!("📚 {} videos in the archive", self.archive.len());

        ctx.set_activity(Some(ActivityData::listening("ссылки на видео")));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !self.listens_to(&msg) {
            return;
        }

        debug!("💬 Message from {} in {}", msg.author.name, msg.channel_id);

        if let Err(e) = handlers::handle_message(&ctx, &msg, self).await {
            error!("Error handling message: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if let Err(e) = handlers::handle_component(&ctx, component, self).await {
                error!("Error handling component: {:?}", e);
            }
        }
    }
}
