use anyhow::Result;
use serenity::{
    builder::{
        CreateAttachment, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateMessage,
    },
    model::{application::ComponentInteraction, channel::Message, id::ChannelId},
    prelude::Context,
};
use tracing::{error, info, warn};

use crate::{
    bot::ArchiveBot,
    cache::ArchiveRecord,
    context::ArchiveOutcome,
    error::ArchiveError,
    sources::is_video_link,
    ui::{
        buttons::{self, ArchiveMenu},
        embeds, messages, CallbackAction,
    },
};

/// What a text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRoute {
    Start,
    Help,
    Archive,
    Link(String),
    InvalidLink,
    Prompt,
}

impl TextRoute {
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        let command = text.split_whitespace().next().unwrap_or_default();

        match command {
            "/start" => Self::Start,
            "/help" => Self::Help,
            _ if text == messages::ARCHIVE_TRIGGER => Self::Archive,
            _ if is_video_link(text) => Self::Link(text.to_string()),
            _ if text.starts_with("http://") || text.starts_with("https://") => Self::InvalidLink,
            _ => Self::Prompt,
        }
    }
}

/// How a failed archive request is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReply {
    /// Downloader, storage or ledger failure: the user may try again.
    Retry,
    /// A button pointed at a record that no longer resolves.
    StaleRecord,
    /// Anything else. Still answered with the retry prompt, but logged as a bug.
    Unexpected,
}

impl FailureReply {
    pub fn classify(e: &ArchiveError) -> Self {
        if e.is_retryable() {
            Self::Retry
        } else if e.is_stale_reference() {
            Self::StaleRecord
        } else {
            Self::Unexpected
        }
    }

    /// Reply text. `menu` is the current archive menu text, shown again after
    /// a stale button so the user can pick another record.
    pub fn text(self, menu: &str) -> String {
        match self {
            Self::Retry | Self::Unexpected => messages::RETRY.to_string(),
            Self::StaleRecord => format!("{}\n{}", messages::STALE_RECORD, menu),
        }
    }

    pub fn shows_menu(self) -> bool {
        self == Self::StaleRecord
    }
}

/// Maneja mensajes de texto
pub async fn handle_message(ctx: &Context, msg: &Message, bot: &ArchiveBot) -> Result<()> {
    let route = TextRoute::classify(&msg.content);

    match route {
        TextRoute::Start => {
            msg.channel_id
                .send_message(
                    &ctx.http,
                    CreateMessage::new()
                        .content(messages::GREETING)
                        .components(buttons::create_start_buttons()),
                )
                .await?;
        }
        TextRoute::Help => {
            msg.channel_id.say(&ctx.http, messages::HELP).await?;
        }
        TextRoute::Archive => {
            let (content, components) = archive_menu(bot, 0);
            msg.channel_id
                .send_message(&ctx.http, CreateMessage::new().content(content).components(components))
                .await?;
        }
        TextRoute::Link(link) => handle_link(ctx, msg, bot, &link).await?,
        TextRoute::InvalidLink => {
            msg.channel_id.say(&ctx.http, messages::INVALID_LINK).await?;
        }
        TextRoute::Prompt => {
            msg.channel_id.say(&ctx.http, messages::SEND_LINK).await?;
        }
    }

    Ok(())
}

/// Archive-or-serve flow for a video link.
async fn handle_link(ctx: &Context, msg: &Message, bot: &ArchiveBot, link: &str) -> Result<()> {
    info!("🔗 {} requested {}", msg.author.name, link);

    let typing = msg.channel_id.start_typing(&ctx.http);
    let outcome = bot.archive.request(link).await;
    drop(typing);

    match outcome {
        Ok(ArchiveOutcome::Cached(record)) => {
            send_stored_copy(ctx, msg.channel_id, &record).await?;
            msg.channel_id.say(&ctx.http, messages::ALREADY_ARCHIVED).await?;
        }
        Ok(ArchiveOutcome::Fresh { record, video }) => {
            let file_name = video.file.file_name();

            match CreateAttachment::path(&video.file.path).await {
                Ok(attachment) => {
                    if let Err(e) = msg
                        .channel_id
                        .send_message(&ctx.http, CreateMessage::new().add_file(attachment))
                        .await
                    {
                        // Probably over the upload size limit; the stored copy still works.
                        warn!("⚠️ Could not attach {}: {}", file_name, e);
                        msg.channel_id.say(&ctx.http, &record.storage_link).await?;
                    }
                }
                Err(e) => {
                    warn!("⚠️ Could not read {}: {}", file_name, e);
                    msg.channel_id.say(&ctx.http, &record.storage_link).await?;
                }
            }

            msg.channel_id.say(&ctx.http, messages::downloaded(&file_name)).await?;
            msg.channel_id
                .send_message(
                    &ctx.http,
                    CreateMessage::new()
                        .content(messages::archived(&file_name))
                        .embed(embeds::create_archived_embed(&record)),
                )
                .await?;
        }
        Err(e) => {
            let reply = FailureReply::classify(&e);
            match reply {
                FailureReply::Retry => error!("❌ Error processing link {}: {}", link, e),
                _ => error!("❌ Unexpected archive error for {}: {:?}", link, e),
            }
            msg.channel_id.say(&ctx.http, reply.text("")).await?;
        }
    }

    Ok(())
}

/// Sends the archived copy as an attachment, or its link if fetching fails.
async fn send_stored_copy(ctx: &Context, channel_id: ChannelId, record: &ArchiveRecord) -> Result<()> {
    let message = match CreateAttachment::url(&ctx.http, &record.storage_link).await {
        Ok(attachment) => CreateMessage::new().add_file(attachment),
        Err(e) => {
            warn!("⚠️ Could not fetch stored copy of {}: {}", record.source_link, e);
            CreateMessage::new().content(&record.storage_link)
        }
    };

    if let Err(e) = channel_id.send_message(&ctx.http, message).await {
        warn!("⚠️ Could not send stored copy, falling back to link: {}", e);
        channel_id.say(&ctx.http, &record.storage_link).await?;
    }

    Ok(())
}

/// Content and buttons for one page of the archive menu.
fn archive_menu(bot: &ArchiveBot, page: usize) -> (String, Vec<serenity::builder::CreateActionRow>) {
    let menu = ArchiveMenu::new(&bot.archive.snapshot(), page);
    let components = if menu.is_empty() { Vec::new() } else { menu.components() };
    (menu_text(&menu), components)
}

fn menu_text(menu: &ArchiveMenu) -> String {
    if menu.is_empty() {
        messages::ARCHIVE_EMPTY.to_string()
    } else {
        messages::archive_header(menu.total_records, menu.page, menu.total_pages)
    }
}

/// Maneja interacciones con componentes (botones)
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &ArchiveBot,
) -> Result<()> {
    info!(
        "🔘 Button {} pressed by {}",
        component.data.custom_id, component.user.name
    );

    let Some(action) = CallbackAction::decode(&component.data.custom_id) else {
        component
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(messages::UNKNOWN_ACTION)
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    };

    match action {
        CallbackAction::ShowArchive => {
            let (content, components) = archive_menu(bot, 0);
            component
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content(content)
                            .components(components),
                    ),
                )
                .await?;
        }
        CallbackAction::ArchivePage(page) => {
            let (content, components) = archive_menu(bot, page);
            component
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::UpdateMessage(
                        CreateInteractionResponseMessage::new()
                            .content(content)
                            .components(components),
                    ),
                )
                .await?;
        }
        CallbackAction::SelectRecord(index) => match bot.archive.record_at(index) {
            Ok(record) => {
                component
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content(record.label())
                                .embed(embeds::create_record_embed(&record, index))
                                .components(buttons::create_record_buttons(index)),
                        ),
                    )
                    .await?;
            }
            Err(e) => respond_failure(ctx, &component, bot, e).await?,
        },
        CallbackAction::ViewRecord(index) => match bot.archive.record_at(index) {
            Ok(record) => {
                component
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new().content(record.source_link),
                        ),
                    )
                    .await?;
            }
            Err(e) => respond_failure(ctx, &component, bot, e).await?,
        },
        CallbackAction::DownloadRecord(index) => match bot.archive.record_at(index) {
            Ok(record) => {
                // Fetching the stored copy can take longer than the 3s response window.
                component
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
                    )
                    .await?;

                let followup = match CreateAttachment::url(&ctx.http, &record.storage_link).await {
                    Ok(attachment) => CreateInteractionResponseFollowup::new().add_file(attachment),
                    Err(e) => {
                        warn!("⚠️ Could not fetch stored copy of {}: {}", record.source_link, e);
                        CreateInteractionResponseFollowup::new().content(&record.storage_link)
                    }
                };

                if let Err(e) = component.create_followup(&ctx.http, followup).await {
                    warn!("⚠️ Could not send stored copy, falling back to link: {}", e);
                    component
                        .create_followup(
                            &ctx.http,
                            CreateInteractionResponseFollowup::new().content(&record.storage_link),
                        )
                        .await?;
                }
            }
            Err(e) => respond_failure(ctx, &component, bot, e).await?,
        },
    }

    Ok(())
}

/// A button whose record cannot be resolved. Stale buttons get the notice
/// and the menu again.
async fn respond_failure(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &ArchiveBot,
    e: ArchiveError,
) -> Result<()> {
    let reply = FailureReply::classify(&e);
    match reply {
        FailureReply::StaleRecord => warn!("⚠️ Stale archive button {}: {}", component.data.custom_id, e),
        _ => error!("❌ Archive button {} failed: {:?}", component.data.custom_id, e),
    }

    let mut response = CreateInteractionResponseMessage::new();
    if reply.shows_menu() {
        let (menu, components) = archive_menu(bot, 0);
        response = response.content(reply.text(&menu)).components(components);
    } else {
        response = response.content(reply.text("")).ephemeral(true);
    }

    component
        .create_response(&ctx.http, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}
