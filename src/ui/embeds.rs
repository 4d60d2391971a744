use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::cache::ArchiveRecord;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "📼 Video Archive Bot";

/// Card shown after a record is picked from the archive menu.
pub fn create_record_embed(record: &ArchiveRecord, index: usize) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("📼 {}", record.title))
        .url(&record.source_link)
        .color(colors::INFO_BLUE)
        .field("🎤 Автор", &record.author, true)
        .field("#️⃣ Номер", (index + 1).to_string(), true)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Card sent next to a freshly archived video.
pub fn create_archived_embed(record: &ArchiveRecord) -> CreateEmbed {
    CreateEmbed::default()
        .title("✅ Видео добавлено в архив")
        .description(format!("**{}**", record.title))
        .url(&record.source_link)
        .color(colors::SUCCESS_GREEN)
        .field("🎤 Автор", &record.author, true)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}
