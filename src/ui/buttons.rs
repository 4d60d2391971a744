use serenity::{all::ButtonStyle, builder::{CreateActionRow, CreateButton}};

use super::callback::CallbackAction;
use crate::cache::ArchiveRecord;

/// Discord allows 5 rows of 5 buttons; one row is kept for navigation.
pub const BUTTONS_PER_ROW: usize = 5;
pub const RECORDS_PER_PAGE: usize = 20;

/// Discord's limit for button labels.
const MAX_LABEL_CHARS: usize = 80;

/// A button before it is turned into a Discord component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub action: CallbackAction,
}

/// One page of the archive menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMenu {
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub items: Vec<MenuButton>,
}

impl ArchiveMenu {
    /// Builds page `page` (clamped to the last page) over `records`.
    pub fn new(records: &[ArchiveRecord], page: usize) -> Self {
        let total_pages = records.len().div_ceil(RECORDS_PER_PAGE).max(1);
        let page = page.min(total_pages - 1);
        let start = page * RECORDS_PER_PAGE;

        let items = records
            .iter()
            .enumerate()
            .skip(start)
            .take(RECORDS_PER_PAGE)
            .map(|(index, record)| MenuButton {
                label: truncate_label(&record.label()),
                action: CallbackAction::SelectRecord(index),
            })
            .collect();

        Self {
            page,
            total_pages,
            total_records: records.len(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_navigation(&self) -> bool {
        self.total_pages > 1
    }

    /// Record buttons in rows of five, plus a `◀ ▶` row when paged.
    pub fn components(&self) -> Vec<CreateActionRow> {
        let mut rows: Vec<CreateActionRow> = self
            .items
            .chunks(BUTTONS_PER_ROW)
            .map(|chunk| {
                CreateActionRow::Buttons(
                    chunk
                        .iter()
                        .map(|item| {
                            CreateButton::new(item.action.encode())
                                .label(&item.label)
                                .style(ButtonStyle::Secondary)
                        })
                        .collect(),
                )
            })
            .collect();

        if self.has_navigation() {
            let prev_btn = CreateButton::new(CallbackAction::ArchivePage(self.page.saturating_sub(1)).encode())
                .emoji('◀')
                .style(ButtonStyle::Primary)
                .disabled(self.page == 0);

            let next_btn = CreateButton::new(CallbackAction::ArchivePage(self.page + 1).encode())
                .emoji('▶')
                .style(ButtonStyle::Primary)
                .disabled(self.page + 1 >= self.total_pages);

            rows.push(CreateActionRow::Buttons(vec![prev_btn, next_btn]));
        }

        rows
    }
}

/// Entry point shown with the greeting.
pub fn create_start_buttons() -> Vec<CreateActionRow> {
    let archive_btn = CreateButton::new(CallbackAction::ShowArchive.encode())
        .label(super::messages::ARCHIVE_TRIGGER)
        .emoji('📼')
        .style(ButtonStyle::Primary);

    vec![CreateActionRow::Buttons(vec![archive_btn])]
}

/// Actions for a record picked from the menu.
pub fn create_record_buttons(index: usize) -> Vec<CreateActionRow> {
    let view_btn = CreateButton::new(CallbackAction::ViewRecord(index).encode())
        .label("Ссылка на видео")
        .emoji('🔗')
        .style(ButtonStyle::Secondary);

    let download_btn = CreateButton::new(CallbackAction::DownloadRecord(index).encode())
        .label("Скачать")
        .emoji('📥')
        .style(ButtonStyle::Success);

    let back_btn = CreateButton::new(CallbackAction::ShowArchive.encode())
        .label("К архиву")
        .style(ButtonStyle::Secondary);

    vec![CreateActionRow::Buttons(vec![view_btn, download_btn, back_btn])]
}

/// Cuts a label to Discord's limit on a char boundary.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }

    let mut cut: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn records(n: usize) -> Vec<ArchiveRecord> {
        (0..n)
            .map(|i| ArchiveRecord::new(format!("T{}", i + 1), format!("A{}", i + 1), format!("L{i}"), format!("S{i}")))
            .collect()
    }

    #[test]
    fn test_two_record_menu() {
        let menu = ArchiveMenu::new(&records(2), 0);

        assert_eq!(
            menu.items,
            vec![
                MenuButton {
                    label: "T1 - A1".to_string(),
                    action: CallbackAction::SelectRecord(0),
                },
                MenuButton {
                    label: "T2 - A2".to_string(),
                    action: CallbackAction::SelectRecord(1),
                },
            ]
        );
        assert!(!menu.has_navigation());
        assert_eq!(menu.components().len(), 1);
    }

    #[test]
    fn test_paging() {
        let all = records(25);

        let first = ArchiveMenu::new(&all, 0);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), RECORDS_PER_PAGE);
        assert_eq!(first.components().len(), 5);

        let second = ArchiveMenu::new(&all, 1);
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[0].action, CallbackAction::SelectRecord(20));
        assert_eq!(second.components().len(), 2);
    }

    #[test]
    fn test_page_is_clamped() {
        let menu = ArchiveMenu::new(&records(3), 7);
        assert_eq!(menu.page, 0);
        assert_eq!(menu.items.len(), 3);
    }

    #[test]
    fn test_empty_archive_menu() {
        let menu = ArchiveMenu::new(&[], 0);
        assert!(menu.is_empty());
        assert_eq!(menu.total_pages, 1);
        assert!(menu.components().is_empty());
    }

    #[test]
    fn test_truncate_label_on_char_boundary() {
        let short = "Короткое видео - Автор";
        assert_eq!(truncate_label(short), short);

        let long = "Очень длинное название ".repeat(10);
        let cut = truncate_label(&long);
        assert_eq!(cut.chars().count(), MAX_LABEL_CHARS);
        assert!(cut.ends_with('…'));
    }
}
