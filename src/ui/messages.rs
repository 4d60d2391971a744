//! User-facing texts.

pub const GREETING: &str = "Привет! Пришли мне ссылку на видео с YouTube";

pub const HELP: &str = "Привет! Этот бот принимает ссылки на видео с YouTube \
                        и возвращает файл для скачивания видео. \
                        Напиши «Архив», чтобы посмотреть уже сохранённые видео.";

/// Text (and button label) that opens the archive menu.
pub const ARCHIVE_TRIGGER: &str = "Архив";

pub const ALREADY_ARCHIVED: &str = "Видео уже есть в архиве";

pub const RETRY: &str = "Произошла ошибка при обработке ссылки. Пожалуйста, попробуйте еще раз.";

pub const INVALID_LINK: &str = "Некорректная ссылка!!!";

pub const SEND_LINK: &str = "Введите ссылку на видео!!!";

pub const ARCHIVE_EMPTY: &str = "Архив пуст";

pub const STALE_RECORD: &str = "Эта запись больше недоступна";

pub const UNKNOWN_ACTION: &str = "Действие не распознано";

pub fn downloaded(file_name: &str) -> String {
    format!("Видео {file_name} успешно загружено")
}

pub fn archived(file_name: &str) -> String {
    format!("Видео {file_name} добавлено в архив")
}

pub fn archive_header(total_records: usize, page: usize, total_pages: usize) -> String {
    if total_pages > 1 {
        format!("📼 Архив: {total_records} видео (страница {}/{total_pages})", page + 1)
    } else {
        format!("📼 Архив: {total_records} видео")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_header() {
        assert_eq!(archive_header(2, 0, 1), "📼 Архив: 2 видео");
        assert_eq!(archive_header(25, 1, 2), "📼 Архив: 25 видео (страница 2/2)");
    }
}
