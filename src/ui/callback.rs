/// Action carried by a button's `custom_id`.
///
/// Record indices are positions in the archive, which only grows, so an
/// index rendered into a menu keeps pointing at the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
    /// Open the archive menu (first page).
    ShowArchive,
    /// Switch the archive menu to another page.
    ArchivePage(usize),
    /// A record was picked from the menu.
    SelectRecord(usize),
    /// Show the record's source link.
    ViewRecord(usize),
    /// Send the record's stored copy.
    DownloadRecord(usize),
}

const PREFIX: &str = "arc";

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::ShowArchive => PREFIX.to_string(),
            Self::ArchivePage(page) => format!("{PREFIX}:p:{page}"),
            Self::SelectRecord(index) => format!("{PREFIX}:s:{index}"),
            Self::ViewRecord(index) => format!("{PREFIX}:v:{index}"),
            Self::DownloadRecord(index) => format!("{PREFIX}:d:{index}"),
        }
    }

    /// `None` for ids this bot did not produce.
    pub fn decode(custom_id: &str) -> Option<Self> {
        let rest = custom_id.strip_prefix(PREFIX)?;
        if rest.is_empty() {
            return Some(Self::ShowArchive);
        }

        let (tag, value) = rest.strip_prefix(':')?.split_once(':')?;
        let value: usize = value.parse().ok()?;

        match tag {
            "p" => Some(Self::ArchivePage(value)),
            "s" => Some(Self::SelectRecord(value)),
            "v" => Some(Self::ViewRecord(value)),
            "d" => Some(Self::DownloadRecord(value)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_decodes_to_itself() {
        let actions = [
            CallbackAction::ShowArchive,
            CallbackAction::ArchivePage(3),
            CallbackAction::SelectRecord(0),
            CallbackAction::ViewRecord(17),
            CallbackAction::DownloadRecord(1024),
        ];

        for action in actions {
            assert_eq!(CallbackAction::decode(&action.encode()), Some(action));
        }
    }

    #[test]
    fn test_encoding_is_compact() {
        assert_eq!(CallbackAction::SelectRecord(1).encode(), "arc:s:1");
        assert_eq!(CallbackAction::ShowArchive.encode(), "arc");
    }

    #[test]
    fn test_foreign_ids_are_rejected() {
        for id in ["", "button_video_1", "arc:", "arc:s", "arc:s:", "arc:s:-1", "arc:x:1", "arcs:1", "arc:s:1:2"] {
            assert_eq!(CallbackAction::decode(id), None, "{id}");
        }
    }
}
