pub mod buttons;
pub mod callback;
pub mod embeds;
pub mod messages;

pub use callback::CallbackAction;
