pub mod gateway;
pub mod notify;
pub mod realtime;
pub mod store;

pub use store::{ChatSnapshot, ConversationStore, TransientNotice};
