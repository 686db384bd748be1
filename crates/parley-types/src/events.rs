use serde::{Deserialize, Serialize};

use crate::models::{Message, Reaction};

/// Events pushed by the realtime channel, as a closed union.
///
/// Every push-derived mutation enters the store through exactly one of
/// these variants, dispatched by a single typed handler — there is no
/// per-event-name callback registry to keep consistent. Variant names
/// match the channel's wire event names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    /// A message addressed to this client was posted. The payload is
    /// enriched with `senderName` and `profilePic` for notification use.
    NewMessage(Message),

    /// The sender started typing in their conversation with this client.
    #[serde(rename_all = "camelCase")]
    Typing { sender_id: String },

    /// The sender stopped typing.
    #[serde(rename_all = "camelCase")]
    StopTyping { sender_id: String },

    /// The reader opened the conversation: every message they received
    /// is now read.
    #[serde(rename_all = "camelCase")]
    MessagesRead { reader_id: String },

    /// A message's reaction list changed. Carries the full new list,
    /// never a delta.
    #[serde(rename_all = "camelCase")]
    ReactionUpdated {
        message_id: String,
        reactions: Vec<Reaction>,
    },

    /// A message's text was edited.
    MessageEdited { message: Message },

    /// A message was deleted.
    #[serde(rename_all = "camelCase")]
    MessageDeleted { message_id: String },
}
