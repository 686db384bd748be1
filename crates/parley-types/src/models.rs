use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (user, emoji) reaction entry on a message.
///
/// The backend keeps at most one entry per user. The client trusts that
/// bookkeeping and never deduplicates: reaction lists are always replaced
/// wholesale with whatever the server returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: String,
    pub emoji: String,
}

/// A single message in a two-party conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque backend id, unique within the conversation.
    #[serde(rename = "_id")]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image URL, when the message carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Meaningful only for messages this client sent: true once the
    /// counterpart has acknowledged reading them.
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Present only on pushed `newMessage` payloads; used for
    /// notification content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

/// Sidebar entry for one counterpart user. Doubles as the value of the
/// active-conversation selection, since a conversation is identified by
/// its counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_names_and_defaults() {
        let json = r#"{
            "_id": "m1",
            "senderId": "u1",
            "receiverId": "u2",
            "text": "hi",
            "createdAt": "2026-01-05T10:00:00Z"
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.sender_id, "u1");
        assert_eq!(msg.receiver_id, "u2");
        assert_eq!(msg.text.as_deref(), Some("hi"));
        assert!(!msg.read);
        assert!(msg.reactions.is_empty());
        assert!(msg.image.is_none());
        assert!(msg.sender_name.is_none());
    }

    #[test]
    fn reaction_uses_camel_case_user_id() {
        let reaction: Reaction =
            serde_json::from_str(r#"{"userId": "u2", "emoji": "❤️"}"#).unwrap();
        assert_eq!(reaction.user_id, "u2");
        assert_eq!(reaction.emoji, "❤️");
    }
}
