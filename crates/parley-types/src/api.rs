use serde::{Deserialize, Serialize};

use crate::models::{Message, Reaction};

// -- Messages --

/// Body of `POST /messages/send/{userId}`. At least one of the two fields
/// is expected to be set; the backend rejects empty sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl SendMessageRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }
}

/// Body of `PUT /messages/edit/{messageId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMessageRequest {
    pub text: String,
}

/// Response of `PUT /messages/edit/{messageId}`: the edited message,
/// wrapped the way the backend wraps it.
#[derive(Debug, Deserialize)]
pub struct EditMessageResponse {
    pub message: Message,
}

// -- Reactions --

/// Body of `POST /messages/reaction/{messageId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

/// Response of both the add and remove reaction endpoints: the full,
/// server-authoritative reaction list for the message.
#[derive(Debug, Deserialize)]
pub struct ReactionsResponse {
    pub reactions: Vec<Reaction>,
}

// -- Errors --

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_omits_absent_fields() {
        let body = SendMessageRequest::text("hello");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"text":"hello"}"#);
    }
}
