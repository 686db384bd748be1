use async_trait::async_trait;
use thiserror::Error;

use parley_types::api::SendMessageRequest;
use parley_types::models::{Message, Reaction, UserSummary};

/// Failure of a single request/response call against the backend.
///
/// Every store operation consumes these in place: a failure is surfaced
/// once as a transient notice (or logged, for the silent paths) and the
/// operation is abandoned with no retry and no partial state change.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl GatewayError {
    /// Human-readable message supplied by the server, when there is one.
    /// Feeds the notice text before falling back to a fixed per-operation
    /// message.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Request/response calls against the chat backend, one method per
/// endpoint. Every mutation returns the server's authoritative result;
/// the store never applies a mutation it has not seen confirmed.
///
/// Injected into the store as a trait object so tests can substitute a
/// scripted fake.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// `GET /messages/users`
    async fn fetch_users(&self) -> Result<Vec<UserSummary>, GatewayError>;

    /// `GET /messages/{userId}`
    async fn fetch_messages(&self, peer_id: &str) -> Result<Vec<Message>, GatewayError>;

    /// `POST /messages/send/{userId}` — returns the created message.
    async fn send_message(
        &self,
        peer_id: &str,
        body: &SendMessageRequest,
    ) -> Result<Message, GatewayError>;

    /// `POST /messages/read/{userId}` — server-side side effect only.
    async fn mark_read(&self, peer_id: &str) -> Result<(), GatewayError>;

    /// `POST /messages/reaction/{messageId}` — returns the full new
    /// reaction list.
    async fn add_reaction(
        &self,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<Reaction>, GatewayError>;

    /// `DELETE /messages/reaction/{messageId}` — returns the full new
    /// reaction list.
    async fn remove_reaction(&self, message_id: &str) -> Result<Vec<Reaction>, GatewayError>;

    /// `PUT /messages/edit/{messageId}` — returns the edited message.
    async fn edit_message(&self, message_id: &str, text: &str) -> Result<Message, GatewayError>;

    /// `DELETE /messages/delete/{messageId}`
    async fn delete_message(&self, message_id: &str) -> Result<(), GatewayError>;
}
