use tracing::debug;

use parley_types::models::Message;

/// Notification body used when a message carries only an image.
pub const IMAGE_PLACEHOLDER: &str = "📷 Image message";

/// Fallback notification icon when the sender has no profile picture.
pub const DEFAULT_AVATAR: &str = "/avatar.png";

/// Content of a desktop notification for one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAlert {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl MessageAlert {
    pub fn from_message(message: &Message) -> Self {
        let sender = message
            .sender_name
            .as_deref()
            .unwrap_or(&message.sender_id);
        Self {
            title: format!("New message from {sender}"),
            body: message
                .text
                .clone()
                .unwrap_or_else(|| IMAGE_PLACEHOLDER.to_string()),
            icon: message
                .profile_pic
                .clone()
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        }
    }
}

/// Best-effort OS notification plus sound cue for an incoming message.
///
/// Fire-and-forget: implementations must never block and must swallow
/// platform failures (at most a diagnostic log). The store calls this for
/// every pushed message, whether or not its conversation is on screen.
pub trait NotificationSink: Send + Sync {
    fn message_received(&self, message: &Message);
}

/// Sink that only logs the derived alert. Stands in where no platform
/// notification backend is wired up.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn message_received(&self, message: &Message) {
        let alert = MessageAlert::from_message(message);
        debug!(title = %alert.title, body = %alert.body, "message notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pushed_message() -> Message {
        Message {
            id: "m1".into(),
            sender_id: "u2".into(),
            receiver_id: "u1".into(),
            text: Some("hello".into()),
            image: None,
            created_at: Utc::now(),
            read: false,
            reactions: vec![],
            sender_name: Some("Ada".into()),
            profile_pic: Some("/pics/ada.png".into()),
        }
    }

    #[test]
    fn alert_uses_sender_name_and_text() {
        let alert = MessageAlert::from_message(&pushed_message());
        assert_eq!(alert.title, "New message from Ada");
        assert_eq!(alert.body, "hello");
        assert_eq!(alert.icon, "/pics/ada.png");
    }

    #[test]
    fn alert_falls_back_for_image_only_message() {
        let mut msg = pushed_message();
        msg.text = None;
        msg.image = Some("/uploads/photo.png".into());
        msg.profile_pic = None;

        let alert = MessageAlert::from_message(&msg);
        assert_eq!(alert.body, IMAGE_PLACEHOLDER);
        assert_eq!(alert.icon, DEFAULT_AVATAR);
    }

    #[test]
    fn alert_falls_back_to_sender_id_without_name() {
        let mut msg = pushed_message();
        msg.sender_name = None;

        let alert = MessageAlert::from_message(&msg);
        assert_eq!(alert.title, "New message from u2");
    }
}
