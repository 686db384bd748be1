use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use parley_types::api::SendMessageRequest;
use parley_types::events::PushEvent;
use parley_types::models::{Message, UserSummary};

use crate::gateway::{GatewayError, RequestGateway};
use crate::notify::NotificationSink;
use crate::realtime::RealtimeChannel;

/// User-visible, non-blocking failure signal. No retry, no rollback; the
/// operation that produced it has already been abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientNotice {
    pub text: String,
}

/// Renderable view of the conversation, published to subscribers after
/// every effective mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub users: Vec<UserSummary>,
    pub messages: Vec<Message>,
    pub selected: Option<UserSummary>,
    pub is_users_loading: bool,
    pub is_messages_loading: bool,
    /// Ephemeral: true while the active counterpart is typing. No timeout;
    /// only a stopTyping push or a conversation switch clears it.
    pub peer_typing: bool,
}

/// The single serialized state container. Mutated only through whole-list
/// replacement or replace/append/remove-by-id, so every transition is
/// "compute new state, publish new snapshot".
#[derive(Default)]
struct ConversationState {
    users: Vec<UserSummary>,
    messages: Vec<Message>,
    selected: Option<UserSummary>,
    users_loading: bool,
    messages_loading: bool,
    peer_typing: bool,
}

impl ConversationState {
    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            users: self.users.clone(),
            messages: self.messages.clone(),
            selected: self.selected.clone(),
            is_users_loading: self.users_loading,
            is_messages_loading: self.messages_loading,
            peer_typing: self.peer_typing,
        }
    }

    fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|u| u.id.as_str())
    }

    /// Apply `f` to the message with this id, if present.
    fn update_message(&mut self, id: &str, f: impl FnOnce(&mut Message)) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                f(msg);
                true
            }
            None => false,
        }
    }

    fn remove_message(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }
}

/// Realtime binding state: at most one pump task dispatches push events
/// into the store at any time. Rebinding tears the previous pump down
/// first, so an event can never be double-applied.
enum Binding {
    Unbound,
    Bound {
        peer_id: String,
        pump: JoinHandle<()>,
    },
}

struct StoreInner {
    gateway: Arc<dyn RequestGateway>,
    channel: Arc<dyn RealtimeChannel>,
    notifier: Arc<dyn NotificationSink>,
    state: RwLock<ConversationState>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    notice_tx: broadcast::Sender<TransientNotice>,
    /// Bumped on every conversation switch. Conversation-scoped requests
    /// snapshot it before the call and discard their completion when it
    /// moved while they were in flight.
    generation: AtomicU64,
    binding: Mutex<Binding>,
}

/// Locally cached, consistent view of one active conversation.
///
/// All mutations — user-initiated operations confirmed by the
/// [`RequestGateway`] and push events from the [`RealtimeChannel`] —
/// funnel through one serialized state container. Operations return `()`;
/// completion is observed via the snapshot feed ([`subscribe`]) and
/// failures via the notice feed ([`notices`]), never via return values.
///
/// [`subscribe`]: ConversationStore::subscribe
/// [`notices`]: ConversationStore::notices
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<StoreInner>,
}

impl ConversationStore {
    pub fn new(
        gateway: Arc<dyn RequestGateway>,
        channel: Arc<dyn RealtimeChannel>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(ChatSnapshot::default());
        let (notice_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(StoreInner {
                gateway,
                channel,
                notifier,
                state: RwLock::new(ConversationState::default()),
                snapshot_tx,
                notice_tx,
                generation: AtomicU64::new(0),
                binding: Mutex::new(Binding::Unbound),
            }),
        }
    }

    /// Subscribe to state snapshots. The receiver always holds the latest
    /// published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Subscribe to transient failure notices (the toast side channel).
    pub fn notices(&self) -> broadcast::Receiver<TransientNotice> {
        self.inner.notice_tx.subscribe()
    }

    // -- Mutation operations (request/confirm path) --

    /// Replace the sidebar user list with the server's.
    pub async fn load_users(&self) {
        self.mutate(|s| s.users_loading = true).await;
        match self.inner.gateway.fetch_users().await {
            Ok(users) => {
                debug!(count = users.len(), "user list loaded");
                self.mutate(|s| {
                    s.users = users;
                    s.users_loading = false;
                })
                .await;
            }
            Err(err) => {
                self.report("Failed to load users.", &err);
                self.mutate(|s| s.users_loading = false).await;
            }
        }
    }

    /// Replace the message list wholesale with the conversation's history.
    ///
    /// Wholesale replacement means a push event that raced this load is
    /// clobbered by the response; the most recently completed load wins.
    pub async fn load_messages(&self, peer_id: &str) {
        let generation = self.generation();
        self.mutate(|s| s.messages_loading = true).await;
        let result = self.inner.gateway.fetch_messages(peer_id).await;
        if self.is_stale(generation) {
            debug!(peer_id, "discarding message load for a stale conversation");
            return;
        }
        match result {
            Ok(messages) => {
                debug!(peer_id, count = messages.len(), "messages loaded");
                self.mutate(|s| {
                    s.messages = messages;
                    s.messages_loading = false;
                })
                .await;
            }
            Err(err) => {
                self.report("Failed to load messages.", &err);
                self.mutate(|s| s.messages_loading = false).await;
            }
        }
    }

    /// Send a message to the selected counterpart and append the server's
    /// confirmed representation. Not optimistic: nothing is appended until
    /// the backend has confirmed.
    pub async fn send_message(&self, body: SendMessageRequest) {
        let generation = self.generation();
        let Some(peer_id) = self.selected_peer().await else {
            warn!("send_message called with no conversation selected");
            return;
        };
        let result = self.inner.gateway.send_message(&peer_id, &body).await;
        if self.is_stale(generation) {
            debug!(peer_id, "discarding send confirmation for a stale conversation");
            return;
        }
        match result {
            Ok(message) => self.mutate(|s| s.messages.push(message)).await,
            Err(err) => self.report("Failed to send message.", &err),
        }
    }

    /// Tell the backend this conversation has been read. Server-side side
    /// effect only; the sender's read flags arrive later as a push event.
    /// A missed read receipt is not worth a user-facing notice.
    pub async fn mark_read(&self, peer_id: &str) {
        if let Err(err) = self.inner.gateway.mark_read(peer_id).await {
            warn!(peer_id, error = %err, "failed to mark conversation as read");
        }
    }

    /// Add the local user's reaction and replace the message's reaction
    /// list with the server-returned one.
    pub async fn add_reaction(&self, message_id: &str, emoji: &str) {
        let generation = self.generation();
        let result = self.inner.gateway.add_reaction(message_id, emoji).await;
        if self.is_stale(generation) {
            debug!(message_id, "discarding reaction for a stale conversation");
            return;
        }
        match result {
            Ok(reactions) => {
                self.mutate(|s| {
                    s.update_message(message_id, |m| m.reactions = reactions);
                })
                .await;
            }
            Err(err) => self.report("Failed to add reaction", &err),
        }
    }

    /// Remove the local user's reaction; same replace-wholesale semantics.
    pub async fn remove_reaction(&self, message_id: &str) {
        let generation = self.generation();
        let result = self.inner.gateway.remove_reaction(message_id).await;
        if self.is_stale(generation) {
            debug!(message_id, "discarding reaction removal for a stale conversation");
            return;
        }
        match result {
            Ok(reactions) => {
                self.mutate(|s| {
                    s.update_message(message_id, |m| m.reactions = reactions);
                })
                .await;
            }
            Err(err) => self.report("Failed to remove reaction", &err),
        }
    }

    /// Replace a message's text with the server-confirmed edit. Only the
    /// text field changes.
    pub async fn edit_message(&self, message_id: &str, text: &str) {
        let generation = self.generation();
        let result = self.inner.gateway.edit_message(message_id, text).await;
        if self.is_stale(generation) {
            debug!(message_id, "discarding edit for a stale conversation");
            return;
        }
        match result {
            Ok(message) => {
                self.mutate(|s| {
                    s.update_message(message_id, |m| m.text = message.text);
                })
                .await;
            }
            Err(err) => self.report("Failed to edit message", &err),
        }
    }

    /// Delete a message by id. Removing an id that is not in the list is a
    /// local no-op; a backend rejection surfaces as a notice like any
    /// other transient failure.
    pub async fn delete_message(&self, message_id: &str) {
        let generation = self.generation();
        let result = self.inner.gateway.delete_message(message_id).await;
        if self.is_stale(generation) {
            debug!(message_id, "discarding delete confirmation for a stale conversation");
            return;
        }
        match result {
            Ok(()) => {
                self.mutate(|s| {
                    s.remove_message(message_id);
                })
                .await;
            }
            Err(err) => self.report("Failed to delete message", &err),
        }
    }

    /// Set (or clear) the active conversation. Loading its history and
    /// rebinding the realtime subscription are the caller's orchestration,
    /// not part of this operation.
    ///
    /// Bumps the conversation generation: any still-pending request from
    /// the previous conversation will discard its result on completion.
    pub async fn select_conversation(&self, user: Option<UserSummary>) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.mutate(|s| {
            s.selected = user;
            // Typing state is scoped to the active conversation.
            s.peer_typing = false;
        })
        .await;
    }

    // -- Push event dispatch --

    /// Apply one push-derived mutation. The single typed entry point for
    /// everything the realtime channel delivers.
    pub async fn apply_event(&self, event: PushEvent) {
        trace!(?event, "applying push event");
        match event {
            PushEvent::NewMessage(message) => {
                // Counterpart-agnostic alerting: the sink fires even for
                // conversations that are not on screen.
                self.inner.notifier.message_received(&message);

                let Some(peer_id) = self.selected_peer().await else {
                    return;
                };
                if message.sender_id != peer_id {
                    return;
                }

                self.mutate(|s| s.messages.push(message)).await;
                // The view is open, so acknowledge receipt immediately.
                self.mark_read(&peer_id).await;
            }
            PushEvent::Typing { sender_id } => {
                self.mutate(|s| {
                    if s.selected_id() == Some(sender_id.as_str()) {
                        s.peer_typing = true;
                    }
                })
                .await;
            }
            PushEvent::StopTyping { sender_id } => {
                self.mutate(|s| {
                    if s.selected_id() == Some(sender_id.as_str()) {
                        s.peer_typing = false;
                    }
                })
                .await;
            }
            PushEvent::MessagesRead { reader_id } => {
                // Every message this client sent that the reader has now
                // read. Received messages are untouched.
                self.mutate(|s| {
                    for msg in s.messages.iter_mut().filter(|m| m.receiver_id == reader_id) {
                        msg.read = true;
                    }
                })
                .await;
            }
            PushEvent::ReactionUpdated {
                message_id,
                reactions,
            } => {
                self.mutate(|s| {
                    s.update_message(&message_id, |m| m.reactions = reactions);
                })
                .await;
            }
            PushEvent::MessageEdited { message } => {
                let Message { id, text, .. } = message;
                self.mutate(|s| {
                    s.update_message(&id, |m| m.text = text);
                })
                .await;
            }
            PushEvent::MessageDeleted { message_id } => {
                self.mutate(|s| {
                    s.remove_message(&message_id);
                })
                .await;
            }
        }
    }

    // -- Subscription lifecycle --

    /// Bind the store to the realtime channel for one conversation.
    ///
    /// Any previous binding is torn down first (pump aborted and awaited),
    /// so at any time exactly one pump dispatches events — rebinding can
    /// never double-apply a delivery.
    pub async fn bind(&self, peer_id: &str) {
        let mut binding = self.inner.binding.lock().await;
        teardown(&mut binding).await;

        let rx = self.inner.channel.subscribe();
        let store = self.clone();
        let pump = tokio::spawn(async move { store.pump(rx).await });
        info!(peer_id, "realtime subscription bound");
        *binding = Binding::Bound {
            peer_id: peer_id.to_string(),
            pump,
        };
    }

    /// Return to the unbound state. Stops future push deliveries; pending
    /// request completions are unaffected.
    pub async fn unbind(&self) {
        let mut binding = self.inner.binding.lock().await;
        teardown(&mut binding).await;
    }

    /// Conversation id of the current binding, if bound.
    pub async fn bound_peer(&self) -> Option<String> {
        match &*self.inner.binding.lock().await {
            Binding::Bound { peer_id, .. } => Some(peer_id.clone()),
            Binding::Unbound => None,
        }
    }

    async fn pump(&self, mut rx: broadcast::Receiver<PushEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => self.apply_event(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "push feed lagged; events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("push feed closed, pump exiting");
                    return;
                }
            }
        }
    }

    // -- Internals --

    /// Run one serialized mutation and publish the snapshot if it changed.
    async fn mutate(&self, f: impl FnOnce(&mut ConversationState)) {
        let mut state = self.inner.state.write().await;
        f(&mut state);
        let next = state.snapshot();
        self.inner.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    async fn selected_peer(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .await
            .selected_id()
            .map(String::from)
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation() != generation
    }

    /// Surface one transient failure: server-provided message when there
    /// is one, fixed fallback otherwise. Never retried, never fatal.
    fn report(&self, fallback: &str, err: &GatewayError) {
        warn!(error = %err, "{}", fallback);
        let text = err.server_message().unwrap_or(fallback).to_string();
        let _ = self.inner.notice_tx.send(TransientNotice { text });
    }
}

async fn teardown(binding: &mut Binding) {
    if let Binding::Bound { peer_id, pump } = std::mem::replace(binding, Binding::Unbound) {
        pump.abort();
        // Await actual termination so a rebind can never race the old pump.
        let _ = pump.await;
        info!(peer_id, "realtime subscription unbound");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(id: &str) -> Message {
        Message {
            id: id.into(),
            sender_id: "u1".into(),
            receiver_id: "u2".into(),
            text: Some("x".into()),
            image: None,
            created_at: Utc::now(),
            read: false,
            reactions: vec![],
            sender_name: None,
            profile_pic: None,
        }
    }

    #[test]
    fn update_message_targets_only_the_matching_id() {
        let mut state = ConversationState::default();
        state.messages = vec![msg("a"), msg("b")];

        assert!(state.update_message("b", |m| m.text = Some("edited".into())));
        assert_eq!(state.messages[0].text.as_deref(), Some("x"));
        assert_eq!(state.messages[1].text.as_deref(), Some("edited"));

        assert!(!state.update_message("missing", |m| m.text = None));
    }

    #[test]
    fn remove_message_is_a_no_op_for_unknown_ids() {
        let mut state = ConversationState::default();
        state.messages = vec![msg("a"), msg("b")];

        assert!(!state.remove_message("missing"));
        assert_eq!(state.messages.len(), 2);

        assert!(state.remove_message("a"));
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].id, "b");
    }
}
