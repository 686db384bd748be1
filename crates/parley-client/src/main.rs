//! Smoke client: wires the store to a real backend, loads the sidebar and
//! the first conversation, and prints what it sees. Useful for checking a
//! deployment without the full UI.

use std::sync::Arc;

use tracing::{info, warn};

use parley_http::HttpGateway;
use parley_store::ConversationStore;
use parley_store::notify::TracingSink;
use parley_store::realtime::PushFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug".into()),
        )
        .init();

    // Config
    let base_url =
        std::env::var("PARLEY_BASE_URL").unwrap_or_else(|_| "http://localhost:5001/api".into());
    let token = std::env::var("PARLEY_TOKEN").ok();

    let gateway = Arc::new(HttpGateway::new(base_url.clone(), token));
    // No realtime transport here: the feed stays quiet, but the binding
    // lifecycle runs exactly as it would under a live channel.
    let feed = PushFeed::default();
    let store = ConversationStore::new(gateway, Arc::new(feed.clone()), Arc::new(TracingSink));

    // Forward transient notices to the log, where a UI would toast them.
    let mut notices = store.notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            warn!("notice: {}", notice.text);
        }
    });

    let snapshots = store.subscribe();

    info!(%base_url, "loading user list");
    store.load_users().await;

    let snapshot = snapshots.borrow().clone();
    info!(users = snapshot.users.len(), "sidebar loaded");
    for user in &snapshot.users {
        info!("  {} ({})", user.full_name.as_deref().unwrap_or("<unnamed>"), user.id);
    }

    let Some(first) = snapshot.users.first().cloned() else {
        info!("no conversations to open");
        return Ok(());
    };

    store.select_conversation(Some(first.clone())).await;
    store.bind(&first.id).await;
    store.load_messages(&first.id).await;
    store.mark_read(&first.id).await;

    let snapshot = snapshots.borrow().clone();
    info!(
        peer = first.full_name.as_deref().unwrap_or(&first.id),
        messages = snapshot.messages.len(),
        "conversation opened"
    );
    for msg in snapshot.messages.iter().rev().take(10).rev() {
        info!(
            "  [{}] {}: {}",
            msg.created_at.format("%H:%M"),
            msg.sender_id,
            msg.text.as_deref().unwrap_or("<image>")
        );
    }

    store.unbind().await;
    Ok(())
}
