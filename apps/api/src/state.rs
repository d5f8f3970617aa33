use std::sync::Arc;

use crate::assistant::Assistant;
use crate::chat::ChatService;
use crate::tracker::Tracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub assistant: Assistant,
    /// Live chat sessions. Not persisted; a restart starts every chat over.
    pub chats: ChatService,
}
