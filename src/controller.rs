use chrono::Utc;
use log::{ debug, info, warn };
use std::sync::Arc;

use crate::chat::{ ChatRequest, ChatService, ChatServiceError };
use crate::history::{ load_conversation, save_conversation, PersistenceStore, StoreObserver };
use crate::models::chat::{ ChatMessage, Conversation };
use crate::models::view::{ project, project_local, ConversationView };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingReply,
}

/// Owns the message log and moves it between `Idle` and `AwaitingReply`.
/// Every mutation is followed by exactly one store write.
pub struct ConversationController {
    conversation: Conversation,
    pending: bool,
    draft: String,
    greeting: String,
    storage_key: String,
    store: Arc<dyn PersistenceStore>,
    observer: Arc<dyn StoreObserver>,
    chat_service: Arc<dyn ChatService>,
}

impl ConversationController {
    /// Restores the conversation from `store`, or seeds a fresh one.
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        observer: Arc<dyn StoreObserver>,
        chat_service: Arc<dyn ChatService>,
        storage_key: impl Into<String>,
        greeting: impl Into<String>
    ) -> Self {
        let storage_key = storage_key.into();
        let greeting = greeting.into();
        let conversation = load_conversation(
            store.as_ref(),
            observer.as_ref(),
            &storage_key,
            &greeting,
            Utc::now()
        );
        info!("Loaded conversation with {} message(s)", conversation.len());

        Self {
            conversation,
            pending: false,
            draft: String::new(),
            greeting,
            storage_key,
            store,
            observer,
            chat_service,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> ControllerState {
        if self.pending { ControllerState::AwaitingReply } else { ControllerState::Idle }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn chat_service(&self) -> Arc<dyn ChatService> {
        self.chat_service.clone()
    }

    /// Submits the current draft.
    pub fn submit_draft(&mut self) -> Option<ChatRequest> {
        let text = self.draft.clone();
        self.submit(&text)
    }

    /// Appends the user message and the placeholder, persists, and returns the
    /// request to send. `None` means the submit was rejected and nothing
    /// changed.
    pub fn submit(&mut self, text: &str) -> Option<ChatRequest> {
        if self.pending {
            debug!("Submit ignored: a reply is still pending");
            return None;
        }
        if text.trim().is_empty() {
            debug!("Submit ignored: empty input");
            return None;
        }

        let now = Utc::now();
        let user = ChatMessage::user(text, now);
        let mut messages = self.conversation.history().to_vec();
        messages.push(user.clone());

        self.conversation.begin_exchange(user, now);
        self.persist();
        self.draft.clear();
        self.pending = true;

        Some(ChatRequest { messages })
    }

    /// Settles the in-flight exchange with the service outcome.
    pub fn receive_reply(&mut self, outcome: Result<String, ChatServiceError>) {
        if !self.pending {
            warn!("Reply received while idle; settling anyway");
        }
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                format!("Error: {}", e)
            }
        };
        if !self.conversation.settle(ChatMessage::system(content, Utc::now())) {
            debug!("No placeholder to replace; reply appended");
        }
        self.persist();
        self.pending = false;
    }

    /// Submits `text` and waits for the chat service in place. Returns false
    /// when the submit was rejected.
    pub async fn send(&mut self, text: &str) -> bool {
        let Some(request) = self.submit(text) else {
            return false;
        };
        let outcome = self.chat_service.chat(&request).await;
        self.receive_reply(outcome);
        true
    }

    /// Resets to the seeded greeting. The pending flag is left alone.
    pub fn clear(&mut self) {
        self.conversation = Conversation::seeded(&self.greeting, Utc::now());
        self.persist();
        info!("Conversation cleared");
    }

    pub fn view(&self) -> ConversationView {
        project_local(&self.conversation, self.pending)
    }

    pub fn view_in<Tz>(&self, tz: &Tz) -> ConversationView
        where Tz: chrono::TimeZone, Tz::Offset: std::fmt::Display
    {
        project(&self.conversation, self.pending, tz)
    }

    fn persist(&self) {
        save_conversation(
            self.store.as_ref(),
            self.observer.as_ref(),
            &self.storage_key,
            &self.conversation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::stub::StubChatService;
    use crate::history::{ LogObserver, MemoryStore };
    use crate::models::chat::{ Role, DEFAULT_GREETING, PLACEHOLDER };

    const KEY: &str = "civic_chat_history_v1";

    fn controller(store: Arc<MemoryStore>) -> ConversationController {
        ConversationController::new(
            store,
            Arc::new(LogObserver),
            Arc::new(StubChatService),
            KEY,
            DEFAULT_GREETING
        )
    }

    #[test]
    fn submit_appends_user_and_placeholder_with_one_write() {
        let store = Arc::new(MemoryStore::new());
        let mut ctl = controller(store.clone());
        ctl.set_draft("Hello");

        let request = ctl.submit_draft().unwrap();

        assert_eq!(ctl.state(), ControllerState::AwaitingReply);
        assert_eq!(ctl.conversation().len(), 3);
        assert_eq!(ctl.conversation().messages()[1].content(), "Hello");
        assert_eq!(ctl.conversation().last().unwrap().content(), PLACEHOLDER);
        assert_eq!(ctl.draft(), "");
        assert_eq!(store.write_count(), 1);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content(), "Hello");
    }

    #[test]
    fn raw_text_is_stored_untrimmed() {
        let mut ctl = controller(Arc::new(MemoryStore::new()));
        let request = ctl.submit("  padded \n").unwrap();
        assert_eq!(ctl.conversation().messages()[1].content(), "  padded \n");
        assert_eq!(request.messages[0].content(), "  padded \n");
    }

    #[test]
    fn rejected_submits_change_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut ctl = controller(store.clone());

        assert!(ctl.submit("").is_none());
        assert!(ctl.submit(" \t\n").is_none());
        assert_eq!(ctl.conversation().len(), 1);
        assert_eq!(ctl.state(), ControllerState::Idle);

        ctl.submit("first").unwrap();
        let before = ctl.conversation().clone();
        ctl.set_draft("second");
        assert!(ctl.submit_draft().is_none());
        assert_eq!(ctl.conversation(), &before);
        assert_eq!(ctl.draft(), "second");
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn reply_replaces_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let mut ctl = controller(store.clone());
        ctl.submit("Hello").unwrap();

        ctl.receive_reply(Ok("Hi there".to_string()));

        assert_eq!(ctl.state(), ControllerState::Idle);
        assert_eq!(ctl.conversation().len(), 3);
        let last = ctl.conversation().last().unwrap();
        assert_eq!(last.role(), Role::System);
        assert_eq!(last.content(), "Hi there");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn failure_becomes_error_message() {
        let mut ctl = controller(Arc::new(MemoryStore::new()));
        ctl.submit("Hello").unwrap();

        let err: ChatServiceError = serde_json::from_str::<u8>("x").unwrap_err().into();
        ctl.receive_reply(Err(err));

        assert_eq!(ctl.state(), ControllerState::Idle);
        assert_eq!(ctl.conversation().len(), 3);
        assert!(ctl.conversation().last().unwrap().content().starts_with("Error: "));
    }

    #[tokio::test]
    async fn request_history_skips_greeting_and_placeholder() {
        let mut ctl = controller(Arc::new(MemoryStore::new()));
        assert!(ctl.send("one").await);

        let request = ctl.submit("two").unwrap();
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, ["one", "Echo: one", "two"]);
    }

    #[test]
    fn clear_resets_to_greeting_and_keeps_pending() {
        let store = Arc::new(MemoryStore::new());
        let mut ctl = controller(store.clone());
        ctl.submit("Hello").unwrap();

        ctl.clear();
        assert_eq!(ctl.conversation().len(), 1);
        assert_eq!(ctl.conversation().messages()[0].content(), DEFAULT_GREETING);
        assert!(ctl.is_pending());
        assert_eq!(store.write_count(), 2);

        ctl.receive_reply(Ok("late".to_string()));
        assert_eq!(ctl.conversation().messages()[0].content(), DEFAULT_GREETING);
        assert_eq!(ctl.conversation().len(), 2);
    }

    #[test]
    fn restores_previous_session() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut ctl = controller(store.clone());
            ctl.submit("Hello").unwrap();
            ctl.receive_reply(Ok("Hi".to_string()));
        }
        let ctl = controller(store);
        assert_eq!(ctl.conversation().len(), 3);
        assert_eq!(ctl.state(), ControllerState::Idle);
        assert_eq!(ctl.conversation().last().unwrap().content(), "Hi");
    }

    #[test]
    fn storage_failure_does_not_interrupt_flow() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let mut ctl = controller(store.clone());

        ctl.submit("Hello").unwrap();
        ctl.receive_reply(Ok("Hi".to_string()));
        ctl.clear();

        assert_eq!(ctl.conversation().len(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn view_follows_state() {
        let mut ctl = controller(Arc::new(MemoryStore::new()));
        ctl.submit("Hello").unwrap();
        let view = ctl.view_in(&Utc);
        assert!(view.pending);
        assert_eq!(view.scroll_to, 2);
        assert!(view.messages[2].placeholder);
    }
}
