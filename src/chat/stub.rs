use async_trait::async_trait;
use super::{ ChatRequest, ChatService, ChatServiceError };
use crate::models::chat::MessageBody;

pub const STUB_GREETING: &str = "Hello from local stub.";

/// Echo service used when no live chat endpoint is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubChatService;

impl StubChatService {
    pub fn reply_for(request: &ChatRequest) -> String {
        match request.messages.last().map(|m| &m.body) {
            Some(MessageBody::User { content }) => format!("Echo: {}", content),
            Some(MessageBody::System { .. }) => STUB_GREETING.to_string(),
            None => "Echo: ".to_string(),
        }
    }
}

#[async_trait]
impl ChatService for StubChatService {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatServiceError> {
        Ok(Self::reply_for(request))
    }
}
