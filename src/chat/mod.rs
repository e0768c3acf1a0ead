pub mod http;
pub mod stub;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use self::http::HttpChatService;
use self::stub::StubChatService;
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatType {
    Http,
    Stub,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Invalid chat type: '{0}'")]
pub struct ParseChatTypeError(String);

impl FromStr for ChatType {
    type Err = ParseChatTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ChatType::Http),
            "stub" => Ok(ChatType::Stub),
            _ => Err(ParseChatTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatType::Http => write!(f, "http"),
            ChatType::Stub => write!(f, "stub"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatServiceError {
    #[error("invalid chat endpoint '{0}': {1}")]
    InvalidEndpoint(String, url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid JSON response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Body of a chat request: the history after the greeting plus the new user
/// message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatServiceError>;
}

/// Extracts the reply text from a response body: a truthy `response` field
/// wins, otherwise the whole body is the reply. Non-strings become JSON text.
pub fn reply_text(body: JsonValue) -> String {
    let chosen = match body {
        JsonValue::Object(mut map) =>
            match map.remove("response") {
                Some(response) if is_truthy(&response) => response,
                Some(response) => {
                    map.insert("response".to_string(), response);
                    JsonValue::Object(map)
                }
                None => JsonValue::Object(map),
            }
        other => other,
    };
    match chosen {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub chat_type: ChatType,
    pub base_url: String,
}

pub fn new_client(config: &ChatConfig) -> Result<Arc<dyn ChatService>, ChatServiceError> {
    let client: Arc<dyn ChatService> = match config.chat_type {
        ChatType::Http => Arc::new(HttpChatService::from_config(config)?),
        ChatType::Stub => Arc::new(StubChatService),
    };
    Ok(client)
}
