use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

pub const PLACEHOLDER: &str = "Thinking ...";
pub const DEFAULT_GREETING: &str =
    "I'm a sovereign AI agent living on the Internet Computer. Ask me anything.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    System,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::System => "System",
        }
    }
}

/// Role-tagged payload, serialized as `{"user":{"content":..}}` or
/// `{"system":{"content":..}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBody {
    User {
        content: String,
    },
    System {
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self { body: MessageBody::User { content: content.into() }, ts: Some(ts) }
    }

    pub fn system(content: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self { body: MessageBody::System { content: content.into() }, ts: Some(ts) }
    }

    pub fn role(&self) -> Role {
        match self.body {
            MessageBody::User { .. } => Role::User,
            MessageBody::System { .. } => Role::System,
        }
    }

    pub fn content(&self) -> &str {
        match &self.body {
            MessageBody::User { content } | MessageBody::System { content } => content,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.role() == Role::System && self.content() == PLACEHOLDER
    }
}

/// Chronological message log. Never empty: the first entry is the seeded
/// greeting of a fresh conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn seeded(greeting: &str, now: DateTime<Utc>) -> Self {
        Self { messages: vec![ChatMessage::system(greeting, now)] }
    }

    /// Returns `None` for an empty log.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Option<Self> {
        if messages.is_empty() { None } else { Some(Self { messages }) }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Everything after the seeded greeting.
    pub fn history(&self) -> &[ChatMessage] {
        self.messages.get(1..).unwrap_or(&[])
    }

    /// Appends the user message and the placeholder in one step.
    pub fn begin_exchange(&mut self, user: ChatMessage, now: DateTime<Utc>) {
        self.messages.push(user);
        self.messages.push(ChatMessage::system(PLACEHOLDER, now));
    }

    /// Replaces a trailing placeholder with `reply`. Returns false when there
    /// was no placeholder, in which case `reply` is appended instead.
    pub fn settle(&mut self, reply: ChatMessage) -> bool {
        let replaced = match self.messages.last() {
            Some(last) if last.is_placeholder() => {
                self.messages.pop();
                true
            }
            _ => false,
        };
        self.messages.push(reply);
        replaced
    }
}
