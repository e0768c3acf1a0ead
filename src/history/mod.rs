mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{ DateTime, Utc };
use log::{ debug, info, warn };
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;
use crate::models::chat::{ ChatMessage, Conversation };

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage quota exceeded for key '{0}'")]
    QuotaExceeded(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    File,
    Memory,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Invalid store type: '{0}'")]
pub struct ParseStoreTypeError(String);

impl FromStr for StoreType {
    type Err = ParseStoreTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreType::File),
            "memory" => Ok(StoreType::Memory),
            _ => Err(ParseStoreTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::File => write!(f, "file"),
            StoreType::Memory => write!(f, "memory"),
        }
    }
}

/// Synchronous string key-value storage surviving restarts.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Receives storage failures that are otherwise swallowed.
pub trait StoreObserver: Send + Sync {
    fn read_failed(&self, key: &str, error: &str);

    fn write_failed(&self, key: &str, error: &str);
}

pub struct LogObserver;

impl StoreObserver for LogObserver {
    fn read_failed(&self, key: &str, error: &str) {
        warn!("Failed to read chat from storage key '{}': {}", key, error);
    }

    fn write_failed(&self, key: &str, error: &str) {
        warn!("Failed to write chat to storage key '{}': {}", key, error);
    }
}

/// Reads the stored conversation, falling back to a seeded one when the key
/// is absent, unreadable, malformed or holds an empty log.
pub fn load_conversation(
    store: &dyn PersistenceStore,
    observer: &dyn StoreObserver,
    key: &str,
    greeting: &str,
    now: DateTime<Utc>
) -> Conversation {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored conversation under '{}', starting fresh", key);
            return Conversation::seeded(greeting, now);
        }
        Err(e) => {
            observer.read_failed(key, &e.to_string());
            return Conversation::seeded(greeting, now);
        }
    };

    match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
        Ok(messages) =>
            Conversation::from_messages(messages).unwrap_or_else(|| {
                observer.read_failed(key, "stored conversation is empty");
                Conversation::seeded(greeting, now)
            }),
        Err(e) => {
            observer.read_failed(key, &e.to_string());
            Conversation::seeded(greeting, now)
        }
    }
}

/// Writes the conversation; failures go to the observer and never propagate.
pub fn save_conversation(
    store: &dyn PersistenceStore,
    observer: &dyn StoreObserver,
    key: &str,
    conversation: &Conversation
) {
    let json = match serde_json::to_string(conversation) {
        Ok(json) => json,
        Err(e) => {
            observer.write_failed(key, &e.to_string());
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        observer.write_failed(key, &e.to_string());
    }
}

pub fn create_store(args: &Args) -> Arc<dyn PersistenceStore> {
    match args.store_type {
        StoreType::File => Arc::new(FileStore::new(&args.store_dir)),
        StoreType::Memory => Arc::new(MemoryStore::new()),
    }
}

pub fn initialize_store(args: &Args) -> Arc<dyn PersistenceStore> {
    match args.store_type {
        StoreType::File => info!("Chat history will be stored in: {}", args.store_dir),
        StoreType::Memory => info!("Chat history is kept in memory for this session only"),
    }
    create_store(args)
}
