use clap::Parser;
use crate::chat::ChatType;
use crate::history::StoreType;
use crate::models::chat::DEFAULT_GREETING;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat Service Args ---
    /// Chat backend to use (http, stub). `stub` echoes locally without a server.
    #[arg(long, env = "CHAT_TYPE", default_value = "http")]
    pub chat_type: ChatType,

    /// Base URL of the chat service; requests go to `<base>/chat`.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://localhost:8000")]
    pub chat_base_url: String,

    // --- Persistence Args ---
    /// Conversation store type (file, memory). `memory` keeps nothing after exit.
    #[arg(long, env = "STORE_TYPE", default_value = "file")]
    pub store_type: StoreType,

    /// Directory holding the persisted conversation.
    #[arg(long, env = "STORE_DIR", default_value = ".civic-chat")]
    pub store_dir: String,

    /// Storage key the conversation is saved under.
    #[arg(long, env = "STORAGE_KEY", default_value = "civic_chat_history_v1")]
    pub storage_key: String,

    // --- General App Args ---
    /// Greeting that seeds a fresh conversation.
    #[arg(long, env = "CHAT_GREETING", default_value = DEFAULT_GREETING)]
    pub greeting: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
