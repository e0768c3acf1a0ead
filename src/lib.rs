pub mod chat;
pub mod cli;
pub mod controller;
pub mod history;
pub mod models;
pub mod render;
pub mod repl;

use chat::{ new_client, ChatConfig };
use cli::Args;
use controller::ConversationController;
use history::{ initialize_store, LogObserver };
use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub fn config_summary(args: &Args) -> Vec<String> {
    vec![
        format!("Chat Type: {}", args.chat_type),
        format!("Chat Base URL: {}", args.chat_base_url),
        format!("Store Type: {}", args.store_type),
        format!("Store Directory: {}", args.store_dir),
        format!("Storage Key: {}", args.storage_key),
        format!("Greeting: {}", args.greeting),
        format!("Debug: {}", args.debug)
    ]
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    for line in config_summary(&args) {
        info!("{}", line);
    }
    info!("-------------------------");

    let chat_config = ChatConfig {
        chat_type: args.chat_type.clone(),
        base_url: args.chat_base_url.clone(),
    };
    let chat_service = new_client(&chat_config)?;
    let store = initialize_store(&args);

    let mut controller = ConversationController::new(
        store,
        Arc::new(LogObserver),
        chat_service,
        args.storage_key.clone(),
        args.greeting.clone()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    repl::run_session(&mut controller, stdin, std::io::stdout()).await;
    info!("Session ended");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn summary_lists_every_setting() {
        let args = Args::try_parse_from(["civic-chat", "--greeting", "Welcome", "--debug"]).unwrap();
        let summary = config_summary(&args);
        assert_eq!(summary.len(), 7);
        assert!(summary.contains(&"Greeting: Welcome".to_string()));
        assert!(summary.contains(&"Debug: true".to_string()));
        assert!(summary.iter().any(|l| l.starts_with("Store Type: ")));
    }
}
