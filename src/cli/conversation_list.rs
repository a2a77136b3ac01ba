use std::error::Error;

use crate::api::ConversationSummary;
use crate::core::config::Config;
use crate::core::http::ConversationClient;

pub async fn list_conversations(config: &Config) -> Result<(), Box<dyn Error>> {
    let client = ConversationClient::new(config.base_url(), config.connect_timeout())?;
    let conversations = client.list_conversations().await?;

    if conversations.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    println!("Conversations ({}):", client.base_url());
    for line in format_rows(&conversations) {
        println!("{line}");
    }
    Ok(())
}

fn format_rows(conversations: &[ConversationSummary]) -> Vec<String> {
    let id_width = conversations
        .iter()
        .map(|c| c.id.to_string().len())
        .max()
        .unwrap_or(1);

    conversations
        .iter()
        .map(|conv| {
            let created = conv
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".repeat(16));
            format!(
                "  {:>id_width$}  {}  {}",
                conv.id,
                created,
                conv.display_title()
            )
        })
        .collect()
}
