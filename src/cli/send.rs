//! TUI-less "send" command: stream one reply from the backend.

use std::error::Error;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::stream::{renderer_for, report, stream_to_output, OutputOptions};
use crate::core::config::Config;
use crate::core::consumer::StreamingResponseConsumer;
use crate::core::http::ConversationClient;
use crate::core::state::ChatState;

pub async fn run_send(
    config: &Config,
    conversation_id: i64,
    prompt: Vec<String>,
    model: Option<String>,
    output: OutputOptions,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: streamdown send <conversation-id> <prompt>");
        std::process::exit(1);
    }
    let model = model.unwrap_or_else(|| config.model().to_string());

    let client = ConversationClient::new(config.base_url(), config.connect_timeout())?;
    let mut state = ChatState::new();
    state.replace_conversations(client.list_conversations().await?);
    if let Err(err) = state.select(conversation_id) {
        eprintln!("❌ {err}. Run 'streamdown conversations' to list available conversations.");
        std::process::exit(1);
    }
    if let Some(title) = state.auto_title(conversation_id, &prompt) {
        info!(conversation_id, %title, "Untitled conversation named from prompt");
    }
    if let Some(conversation) = state.current() {
        eprintln!("💬 {} · {}", conversation.display_title(), model);
    }

    state.begin_send(conversation_id)?;

    // Ctrl+C closes the response stream; the consumer reports it as a failure
    // and the partial answer is kept.
    let cancel_token = CancellationToken::new();
    let interrupt = {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel_token.cancel();
            }
        })
    };

    let transport = client.open_stream(conversation_id, &prompt, &model, cancel_token);
    let consumer = StreamingResponseConsumer::new(renderer_for(config));
    let result = stream_to_output(&consumer, transport, &output).await;

    interrupt.abort();
    state.finish_send(conversation_id);
    report(result?);
    Ok(())
}
