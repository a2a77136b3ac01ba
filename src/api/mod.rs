use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Title shown for conversations the backend has not named yet.
pub const UNTITLED: &str = "Untitled";

/// Title the backend stores on conversations it creates.
pub const BACKEND_DEFAULT_TITLE: &str = "Sin título";

pub const CONVERSATIONS_ENDPOINT: &str = "api/conversations";

pub fn stream_endpoint(conversation_id: i64) -> String {
    format!("{CONVERSATIONS_ENDPOINT}/{conversation_id}/messages/stream")
}

#[derive(Serialize, Debug)]
pub struct StreamMessageRequest<'a> {
    pub content: &'a str,
    pub model: &'a str,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl ConversationSummary {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !is_placeholder(title) => title,
            _ => UNTITLED,
        }
    }

    /// True until the conversation has been given a real name.
    pub fn has_placeholder_title(&self) -> bool {
        self.title.as_deref().map_or(true, |t| is_placeholder(t.trim()))
    }
}

fn is_placeholder(title: &str) -> bool {
    title.is_empty() || title == UNTITLED || title == BACKEND_DEFAULT_TITLE
}
