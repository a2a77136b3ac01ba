//! Application state for a chat front end.
//!
//! Holds the conversation list, which one is selected, and which ones have a
//! reply streaming. The streaming core does not guard against two sends to
//! the same conversation; [`ChatState::begin_send`] is where a front end does.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::api::ConversationSummary;

const AUTO_TITLE_GRAPHEMES: usize = 20;
const ELLIPSIS: &str = "…";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    UnknownConversation(i64),
    SendInFlight(i64),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::UnknownConversation(id) => write!(f, "conversation {id} not found"),
            StateError::SendInFlight(id) => {
                write!(f, "a reply is already streaming in conversation {id}")
            }
        }
    }
}

impl StdError for StateError {}

#[derive(Debug, Default)]
pub struct ChatState {
    conversations: Vec<ConversationSummary>,
    current: Option<i64>,
    in_flight: HashSet<i64>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    /// Replace the list with a fresh copy from the backend. The selection
    /// survives only if the conversation is still listed.
    pub fn replace_conversations(&mut self, conversations: Vec<ConversationSummary>) {
        self.conversations = conversations;
        if let Some(id) = self.current {
            if self.find(id).is_none() {
                self.current = None;
            }
        }
    }

    pub fn select(&mut self, id: i64) -> Result<(), StateError> {
        if self.find(id).is_none() {
            return Err(StateError::UnknownConversation(id));
        }
        self.current = Some(id);
        Ok(())
    }

    pub fn current_id(&self) -> Option<i64> {
        self.current
    }

    pub fn current(&self) -> Option<&ConversationSummary> {
        self.current.and_then(|id| self.find(id))
    }

    /// Drop a conversation. Removing the selected one moves the selection to
    /// the first remaining conversation.
    pub fn remove(&mut self, id: i64) {
        self.conversations.retain(|c| c.id != id);
        self.in_flight.remove(&id);
        if self.current == Some(id) {
            self.current = self.conversations.first().map(|c| c.id);
        }
    }

    pub fn begin_send(&mut self, id: i64) -> Result<(), StateError> {
        if self.find(id).is_none() {
            return Err(StateError::UnknownConversation(id));
        }
        if !self.in_flight.insert(id) {
            return Err(StateError::SendInFlight(id));
        }
        Ok(())
    }

    pub fn finish_send(&mut self, id: i64) {
        self.in_flight.remove(&id);
    }

    pub fn is_sending(&self, id: i64) -> bool {
        self.in_flight.contains(&id)
    }

    /// Name an untitled conversation after the first prompt sent to it.
    /// Returns the new title, or `None` if the conversation already had one.
    pub fn auto_title(&mut self, id: i64, prompt: &str) -> Option<String> {
        let conversation = self.conversations.iter_mut().find(|c| c.id == id)?;
        if !conversation.has_placeholder_title() {
            return None;
        }
        let title = title_from_prompt(prompt)?;
        conversation.title = Some(title.clone());
        Some(title)
    }

    fn find(&self, id: i64) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|c| c.id == id)
    }
}

/// First few user-perceived characters of a prompt, with an ellipsis when cut.
pub fn title_from_prompt(prompt: &str) -> Option<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut graphemes = trimmed.graphemes(true);
    let mut title: String = graphemes.by_ref().take(AUTO_TITLE_GRAPHEMES).collect();
    if graphemes.next().is_some() {
        title.push_str(ELLIPSIS);
    }
    Some(title)
}
