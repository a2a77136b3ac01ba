/// Lifecycle of a single streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
}

/// One in-flight response: the text received so far and where it stands.
///
/// Text is append-only; a session never shrinks or reorders what it has
/// accumulated. Status leaves `Active` exactly once.
#[derive(Debug)]
pub struct StreamSession {
    accumulated_text: String,
    status: SessionStatus,
    chunk_count: usize,
    byte_count: usize,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            accumulated_text: String::new(),
            status: SessionStatus::Active,
            chunk_count: 0,
            byte_count: 0,
        }
    }

    /// Record a raw chunk arriving from the transport.
    pub fn record_chunk(&mut self, bytes: usize) {
        self.chunk_count += 1;
        self.byte_count += bytes;
    }

    /// Append decoded text. Returns false (and changes nothing) once the
    /// session has left the active state.
    pub fn append(&mut self, text: &str) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.accumulated_text.push_str(text);
        true
    }

    pub fn complete(&mut self) {
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Completed;
        }
    }

    pub fn fail(&mut self) {
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Failed;
        }
    }

    pub fn text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn into_text(self) -> String {
        self.accumulated_text
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn byte_count(&self) -> usize {
        self.byte_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_accumulates_in_order() {
        let mut session = StreamSession::new();
        assert!(session.append("Hel"));
        assert!(session.append("lo"));
        assert_eq!(session.text(), "Hello");
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn status_leaves_active_only_once() {
        let mut session = StreamSession::new();
        session.append("partial");
        session.fail();
        session.complete();
        assert_eq!(session.status(), SessionStatus::Failed);
        assert!(!session.append(" more"));
        assert_eq!(session.into_text(), "partial");
    }

    #[test]
    fn chunk_counters_track_raw_bytes() {
        let mut session = StreamSession::new();
        session.record_chunk(3);
        session.record_chunk(0);
        assert_eq!(session.chunk_count(), 2);
        assert_eq!(session.byte_count(), 3);
    }
}
