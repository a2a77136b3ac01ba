//! Incremental consumer for streamed assistant answers.
//!
//! Every chunk read from a [`Transport`] is decoded, appended to the session
//! text, and the *whole* text is rendered again. Re-rendering from the start
//! is what lets constructs such as an unterminated code fence settle into
//! their final shape as more text arrives; the last fragment is therefore
//! identical to rendering the complete answer in one go.

use std::error::Error as StdError;
use std::fmt;

use tracing::{debug, info, warn};

use crate::core::decoder::{DecodeError, Utf8StreamDecoder};
use crate::core::session::StreamSession;
use crate::core::transport::{Transport, TransportError};
use crate::ui::markdown::{escape_fallback, Renderer};

/// Cumulative sanitized HTML for everything received so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFragment {
    pub html: String,
    /// Length in bytes of the accumulated text this fragment was rendered from.
    pub text_len: usize,
    /// 1-based position of this fragment within the session.
    pub sequence: usize,
    /// True when rendering failed and `html` is the escaped raw text.
    pub fallback: bool,
}

/// Receives each fragment as it is produced.
///
/// This is where a UI redraws and keeps the view pinned to the newest
/// content. Closures taking `&RenderedFragment` implement it.
pub trait FragmentObserver {
    fn on_fragment(&mut self, fragment: &RenderedFragment);
}

impl<F> FragmentObserver for F
where
    F: FnMut(&RenderedFragment),
{
    fn on_fragment(&mut self, fragment: &RenderedFragment) {
        self(fragment)
    }
}

#[derive(Debug)]
pub enum StreamErrorKind {
    Transport(TransportError),
    Decode(DecodeError),
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamErrorKind::Transport(err) => write!(f, "{err}"),
            StreamErrorKind::Decode(err) => write!(f, "{err}"),
        }
    }
}

/// A session that ended in failure, with whatever text arrived before it.
#[derive(Debug)]
pub struct StreamError {
    kind: StreamErrorKind,
    partial_text: String,
}

impl StreamError {
    pub fn kind(&self) -> &StreamErrorKind {
        &self.kind
    }

    pub fn partial_text(&self) -> &str {
        &self.partial_text
    }

    pub fn into_partial_text(self) -> String {
        self.partial_text
    }

    /// HTTP status reported by the transport, if any.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            StreamErrorKind::Transport(err) => err.status(),
            StreamErrorKind::Decode(_) => None,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.partial_text.is_empty() {
            write!(f, "stream failed: {}", self.kind)
        } else {
            write!(
                f,
                "stream failed after {} bytes of text: {}",
                self.partial_text.len(),
                self.kind
            )
        }
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            StreamErrorKind::Transport(err) => Some(err),
            StreamErrorKind::Decode(err) => Some(err),
        }
    }
}

pub struct StreamingResponseConsumer<R> {
    renderer: R,
}

impl<R: Renderer> StreamingResponseConsumer<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Render `text`, falling back to escaped raw text when rendering fails.
    pub fn render_fragment(&self, text: &str) -> (String, bool) {
        match self.renderer.render(text) {
            Ok(html) => (html, false),
            Err(err) => {
                warn!(error = %err, text_len = text.len(), "Rendering failed; showing escaped text");
                (escape_fallback(text), true)
            }
        }
    }

    /// Read `transport` to the end, reporting a fragment for every chunk that
    /// adds text. Returns the full text, or the error and the partial text.
    ///
    /// No retry is attempted. A transport closed from outside is a failure
    /// like any other.
    pub async fn consume<T, O>(
        &self,
        mut transport: T,
        observer: &mut O,
    ) -> Result<String, StreamError>
    where
        T: Transport,
        O: FragmentObserver + ?Sized,
    {
        let mut session = StreamSession::new();
        let mut decoder = Utf8StreamDecoder::new();
        let mut sequence = 0;

        loop {
            let chunk = match transport.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => return Err(fail(session, StreamErrorKind::Transport(err))),
            };
            session.record_chunk(chunk.len());

            let text = match decoder.decode(&chunk) {
                Ok(text) => text,
                Err(err) => return Err(fail(session, StreamErrorKind::Decode(err))),
            };
            debug!(
                chunk = session.chunk_count(),
                bytes = chunk.len(),
                decoded = text.len(),
                pending = decoder.pending_len(),
                "Chunk received"
            );
            if text.is_empty() {
                continue;
            }

            session.append(&text);
            sequence += 1;
            let (html, fallback) = self.render_fragment(session.text());
            observer.on_fragment(&RenderedFragment {
                html,
                text_len: session.text().len(),
                sequence,
                fallback,
            });
        }

        if let Err(err) = decoder.finish() {
            return Err(fail(session, StreamErrorKind::Decode(err)));
        }

        session.complete();
        info!(
            chunks = session.chunk_count(),
            bytes = session.byte_count(),
            fragments = sequence,
            "Stream completed"
        );
        Ok(session.into_text())
    }
}

fn fail(mut session: StreamSession, kind: StreamErrorKind) -> StreamError {
    session.fail();
    info!(
        chunks = session.chunk_count(),
        bytes = session.byte_count(),
        error = %kind,
        "Stream failed"
    );
    StreamError {
        kind,
        partial_text: session.into_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::ScriptedTransport;
    use crate::ui::markdown::{MarkdownRenderer, RenderError};

    fn consumer() -> StreamingResponseConsumer<MarkdownRenderer> {
        StreamingResponseConsumer::new(MarkdownRenderer::plain())
    }

    fn reset() -> TransportError {
        TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))
    }

    async fn collect(
        consumer: &StreamingResponseConsumer<impl Renderer>,
        transport: ScriptedTransport,
    ) -> (Result<String, StreamError>, Vec<RenderedFragment>) {
        let mut fragments = Vec::new();
        let result = consumer
            .consume(transport, &mut |fragment: &RenderedFragment| {
                fragments.push(fragment.clone())
            })
            .await;
        (result, fragments)
    }

    #[tokio::test]
    async fn bold_text_split_across_three_chunks() {
        let transport = ScriptedTransport::from_chunks(["Hel", "lo **wor", "ld**"]);
        let (result, fragments) = collect(&consumer(), transport).await;

        assert_eq!(result.unwrap(), "Hello **world**");
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].html, "<p>Hel</p>\n");
        let last = fragments.last().unwrap();
        assert!(last.html.contains("<strong>world</strong>"));
        assert_eq!(last.sequence, 3);
        assert!(!last.fallback);
    }

    #[tokio::test]
    async fn empty_stream_succeeds_without_fragments() {
        let (result, fragments) = collect(&consumer(), ScriptedTransport::default()).await;
        assert_eq!(result.unwrap(), "");
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn failure_after_one_chunk_keeps_the_partial_fragment() {
        let transport = ScriptedTransport::from_chunks(["Partial *answer"]).then_fail(reset());
        let (result, fragments) = collect(&consumer(), transport).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            StreamErrorKind::Transport(TransportError::Io(_))
        ));
        assert_eq!(err.partial_text(), "Partial *answer");
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].html, "<p>Partial *answer</p>\n");
    }

    #[tokio::test]
    async fn partial_text_is_the_concatenation_of_delivered_chunks() {
        let transport = ScriptedTransport::from_chunks(["one ", "two ", "three"])
            .then_fail(TransportError::Closed);
        let (result, _) = collect(&consumer(), transport).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            StreamErrorKind::Transport(TransportError::Closed)
        ));
        assert_eq!(err.into_partial_text(), "one two three");
    }

    #[tokio::test]
    async fn status_failure_before_any_chunk() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Status {
            status: 500,
            message: Some("Internal Server Error".into()),
        })]);
        let (result, fragments) = collect(&consumer(), transport).await;
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.partial_text(), "");
        assert!(fragments.is_empty());
        assert_eq!(
            err.to_string(),
            "stream failed: server returned 500: Internal Server Error"
        );
    }

    #[tokio::test]
    async fn split_multibyte_character_decodes_cleanly() {
        let e_acute = "é".as_bytes();
        let transport = ScriptedTransport::from_chunks([
            b"caf".to_vec(),
            vec![e_acute[0]],
            vec![e_acute[1]],
        ]);
        let (result, fragments) = collect(&consumer(), transport).await;

        assert_eq!(result.unwrap(), "café");
        // The lone lead byte adds no text, so it produces no fragment.
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].html, "<p>café</p>\n");
        assert!(fragments.iter().all(|f| !f.html.contains('\u{fffd}')));
    }

    #[tokio::test]
    async fn every_chunking_converges_on_the_one_shot_render() {
        let text = "# Résumé 🦀\n\nSome **bold** and `code`.\n\n```rust\nfn main() {}\n```\n\n- ünïcödé\n- <b>x</b>\n";
        let renderer = MarkdownRenderer::default();
        let expected = renderer.render(text).unwrap();
        let consumer = StreamingResponseConsumer::new(&renderer);

        for size in 1..=text.len() {
            let (result, fragments) =
                collect(&consumer, ScriptedTransport::split_bytes(text, size)).await;
            assert_eq!(result.unwrap(), text, "chunk size {size}");
            assert_eq!(
                fragments.last().map(|f| f.html.as_str()),
                Some(expected.as_str()),
                "chunk size {size}"
            );
        }
    }

    #[tokio::test]
    async fn accumulated_length_never_decreases() {
        let transport = ScriptedTransport::split_bytes("a ñ b 😀 c **d** e", 2);
        let (result, fragments) = collect(&consumer(), transport).await;
        assert!(result.is_ok());
        for pair in fragments.windows(2) {
            assert!(pair[0].text_len <= pair[1].text_len);
            assert_eq!(pair[0].sequence + 1, pair[1].sequence);
        }
    }

    #[tokio::test]
    async fn malformed_bytes_abort_with_partial_text() {
        let transport =
            ScriptedTransport::from_chunks([b"fine ".to_vec(), vec![0xff], b"never".to_vec()]);
        let (result, fragments) = collect(&consumer(), transport).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            StreamErrorKind::Decode(DecodeError::Malformed { offset: 5, len: 1 })
        ));
        assert_eq!(err.partial_text(), "fine ");
        assert_eq!(fragments.len(), 1);
    }

    #[tokio::test]
    async fn stream_ending_mid_character_is_a_decode_error() {
        let crab = "🦀".as_bytes();
        let mut first = b"ok ".to_vec();
        first.extend_from_slice(&crab[..2]);
        let (result, _) = collect(&consumer(), ScriptedTransport::from_chunks([first])).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            StreamErrorKind::Decode(DecodeError::Incomplete { pending: 2 })
        ));
        assert_eq!(err.partial_text(), "ok ");
    }

    struct FlakyRenderer;

    impl Renderer for FlakyRenderer {
        fn render(&self, markdown: &str) -> Result<String, RenderError> {
            if markdown.contains("boom") && !markdown.contains("recovered") {
                Err(RenderError::Highlight {
                    lang: "rust".into(),
                    message: "boom".into(),
                })
            } else {
                MarkdownRenderer::plain().render(markdown)
            }
        }
    }

    #[tokio::test]
    async fn render_failure_falls_back_without_aborting() {
        let consumer = StreamingResponseConsumer::new(FlakyRenderer);
        let transport = ScriptedTransport::from_chunks(["start ", "<boom> ", "recovered"]);
        let (result, fragments) = collect(&consumer, transport).await;

        assert_eq!(result.unwrap(), "start <boom> recovered");
        assert_eq!(fragments.len(), 3);
        assert!(!fragments[0].fallback);
        assert!(fragments[1].fallback);
        assert_eq!(
            fragments[1].html,
            "<pre class=\"raw\">start &lt;boom&gt; </pre>\n"
        );
        assert!(!fragments[2].fallback);
    }
}
