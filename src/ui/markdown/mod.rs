//! Markdown rendering for streamed answers.
//!
//! Text arriving from the backend is untrusted: every renderer here returns
//! HTML that has been stripped of raw markup and unsafe link targets.

mod code;
mod render;
pub mod sanitize;


use std::error::Error as StdError;
use std::fmt;

pub use render::MarkdownRenderer;
pub use sanitize::escape_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Syntax highlighting of a code block failed.
    Highlight { lang: String, message: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Highlight { lang, message } if lang.is_empty() => {
                write!(f, "failed to highlight code block: {message}")
            }
            RenderError::Highlight { lang, message } => {
                write!(f, "failed to highlight {lang} code block: {message}")
            }
        }
    }
}

impl StdError for RenderError {}

/// Turns accumulated Markdown into sanitized HTML.
///
/// Implementations must be pure: the same text always yields the same HTML,
/// regardless of what was rendered before.
pub trait Renderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        (**self).render(markdown)
    }
}

/// Last-resort fragment: the raw text, escaped, in a preformatted block.
pub fn escape_fallback(text: &str) -> String {
    format!("<pre class=\"raw\">{}</pre>\n", escape_html(text))
}
