//! Rendering and presentation of streamed replies.
//!
//! - [`markdown`]: Markdown to sanitized HTML, with optional code highlighting.
//! - [`sink`]: fragment observers that write to the terminal, a file, or
//!   JSON lines.

pub mod markdown;
pub mod sink;
