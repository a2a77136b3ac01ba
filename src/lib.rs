//! Streamdown turns a chunked chat reply into a sequence of sanitized HTML
//! fragments while the reply is still arriving.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the streaming consumer, byte transports, UTF-8 decoding,
//!   conversation state, and configuration.
//! - [`ui`] renders Markdown into sanitized HTML and delivers fragments to
//!   terminal, file, and JSON-lines sinks.
//! - [`api`] defines the backend payloads for conversations and replies.
//! - [`utils`] holds syntax highlighting, scroll-follow, URL, and logging
//!   helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
