use crate::core::transport::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::utils::syntax::DEFAULT_SYNTAX_THEME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_MODEL: &str = "chatgpt-4o-latest";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VIEWPORT_LINES: usize = 24;

/// User configuration. Every field is optional; accessors fill in defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Root URL of the chat backend
    pub base_url: Option<String>,
    /// Model requested for new replies
    pub model: Option<String>,
    /// Enable syntax highlighting for fenced code blocks
    pub syntax: Option<bool>,
    /// syntect theme used for highlighting
    pub syntax_theme: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    /// Read size for local files and stdin
    pub chunk_size: Option<usize>,
    /// Height of the live terminal view, in lines
    pub viewport_lines: Option<usize>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax.unwrap_or(true)
    }

    pub fn syntax_theme(&self) -> &str {
        self.syntax_theme.as_deref().unwrap_or(DEFAULT_SYNTAX_THEME)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Zero or oversized values from a hand-edited file fall back to the default.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
            .filter(|size| (1..=MAX_CHUNK_SIZE).contains(size))
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn viewport_lines(&self) -> usize {
        self.viewport_lines
            .filter(|lines| *lines > 0)
            .unwrap_or(DEFAULT_VIEWPORT_LINES)
    }

    /// One `key: value` line per setting, marking values that are defaults.
    pub fn describe(&self) -> Vec<String> {
        fn line(key: &str, value: String, is_set: bool) -> String {
            if is_set {
                format!("  {key}: {value}")
            } else {
                format!("  {key}: {value} (default)")
            }
        }
        let on_off = |b: bool| if b { "on" } else { "off" }.to_string();

        vec![
            line("base-url", self.base_url().to_string(), self.base_url.is_some()),
            line("model", self.model().to_string(), self.model.is_some()),
            line("syntax", on_off(self.syntax_enabled()), self.syntax.is_some()),
            line(
                "syntax-theme",
                self.syntax_theme().to_string(),
                self.syntax_theme.is_some(),
            ),
            line(
                "connect-timeout",
                format!("{}s", self.connect_timeout().as_secs()),
                self.connect_timeout_secs.is_some(),
            ),
            line(
                "chunk-size",
                self.chunk_size().to_string(),
                self.chunk_size.is_some(),
            ),
            line(
                "viewport-lines",
                self.viewport_lines().to_string(),
                self.viewport_lines.is_some(),
            ),
        ]
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.describe() {
            println!("{line}");
        }
    }
}
