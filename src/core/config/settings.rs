//! Setting and clearing individual configuration keys by name.

use crate::core::config::data::Config;
use crate::core::transport::MAX_CHUNK_SIZE;
use crate::utils::syntax::available_themes;
use std::fmt;

pub const KEYS: [&str; 7] = [
    "base-url",
    "model",
    "syntax",
    "syntax-theme",
    "connect-timeout",
    "chunk-size",
    "viewport-lines",
];

/// Errors that can occur when modifying configuration settings.
#[derive(Debug, PartialEq, Eq)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The provided value could not be parsed as a boolean.
    InvalidBoolean(String),
    /// The provided value is not a positive whole number.
    InvalidNumber { key: &'static str, input: String },
    /// The provided syntax theme is not bundled.
    UnknownTheme(String),
    /// The provided value is larger than the key allows.
    TooLarge { key: &'static str, max: usize },
    /// The provided value is empty.
    EmptyValue(&'static str),
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                write!(f, "Unknown config key: {key} (known keys: {})", KEYS.join(", "))
            }
            SettingError::InvalidBoolean(input) => write!(
                f,
                "Invalid boolean value: {input}. Use 'on' or 'off' (also accepts true/false, yes/no)"
            ),
            SettingError::InvalidNumber { key, input } => {
                write!(f, "Invalid value for {key}: {input} (expected a positive number)")
            }
            SettingError::UnknownTheme(name) => write!(
                f,
                "Unknown syntax theme: {name} (available: {})",
                available_themes().join(", ")
            ),
            SettingError::TooLarge { key, max } => {
                write!(f, "Invalid value for {key}: must be at most {max}")
            }
            SettingError::EmptyValue(key) => write!(f, "A value is required for {key}"),
        }
    }
}

impl std::error::Error for SettingError {}

fn parse_bool(input: &str) -> Result<bool, SettingError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(SettingError::InvalidBoolean(input.to_string())),
    }
}

fn parse_positive<T>(key: &'static str, input: &str) -> Result<T, SettingError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match input.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(SettingError::InvalidNumber {
            key,
            input: input.to_string(),
        }),
    }
}

pub(crate) fn parse_chunk_size(input: &str) -> Result<usize, SettingError> {
    let size: usize = parse_positive("chunk-size", input)?;
    if size > MAX_CHUNK_SIZE {
        return Err(SettingError::TooLarge {
            key: "chunk-size",
            max: MAX_CHUNK_SIZE,
        });
    }
    Ok(size)
}

fn known_theme(input: &str) -> Result<String, SettingError> {
    let name = non_empty("syntax-theme", input)?;
    if available_themes().iter().any(|theme| *theme == name) {
        Ok(name)
    } else {
        Err(SettingError::UnknownTheme(name))
    }
}

fn non_empty(key: &'static str, input: &str) -> Result<String, SettingError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(SettingError::EmptyValue(key))
    } else {
        Ok(trimmed.to_string())
    }
}

impl Config {
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        match key {
            "base-url" => self.base_url = Some(non_empty("base-url", value)?),
            "model" => self.model = Some(non_empty("model", value)?),
            "syntax" => self.syntax = Some(parse_bool(value)?),
            "syntax-theme" => self.syntax_theme = Some(known_theme(value)?),
            "connect-timeout" => {
                self.connect_timeout_secs = Some(parse_positive("connect-timeout", value)?)
            }
            "chunk-size" => self.chunk_size = Some(parse_chunk_size(value)?),
            "viewport-lines" => {
                self.viewport_lines = Some(parse_positive("viewport-lines", value)?)
            }
            other => return Err(SettingError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), SettingError> {
        match key {
            "base-url" => self.base_url = None,
            "model" => self.model = None,
            "syntax" => self.syntax = None,
            "syntax-theme" => self.syntax_theme = None,
            "connect-timeout" => self.connect_timeout_secs = None,
            "chunk-size" => self.chunk_size = None,
            "viewport-lines" => self.viewport_lines = None,
            other => return Err(SettingError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}
