use super::data::{Config, DEFAULT_BASE_URL, DEFAULT_MODEL};
use super::io::ConfigError;
use super::settings::SettingError;
use crate::core::transport::MAX_CHUNK_SIZE;
use crate::utils::syntax::DEFAULT_SYNTAX_THEME;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).expect("load failed");
    assert_eq!(config, Config::default());
    assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    assert_eq!(config.model(), DEFAULT_MODEL);
    assert!(config.syntax_enabled());
    assert_eq!(config.syntax_theme(), DEFAULT_SYNTAX_THEME);
    assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    assert_eq!(config.chunk_size(), 4096);
    assert_eq!(config.viewport_lines(), 24);
}

#[test]
fn parses_all_fields() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
base_url = "https://chat.example.com"
model = "o4-mini"
syntax = false
syntax_theme = "InspiredGitHub"
connect_timeout_secs = 3
chunk_size = 16
viewport_lines = 40
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).expect("load failed");
    assert_eq!(config.base_url(), "https://chat.example.com");
    assert_eq!(config.model(), "o4-mini");
    assert!(!config.syntax_enabled());
    assert_eq!(config.syntax_theme(), "InspiredGitHub");
    assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    assert_eq!(config.chunk_size(), 16);
    assert_eq!(config.viewport_lines(), 40);
}

#[test]
fn invalid_toml_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "base_url = [unterminated").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn save_then_load_preserves_settings() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set_value("base-url", "http://localhost:8000/").unwrap();
    config.set_value("syntax", "off").unwrap();
    config.save_to_path(&path).expect("save failed");

    let loaded = Config::load_from_path(&path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.base_url(), "http://localhost:8000/");
}

#[test]
fn set_value_validates_input() {
    let mut config = Config::default();
    assert_eq!(
        config.set_value("syntax", "maybe"),
        Err(SettingError::InvalidBoolean("maybe".into()))
    );
    assert_eq!(
        config.set_value("chunk-size", "0"),
        Err(SettingError::InvalidNumber {
            key: "chunk-size",
            input: "0".into()
        })
    );
    assert_eq!(
        config.set_value("model", "  "),
        Err(SettingError::EmptyValue("model"))
    );
    assert!(matches!(
        config.set_value("theme", "dark"),
        Err(SettingError::UnknownKey(_))
    ));
    config.set_value("connect-timeout", "30").unwrap();
    assert_eq!(config.connect_timeout(), Duration::from_secs(30));
}

#[test]
fn chunk_size_has_an_upper_bound() {
    let mut config = Config::default();
    assert_eq!(
        config.set_value("chunk-size", "18446744073709551615"),
        Err(SettingError::TooLarge {
            key: "chunk-size",
            max: MAX_CHUNK_SIZE
        })
    );
    assert!(config.chunk_size.is_none());
    config
        .set_value("chunk-size", &MAX_CHUNK_SIZE.to_string())
        .unwrap();
    assert_eq!(config.chunk_size(), MAX_CHUNK_SIZE);
}

#[test]
fn oversized_chunk_size_in_file_falls_back_to_default() {
    let config = Config {
        chunk_size: Some(usize::MAX),
        ..Default::default()
    };
    assert_eq!(config.chunk_size(), 4096);
}

#[test]
fn syntax_theme_must_be_bundled() {
    let mut config = Config::default();
    assert_eq!(
        config.set_value("syntax-theme", "no-such-theme"),
        Err(SettingError::UnknownTheme("no-such-theme".into()))
    );
    config.set_value("syntax-theme", "InspiredGitHub").unwrap();
    assert_eq!(config.syntax_theme(), "InspiredGitHub");
}

#[test]
fn unset_value_restores_default() {
    let mut config = Config::default();
    config.set_value("model", "o4-mini").unwrap();
    config.unset_value("model").unwrap();
    assert_eq!(config.model(), DEFAULT_MODEL);
    assert!(config.unset_value("nope").is_err());
}

#[test]
fn zero_sizes_fall_back_to_defaults() {
    let config = Config {
        chunk_size: Some(0),
        viewport_lines: Some(0),
        ..Default::default()
    };
    assert_eq!(config.chunk_size(), 4096);
    assert_eq!(config.viewport_lines(), 24);
}

#[test]
fn describe_marks_defaults() {
    let config = Config {
        model: Some("o4-mini".into()),
        ..Default::default()
    };
    let lines = config.describe();
    assert!(lines.contains(&"  model: o4-mini".to_string()));
    assert!(lines.contains(&"  syntax: on (default)".to_string()));
    assert_eq!(lines.len(), 7);
}
