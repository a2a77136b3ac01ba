//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod conversation_list;
pub mod render;
pub mod send;
pub mod stream;


use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::conversation_list::list_conversations;
use crate::cli::render::run_render;
use crate::cli::send::run_send;
use crate::cli::stream::OutputOptions;
use crate::core::config::data::path_display;
use crate::core::config::io::default_config_path;
use crate::core::config::settings::parse_chunk_size;
use crate::core::config::{Config, ConfigError};
use crate::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "streamdown")]
#[command(version)]
#[command(about = "Stream chat replies as sanitized, incrementally rendered HTML")]
#[command(
    long_about = "Streamdown sends a prompt to a chat backend and renders the streamed reply \
as it arrives. Every chunk re-renders the accumulated Markdown into sanitized HTML, so \
what you see is always a complete, well-formed document.\n\n\
Output:\n\
  (default)         Print the final HTML once the stream ends\n\
  --frames          Print every rendered fragment as a JSON line\n\
  --live            Redraw the newest lines of the terminal as text arrives\n\
  --output FILE     Keep FILE updated with the latest fragment\n\n\
Environment Variables:\n\
  STREAMDOWN_LOG    Log filter directive (e.g. 'debug'); logs go to stderr\n\n\
Controls:\n\
  Ctrl+C            Stop the stream and keep the partial answer"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Read and write configuration at PATH instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Chat backend root URL (overrides the configured base-url)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Render code blocks without syntax highlighting
    #[arg(long, global = true)]
    pub no_syntax: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a prompt to a conversation and stream the reply
    Send {
        /// Conversation to post to
        conversation_id: i64,
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        prompt: Vec<String>,
        /// Model to request (defaults to the configured model)
        #[arg(short = 'm', long)]
        model: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Stream a Markdown file (or stdin) through the renderer
    Render {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        /// Bytes per chunk (defaults to the configured chunk-size)
        #[arg(long, value_name = "BYTES", value_parser = parse_chunk_size_arg)]
        chunk_size: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List conversations on the backend
    Conversations,
    /// Show the current configuration
    Config,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Print every rendered fragment as a JSON line
    #[arg(long, conflicts_with = "live")]
    pub frames: bool,
    /// Redraw the newest lines on the terminal as fragments arrive
    #[arg(long)]
    pub live: bool,
    /// Keep FILE updated with the latest rendered fragment
    #[arg(short = 'o', long, value_name = "FILE", conflicts_with_all = ["frames", "live"])]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    fn into_options(self, config: &Config) -> OutputOptions {
        OutputOptions {
            frames: self.frames,
            live: self.live,
            output: self.output,
            viewport_lines: config.viewport_lines(),
        }
    }
}

fn parse_chunk_size_arg(input: &str) -> Result<usize, String> {
    parse_chunk_size(input).map_err(|err| err.to_string())
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config_path = args.config.clone().or_else(default_config_path);

    match args.command {
        Commands::Config => {
            let config = load_config(config_path.as_deref())?;
            if let Some(path) = &config_path {
                println!("Config file: {}", path_display(path));
            }
            config.print_all();
            Ok(())
        }
        Commands::Set { key, value } => {
            let path = config_path.ok_or(ConfigError::NoConfigDir)?;
            let mut config = load_config(Some(&path))?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save_to_path(&path)?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let path = config_path.ok_or(ConfigError::NoConfigDir)?;
            let mut config = load_config(Some(&path))?;
            if let Err(e) = config.unset_value(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save_to_path(&path)?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Conversations => {
            let config = runtime_config(config_path.as_deref(), &args.base_url, args.no_syntax)?;
            list_conversations(&config).await
        }
        Commands::Send {
            conversation_id,
            prompt,
            model,
            output,
        } => {
            let config = runtime_config(config_path.as_deref(), &args.base_url, args.no_syntax)?;
            let output = output.into_options(&config);
            run_send(&config, conversation_id, prompt, model, output).await
        }
        Commands::Render {
            file,
            chunk_size,
            output,
        } => {
            let config = runtime_config(config_path.as_deref(), &args.base_url, args.no_syntax)?;
            let output = output.into_options(&config);
            run_render(&config, file, chunk_size, output).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Ok(Config::default()),
    }
}

/// The stored configuration with command-line overrides applied.
fn runtime_config(
    path: Option<&Path>,
    base_url: &Option<String>,
    no_syntax: bool,
) -> Result<Config, ConfigError> {
    let mut config = load_config(path)?;
    apply_overrides(&mut config, base_url, no_syntax);
    Ok(config)
}

fn apply_overrides(config: &mut Config, base_url: &Option<String>, no_syntax: bool) {
    if let Some(url) = base_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.base_url = Some(url.to_string());
    }
    if no_syntax {
        config.syntax = Some(false);
    }
}
