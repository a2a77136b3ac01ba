//! Stream a local Markdown file (or stdin) through the incremental renderer.

use std::error::Error;
use std::path::PathBuf;

use tokio::io::AsyncRead;

use crate::cli::stream::{renderer_for, report, stream_to_output, OutputOptions};
use crate::core::config::Config;
use crate::core::consumer::StreamingResponseConsumer;
use crate::core::transport::ReaderTransport;

pub async fn run_render(
    config: &Config,
    file: Option<PathBuf>,
    chunk_size: Option<usize>,
    output: OutputOptions,
) -> Result<(), Box<dyn Error>> {
    let chunk_size = chunk_size
        .filter(|size| *size > 0)
        .unwrap_or_else(|| config.chunk_size());

    match file {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
            render_reader(config, file, chunk_size, &output).await
        }
        None => render_reader(config, tokio::io::stdin(), chunk_size, &output).await,
    }
}

async fn render_reader<R>(
    config: &Config,
    reader: R,
    chunk_size: usize,
    output: &OutputOptions,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncRead + Unpin + Send,
{
    let consumer = StreamingResponseConsumer::new(renderer_for(config));
    let transport = ReaderTransport::with_chunk_size(reader, chunk_size);
    report(stream_to_output(&consumer, transport, output).await?);
    Ok(())
}
