//! Shared output handling for commands that stream a rendered answer.

use std::error::Error;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;

use crate::core::config::Config;
use crate::core::consumer::{
    FragmentObserver, RenderedFragment, StreamError, StreamingResponseConsumer,
};
use crate::core::transport::Transport;
use crate::ui::markdown::MarkdownRenderer;
use crate::ui::sink::{HtmlFileSink, JsonLinesSink, LiveView};

#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    /// Emit every fragment as a JSON line on stdout.
    pub frames: bool,
    /// Redraw the newest lines on the terminal as fragments arrive.
    pub live: bool,
    /// Keep this HTML file updated with the latest fragment.
    pub output: Option<PathBuf>,
    pub viewport_lines: usize,
}

enum Sink {
    /// Only the final fragment is printed, after the stream ends.
    Quiet,
    Frames(JsonLinesSink<Stdout>),
    Live(LiveView<Stdout>),
    File(HtmlFileSink),
}

impl Sink {
    fn from_options(options: &OutputOptions) -> Self {
        if let Some(path) = &options.output {
            Sink::File(HtmlFileSink::new(path.clone()))
        } else if options.frames {
            Sink::Frames(JsonLinesSink::new(io::stdout()))
        } else if options.live {
            Sink::Live(LiveView::new(io::stdout(), options.viewport_lines))
        } else {
            Sink::Quiet
        }
    }
}

impl FragmentObserver for Sink {
    fn on_fragment(&mut self, fragment: &RenderedFragment) {
        match self {
            Sink::Quiet => {}
            Sink::Frames(sink) => sink.on_fragment(fragment),
            Sink::Live(view) => view.on_fragment(fragment),
            Sink::File(sink) => sink.on_fragment(fragment),
        }
    }
}

pub fn renderer_for(config: &Config) -> MarkdownRenderer {
    MarkdownRenderer::new(config.syntax_enabled(), config.syntax_theme())
}

/// Stream `transport` into the sink chosen by `options`.
///
/// On failure the partial answer stays where it was shown (or is printed,
/// for the quiet sink) and the stream error is returned for the caller to
/// report.
pub async fn stream_to_output<T: Transport>(
    consumer: &StreamingResponseConsumer<MarkdownRenderer>,
    transport: T,
    options: &OutputOptions,
) -> Result<Result<String, StreamError>, Box<dyn Error>> {
    let mut sink = Sink::from_options(options);
    let result = consumer.consume(transport, &mut sink).await;
    let text = match &result {
        Ok(text) => text.as_str(),
        Err(err) => err.partial_text(),
    };

    match sink {
        Sink::Quiet => {
            if !text.is_empty() {
                let (html, _) = consumer.render_fragment(text);
                let mut stdout = io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }
        Sink::Frames(sink) => {
            sink.finish()?;
        }
        Sink::Live(view) => {
            view.finish()?;
        }
        Sink::File(sink) => {
            let path = sink.path().to_path_buf();
            // A stream that produced no fragments still leaves a (blank) file.
            if sink.finish()?.is_none() {
                let (html, _) = consumer.render_fragment(text);
                HtmlFileSink::new(path).write_final(&html)?;
            }
        }
    }

    Ok(result)
}

/// Print the outcome of a stream and exit non-zero on failure.
pub fn report(result: Result<String, StreamError>) {
    match result {
        Ok(_) => {}
        Err(err) => {
            eprintln!();
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }
}
