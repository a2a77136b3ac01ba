//! Fragment observers that put rendered output somewhere visible.
//!
//! Observers cannot fail mid-stream, so each sink keeps the first write error
//! and reports it from `finish`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::core::consumer::{FragmentObserver, RenderedFragment};
use crate::utils::scroll::ScrollFollow;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Writes each fragment as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    sequence: usize,
    text_len: usize,
    fallback: bool,
    html: &'a str,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    fn write_frame(&mut self, fragment: &RenderedFragment) -> io::Result<()> {
        let record = FrameRecord {
            sequence: fragment.sequence,
            text_len: fragment.text_len,
            fallback: fragment.fallback,
            html: &fragment.html,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.writer),
        }
    }
}

impl<W: Write> FragmentObserver for JsonLinesSink<W> {
    fn on_fragment(&mut self, fragment: &RenderedFragment) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_frame(fragment) {
            self.error = Some(err);
        }
    }
}

/// Keeps an HTML file holding the latest fragment. Each update is written to a
/// temporary file next to the target and renamed over it, so readers never
/// see a half-written document.
pub struct HtmlFileSink {
    path: PathBuf,
    latest: Option<String>,
    error: Option<io::Error>,
}

impl HtmlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latest: None,
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewrite(&self, html: &str) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(html.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Write `html` directly, e.g. the final answer after the stream ends.
    pub fn write_final(&mut self, html: &str) -> io::Result<()> {
        self.latest = Some(html.to_string());
        self.rewrite(html)
    }

    pub fn finish(self) -> io::Result<Option<String>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.latest),
        }
    }
}

impl FragmentObserver for HtmlFileSink {
    fn on_fragment(&mut self, fragment: &RenderedFragment) {
        if self.error.is_some() {
            return;
        }
        match self.rewrite(&fragment.html) {
            Ok(()) => self.latest = Some(fragment.html.clone()),
            Err(err) => self.error = Some(err),
        }
    }
}

/// Redraws the tail of the latest fragment on a terminal, following new
/// content as it arrives.
pub struct LiveView<W: Write> {
    writer: W,
    scroll: ScrollFollow,
    lines: Vec<String>,
    error: Option<io::Error>,
}

impl<W: Write> LiveView<W> {
    pub fn new(writer: W, viewport_height: usize) -> Self {
        Self {
            writer,
            scroll: ScrollFollow::new(viewport_height.max(1)),
            lines: Vec::new(),
            error: None,
        }
    }

    pub fn scroll(&self) -> &ScrollFollow {
        &self.scroll
    }

    fn redraw(&mut self) -> io::Result<()> {
        self.writer.write_all(CLEAR_SCREEN.as_bytes())?;
        for line in &self.lines[self.scroll.visible_range()] {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.writer),
        }
    }
}

impl<W: Write> FragmentObserver for LiveView<W> {
    fn on_fragment(&mut self, fragment: &RenderedFragment) {
        if self.error.is_some() {
            return;
        }
        self.lines = fragment.html.lines().map(str::to_owned).collect();
        self.scroll.content_changed(self.lines.len());
        if let Err(err) = self.redraw() {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(sequence: usize, html: &str) -> RenderedFragment {
        RenderedFragment {
            html: html.to_string(),
            text_len: html.len(),
            sequence,
            fallback: false,
        }
    }

    #[test]
    fn json_lines_sink_writes_one_record_per_fragment() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_fragment(&fragment(1, "<p>a</p>\n"));
        sink.on_fragment(&fragment(2, "<p>ab</p>\n"));
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["sequence"], 2);
        assert_eq!(records[1]["html"], "<p>ab</p>\n");
        assert_eq!(records[0]["fallback"], false);
    }

    #[test]
    fn html_file_sink_keeps_latest_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("answer.html");
        let mut sink = HtmlFileSink::new(&path);
        sink.on_fragment(&fragment(1, "<p>Hel</p>\n"));
        sink.on_fragment(&fragment(2, "<p>Hello</p>\n"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>Hello</p>\n");
        assert_eq!(sink.finish().unwrap().as_deref(), Some("<p>Hello</p>\n"));
    }

    #[test]
    fn html_file_sink_reports_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut sink = HtmlFileSink::new(blocker.join("answer.html"));
        sink.on_fragment(&fragment(1, "<p>x</p>"));
        assert!(sink.finish().is_err());
    }

    #[test]
    fn live_view_shows_the_newest_lines() {
        let mut view = LiveView::new(Vec::new(), 2);
        view.on_fragment(&fragment(1, "<p>one</p>\n"));
        view.on_fragment(&fragment(2, "<p>one</p>\n<p>two</p>\n<p>three</p>\n"));
        assert_eq!(view.scroll().offset(), 1);
        let out = String::from_utf8(view.finish().unwrap()).unwrap();
        let last_frame = out.rsplit(CLEAR_SCREEN).next().unwrap();
        assert_eq!(last_frame, "<p>two</p>\n<p>three</p>\n");
    }
}
