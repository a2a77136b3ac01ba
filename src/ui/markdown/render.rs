use super::code::{code_block_html, language_hint_from_codeblock_kind};
use super::sanitize::sanitize_event;
use super::{RenderError, Renderer};
use crate::utils::syntax::DEFAULT_SYNTAX_THEME;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Markdown to sanitized HTML, with optional syntect highlighting of code blocks.
///
/// Rendering depends only on the input text and the renderer's settings, so
/// re-rendering the same accumulated text always produces the same fragment.
#[derive(Clone, Debug)]
pub struct MarkdownRenderer {
    syntax_enabled: bool,
    syntax_theme: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(true, DEFAULT_SYNTAX_THEME)
    }
}

impl MarkdownRenderer {
    pub fn new(syntax_enabled: bool, syntax_theme: &str) -> Self {
        Self {
            syntax_enabled,
            syntax_theme: syntax_theme.to_string(),
        }
    }

    pub fn plain() -> Self {
        Self::new(false, DEFAULT_SYNTAX_THEME)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax_enabled
    }

    pub fn syntax_theme(&self) -> &str {
        &self.syntax_theme
    }

    fn flush_code_block(&self, lang: &str, code: &str) -> Result<Event<'static>, RenderError> {
        let html = code_block_html(lang, code, self.syntax_enabled, &self.syntax_theme)?;
        Ok(Event::Html(CowStr::from(html)))
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let mut events: Vec<Event<'_>> = Vec::new();
        // (language hint, collected code) while inside a code block
        let mut code_block: Option<(String, String)> = None;

        for event in Parser::new_ext(markdown, markdown_options()) {
            if let Some((lang, code)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        events.push(self.flush_code_block(lang, code)?);
                        code_block = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some((language_hint_from_codeblock_kind(kind), String::new()));
                }
                other => events.push(sanitize_event(other)),
            }
        }

        // The parser closes open fences at end of input; this only guards
        // against a block with no closing event.
        if let Some((lang, code)) = code_block.take() {
            events.push(self.flush_code_block(&lang, &code)?);
        }

        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}
