use super::sanitize::escape_html;
use super::RenderError;
use crate::utils::syntax::highlight_code_block;
use pulldown_cmark::CodeBlockKind;

pub(super) fn language_hint_from_codeblock_kind(kind: CodeBlockKind) -> String {
    match kind {
        CodeBlockKind::Indented => String::new(),
        CodeBlockKind::Fenced(info) => info.split_ascii_whitespace().next().unwrap_or("").into(),
    }
}

fn open_pre(lang: &str, background: Option<&str>) -> String {
    let mut tag = String::from("<pre class=\"code\"");
    if !lang.is_empty() {
        tag.push_str(&format!(" data-lang=\"{}\"", escape_html(lang)));
    }
    if let Some(bg) = background {
        tag.push_str(&format!(" style=\"background-color:{bg};\""));
    }
    tag.push('>');
    tag
}

/// HTML for one fenced or indented code block.
pub(super) fn code_block_html(
    lang: &str,
    code: &str,
    syntax_enabled: bool,
    syntax_theme: &str,
) -> Result<String, RenderError> {
    if !syntax_enabled {
        return Ok(format!(
            "{}<code>{}</code></pre>\n",
            open_pre(lang, None),
            escape_html(code)
        ));
    }

    let block = highlight_code_block(lang, code, syntax_theme)?;
    Ok(format!(
        "{}<code>{}</code></pre>\n",
        open_pre(lang, block.background.as_deref()),
        block.html
    ))
}
