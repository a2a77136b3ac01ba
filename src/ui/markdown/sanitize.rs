//! Output hygiene for Markdown that arrives from the network.
//!
//! Raw HTML in the source is never passed through: it is turned into text and
//! escaped. Link and image targets are limited to a small set of schemes.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];
const NEUTRAL_URL: &str = "#";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// True when `url` is relative or uses an allowed scheme.
///
/// Whitespace and control characters are ignored while looking for the
/// scheme, since browsers drop them too (`java\tscript:` is `javascript:`).
pub fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let Some(colon) = cleaned.find(':') else {
        return true;
    };
    let prefix = &cleaned[..colon];
    if prefix.contains(['/', '?', '#']) {
        // The colon belongs to a path, query or fragment.
        return true;
    }
    let scheme = prefix.to_ascii_lowercase();
    ALLOWED_SCHEMES.contains(&scheme.as_str())
}

fn neutralize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed(NEUTRAL_URL)
    }
}

/// Rewrite one parser event so the HTML writer cannot emit executable markup.
pub fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::HtmlBlock) => Event::Start(Tag::Paragraph),
        Event::End(TagEnd::HtmlBlock) => Event::End(TagEnd::Paragraph),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: neutralize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: neutralize_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_attribute_breakers() {
        assert_eq!(
            escape_html(r#"<a href="x" onclick='y'>&</a>"#),
            "&lt;a href=&quot;x&quot; onclick=&#39;y&#39;&gt;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn allows_web_mail_and_relative_urls() {
        assert!(is_safe_url("https://example.com/a:b"));
        assert!(is_safe_url("HTTP://EXAMPLE.COM"));
        assert!(is_safe_url("mailto:someone@example.com"));
        assert!(is_safe_url("/docs/page"));
        assert!(is_safe_url("#section"));
        assert!(is_safe_url("notes/today:draft"));
        assert!(is_safe_url("?q=a:b"));
    }

    #[test]
    fn rejects_script_and_data_schemes() {
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("JaVaScRiPt:alert(1)"));
        assert!(!is_safe_url(" java\tscript:alert(1)"));
        assert!(!is_safe_url("vbscript:msgbox"));
        assert!(!is_safe_url("data:text/html;base64,PHNjcmlwdD4="));
        assert!(!is_safe_url(":nothing"));
    }

    #[test]
    fn raw_html_events_become_text() {
        let event = sanitize_event(Event::InlineHtml("<b onclick=x>".into()));
        assert_eq!(event, Event::Text("<b onclick=x>".into()));
    }
}
