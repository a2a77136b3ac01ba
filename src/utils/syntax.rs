use crate::ui::markdown::RenderError;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{append_highlighted_html_for_styled_line, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

const FALLBACK_THEMES: [&str; 3] = ["base16-ocean.dark", "InspiredGitHub", "Solarized (light)"];
const CACHE_CAPACITY: usize = 64;

/// Highlighted body of a fenced code block: escaped, inline-styled spans
/// ready to sit inside `<pre><code>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightedBlock {
    pub html: String,
    pub background: Option<String>,
}

// Simple FIFO cache (bounded) for highlighted blocks
// key = (lang_norm, hash)

fn hash_code(lang: &str, code: &str, theme_name: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_name.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<(String, u64), HighlightedBlock>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }
    fn get(&self, k: &(String, u64)) -> Option<HighlightedBlock> {
        self.map.get(k).cloned()
    }
    fn put(&mut self, k: (String, u64), v: HighlightedBlock) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k.clone());
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn get_cache() -> MutexGuard<'static, Option<SimpleCache>> {
    // The cache only holds finished values, so a poisoned lock is still usable.
    SYNTAX_CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

pub(crate) fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "json" => "json".into(),
        "toml" => "toml".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "go" => "go".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "java" => "java".into(),
        "kotlin" | "kt" => "kotlin".into(),
        "swift" => "swift".into(),
        "html" => "html".into(),
        "css" => "css".into(),
        "sql" => "sql".into(),
        other => other.into(),
    }
}

fn css_color(c: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

/// Names of the bundled syntax themes, sorted.
pub fn available_themes() -> Vec<String> {
    let mut names: Vec<String> = theme_set().themes.keys().cloned().collect();
    names.sort();
    names
}

fn resolve_theme(name: &str) -> Option<&'static Theme> {
    let themes = &theme_set().themes;
    themes.get(name).or_else(|| {
        FALLBACK_THEMES
            .iter()
            .find_map(|fallback| themes.get(*fallback))
    })
}

pub fn highlight_code_block(
    lang_hint: &str,
    code: &str,
    theme_name: &str,
) -> Result<HighlightedBlock, RenderError> {
    let lang_norm = normalize_lang_hint(lang_hint);
    let key = (lang_norm.clone(), hash_code(&lang_norm, code, theme_name));
    if let Some(block) = get_cache().as_ref().and_then(|c| c.get(&key)) {
        return Ok(block);
    }

    let syn_theme = resolve_theme(theme_name).ok_or_else(|| RenderError::Highlight {
        lang: lang_norm.clone(),
        message: format!("no usable syntax theme (requested {theme_name})"),
    })?;

    let ps = syntax_set();
    let syntax = ps
        .find_syntax_by_token(&lang_norm)
        .unwrap_or_else(|| ps.find_syntax_plain_text());

    let to_render_error = |err: syntect::Error| RenderError::Highlight {
        lang: lang_norm.clone(),
        message: err.to_string(),
    };

    let mut h = HighlightLines::new(syntax, syn_theme);
    let mut html = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        let ranges = h.highlight_line(line, ps).map_err(to_render_error)?;
        append_highlighted_html_for_styled_line(&ranges, IncludeBackground::No, &mut html)
            .map_err(to_render_error)?;
    }

    let block = HighlightedBlock {
        html,
        background: syn_theme.settings.background.map(css_color),
    };

    get_cache()
        .get_or_insert_with(|| SimpleCache::new(CACHE_CAPACITY))
        .put(key, block.clone());
    Ok(block)
}
