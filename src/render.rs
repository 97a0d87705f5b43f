use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pulldown_cmark::{Event, MetadataBlockKind, Options, Parser, Tag, TagEnd, html};
use regex::{Captures, Regex};
use serde::Deserialize;

/// Title used when neither front matter nor a heading provides one.
pub const UNTITLED: &str = "Untitled";

/// `{{ title }}` / `{{ content }}` placeholders in a theme template. The
/// `{{.Title}}` / `{{.Content}}` spellings of older themes are accepted too.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(title|content|\.Title|\.Content)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Turns source bytes into rendered bytes. Implementations hold no per-call state.
pub trait Converter: Send + Sync {
    fn convert(&self, source: &[u8]) -> Result<Vec<u8>, ConvertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// The configured theme could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("failed to load theme {}: {source}", .path.display())]
pub struct ThemeError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
}

/// Markdown to HTML with GitHub-flavoured extensions and an optional page template.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    template: Option<String>,
}

impl MarkdownRenderer {
    /// Build a renderer, loading `<config_dir>/themes/<theme>.html` when a theme is set.
    ///
    /// The theme is read once here; later edits to it are not picked up.
    pub fn new(config_dir: &Path, theme: Option<&str>) -> Result<Self, ThemeError> {
        let Some(theme) = theme.filter(|t| !t.is_empty()) else {
            return Ok(Self::default());
        };
        let path = config_dir.join("themes").join(format!("{theme}.html"));
        let template = std::fs::read_to_string(&path).map_err(|source| ThemeError {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(theme = %path.display(), "theme loaded");
        Ok(Self {
            template: Some(template),
        })
    }

    /// Use `template` verbatim as the page template.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
        }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
    }

    /// Render `markdown`, returning the HTML body and the document title.
    pub fn render_body(markdown: &str) -> (String, String) {
        // Parse once; the same events feed title extraction and the HTML writer.
        let events: Vec<Event<'_>> = Parser::new_ext(markdown, Self::options()).collect();
        let title = extract_title(&events);

        let mut body = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut body, events.into_iter());
        (body, title)
    }
}

impl Converter for MarkdownRenderer {
    fn convert(&self, source: &[u8]) -> Result<Vec<u8>, ConvertError> {
        let markdown = std::str::from_utf8(source)?;
        let (body, title) = Self::render_body(markdown);

        let Some(template) = &self.template else {
            return Ok(body.into_bytes());
        };
        let page = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "title" | ".Title" => escape_html(&title),
            _ => body.clone(),
        });
        Ok(page.into_owned().into_bytes())
    }
}

/// Front matter `title`, else the first heading's text, else `Untitled`.
fn extract_title(events: &[Event<'_>]) -> String {
    if let Some(title) = front_matter_title(events) {
        return title;
    }
    first_heading(events).unwrap_or_else(|| UNTITLED.to_string())
}

fn front_matter_title(events: &[Event<'_>]) -> Option<String> {
    let mut in_meta = false;
    let mut yaml = String::new();
    for event in events {
        match event {
            Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle)) => in_meta = true,
            Event::End(TagEnd::MetadataBlock(_)) => break,
            Event::Text(text) if in_meta => yaml.push_str(text),
            _ if !in_meta => return None,
            _ => {}
        }
    }
    if yaml.is_empty() {
        return None;
    }
    match serde_yaml::from_str::<FrontMatter>(&yaml) {
        Ok(meta) => meta.title.filter(|t| !t.is_empty()),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring unparsable front matter");
            None
        }
    }
}

fn first_heading(events: &[Event<'_>]) -> Option<String> {
    let start = events
        .iter()
        .position(|e| matches!(e, Event::Start(Tag::Heading { .. })))?;
    let mut text = String::new();
    for event in &events[start + 1..] {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    Some(text)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
