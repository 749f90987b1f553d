//! Markdown to HTML rendering.
//!
//! The converter only needs a function from markup bytes to HTML bytes, so
//! rendering sits behind the [`RenderEngine`] trait. [`MarkdownEngine`] is the
//! production implementation built on `pulldown-cmark`, with a small event
//! pass layered on top:
//!
//! - **Heading ids**: every heading gets an `id` slugged from its text
//!   (`## Getting Started` → `id="getting-started"`). Repeats get `-1`, `-2`,
//!   ... suffixes; an explicit `{#id}` attribute wins.
//! - **Bare-URL autolinks**: `https://`, `http://` and `www.` URLs in text
//!   become links, except inside code and existing links.
//! - **Raw HTML**: passed through untouched by default. With `unsafe_html`
//!   off, it is replaced by an `<!-- raw HTML omitted -->` comment.
//!
//! Tables, strikethrough and task lists are enabled. Void elements are always
//! written in self-closing form (`<br />`, `<hr />`, `<img ... />`).

use crate::config::RenderOptions;
use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html};
use std::collections::HashSet;
use thiserror::Error;

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

#[derive(Error, Debug)]
pub enum RenderError {
    /// The engine refused the page's content.
    #[error("markup rejected: {0}")]
    Rejected(String),
}

/// Turns one page of markup into HTML.
pub trait RenderEngine {
    fn render(&self, markup: &[u8]) -> Result<Vec<u8>, RenderError>;
}

/// `pulldown-cmark` backed engine.
#[derive(Debug, Clone, Default)]
pub struct MarkdownEngine {
    options: RenderOptions,
}

impl MarkdownEngine {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Parser extensions enabled for every page.
    pub fn parser_options(&self) -> Options {
        let mut options =
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        if self.options.heading_ids {
            options |= Options::ENABLE_HEADING_ATTRIBUTES;
        }
        options
    }

    /// Render a UTF-8 string.
    pub fn render_str(&self, markdown: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, self.parser_options()));
        let events = self.transform(parser);

        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn transform<'a>(&self, events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::new();
        let mut ids = HeadingIds::default();
        let mut heading: Option<Vec<Event<'a>>> = None;
        let mut link_depth = 0usize;
        let mut in_code_block = false;

        for event in events {
            let event = match event {
                Event::Html(_) if !self.options.unsafe_html => Event::Html(RAW_HTML_OMITTED.into()),
                Event::InlineHtml(_) if !self.options.unsafe_html => {
                    Event::InlineHtml(RAW_HTML_OMITTED.into())
                }
                other => other,
            };

            match &event {
                Event::Start(Tag::Link { .. } | Tag::Image { .. }) => link_depth += 1,
                Event::End(TagEnd::Link | TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1)
                }
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                _ => {}
            }

            let expanded = match event {
                Event::Text(text) if self.options.autolinks && link_depth == 0 && !in_code_block => {
                    autolink(text)
                }
                other => vec![other],
            };

            for event in expanded {
                if !self.options.heading_ids {
                    out.push(event);
                    continue;
                }
                if let Some(buffer) = heading.as_mut() {
                    if matches!(event, Event::End(TagEnd::Heading(_))) {
                        assign_heading_id(buffer, &mut ids);
                        out.append(buffer);
                        out.push(event);
                        heading = None;
                    } else {
                        buffer.push(event);
                    }
                } else if matches!(event, Event::Start(Tag::Heading { .. })) {
                    heading = Some(vec![event]);
                } else {
                    out.push(event);
                }
            }
        }

        // Unterminated heading; the parser always closes them, but don't drop events.
        if let Some(mut buffer) = heading {
            out.append(&mut buffer);
        }
        out
    }
}

impl RenderEngine for MarkdownEngine {
    /// Bytes that are not valid UTF-8 become U+FFFD; a page is never
    /// rejected for its encoding.
    fn render(&self, markup: &[u8]) -> Result<Vec<u8>, RenderError> {
        let markdown = String::from_utf8_lossy(markup);
        Ok(self.render_str(&markdown).into_bytes())
    }
}

// ============================================================================
// Heading ids
// ============================================================================

/// Ids already handed out on the current page.
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn unique(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Set the id of the buffered heading's start tag from its text.
fn assign_heading_id(buffer: &mut [Event<'_>], ids: &mut HeadingIds) {
    let text: String = buffer
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) | Event::Code(t) => Some(&**t),
            _ => None,
        })
        .collect();

    if let Some(Event::Start(Tag::Heading { id, .. })) = buffer.first_mut() {
        let base = match id.take() {
            Some(explicit) => explicit.into_string(),
            None => slugify(&text),
        };
        *id = Some(CowStr::from(ids.unique(base)));
    }
}

/// Lowercase ASCII alphanumerics; whitespace, `-` and `_` collapse into
/// single dashes; everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            slug.push('-');
            last_was_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

// ============================================================================
// Autolinks
// ============================================================================

const URL_PREFIXES: &[&str] = &["https://", "http://", "www."];

/// Split a text event around bare URLs, wrapping each URL in a link.
fn autolink(text: CowStr<'_>) -> Vec<Event<'_>> {
    let spans = find_urls(&text);
    if spans.is_empty() {
        return vec![Event::Text(text)];
    }

    let mut events = Vec::with_capacity(spans.len() * 4 + 1);
    let mut cursor = 0;
    for (start, end) in spans {
        if start > cursor {
            events.push(Event::Text(CowStr::from(text[cursor..start].to_string())));
        }
        let url = &text[start..end];
        let dest = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(dest),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        cursor = end;
    }
    if cursor < text.len() {
        events.push(Event::Text(CowStr::from(text[cursor..].to_string())));
    }
    events
}

/// Byte ranges of bare URLs in `text`.
///
/// A URL must start the text or follow whitespace or one of `(*_~"'`. It runs
/// to the next whitespace or `<`, minus trailing punctuation and unbalanced
/// closing parentheses.
fn find_urls(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut prev: Option<char> = None;
    let mut skip_until = 0;

    for (i, c) in text.char_indices() {
        if i < skip_until {
            prev = Some(c);
            continue;
        }
        let at_boundary = prev.is_none_or(|p| p.is_whitespace() || "(*_~\"'".contains(p));
        prev = Some(c);
        if !at_boundary {
            continue;
        }
        let rest = &text[i..];
        let Some(prefix) = URL_PREFIXES.iter().find(|p| starts_with_ignore_case(rest, p)) else {
            continue;
        };

        let raw_len = rest
            .find(|ch: char| ch.is_whitespace() || ch == '<')
            .unwrap_or(rest.len());
        let len = trim_url_tail(&rest[..raw_len]);
        if len > prefix.len() && rest[prefix.len()..len].contains(|ch: char| ch.is_alphanumeric()) {
            spans.push((i, i + len));
            skip_until = i + len;
        }
    }
    spans
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Length of `candidate` once trailing punctuation is removed.
fn trim_url_tail(candidate: &str) -> usize {
    let mut end = candidate.len();
    loop {
        let current = &candidate[..end];
        let Some(last) = current.chars().next_back() else {
            return end;
        };
        let strip = match last {
            '?' | '!' | '.' | ',' | ':' | ';' | '*' | '_' | '~' | '\'' | '"' => true,
            ')' => current.matches(')').count() > current.matches('(').count(),
            _ => false,
        };
        if !strip {
            return end;
        }
        end -= last.len_utf8();
    }
}
