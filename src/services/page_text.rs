//! Flattens an HTML document into text lines at block boundaries.
//!
//! Both the executive extractor and the summarizer input work from these
//! lines, so a heading, a paragraph, and a list item each end up on their
//! own line while inline markup (`<b>`, `<span>`, `<a>`) stays joined.

use scraper::{ElementRef, Html, Node, Selector};

const SKIPPED_TAGS: [&str; 8] = [
    "script", "style", "noscript", "svg", "template", "iframe", "head", "button",
];

const BOILERPLATE_TAGS: [&str; 5] = ["nav", "footer", "header", "aside", "form"];

const BLOCK_TAGS: [&str; 35] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "section", "table", "tbody", "td", "th", "thead", "tr", "ul", "body",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// `href`s of anchors that sit inside this line.
    pub links: Vec<String>,
}

#[derive(Default)]
struct LineBuilder {
    buffer: String,
    links: Vec<String>,
    lines: Vec<TextLine>,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str) {
        self.buffer.push(' ');
        self.buffer.push_str(text);
    }

    fn flush(&mut self) {
        let text = normalise_whitespace(&self.buffer);
        self.buffer.clear();

        if text.is_empty() {
            // Icon-only anchors belong to the line they follow.
            if let Some(last) = self.lines.last_mut() {
                last.links.append(&mut self.links);
            }
            return;
        }

        self.lines.push(TextLine {
            text,
            links: std::mem::take(&mut self.links),
        });
    }
}

pub fn text_lines(document: &Html) -> Vec<TextLine> {
    let mut builder = LineBuilder::default();
    walk(document.root_element(), &mut builder, &[]);
    builder.flush();
    builder.lines
}

/// Readable page text for the summarizer: main content only, capped at
/// `max_chars` characters.
pub fn readable_text(document: &Html, max_chars: usize) -> String {
    let mut builder = LineBuilder::default();

    let root = ["main", "article", "[role=\"main\"]"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    walk(root, &mut builder, &BOILERPLATE_TAGS);
    builder.flush();

    let text = builder
        .lines
        .into_iter()
        .map(|l| l.text)
        .collect::<Vec<String>>()
        .join("\n");

    truncate_chars(&text, max_chars)
}

fn walk(element: ElementRef, builder: &mut LineBuilder, skipped: &[&str]) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) || skipped.contains(&name) {
        return;
    }

    let is_block = BLOCK_TAGS.contains(&name);
    if is_block {
        builder.flush();
    }

    if name == "a" {
        if let Some(href) = element.value().attr("href") {
            builder.links.push(href.trim().to_string());
        }
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => builder.push_text(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, builder, skipped);
                }
            }
            _ => {}
        }
    }

    if is_block {
        builder.flush();
    }
}

pub fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
