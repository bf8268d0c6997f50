//! Chapter title and body extraction

use crate::crawler::clean::clean_chapter_text;
use crate::ScrollError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Title used when no title selector matches
pub const UNTITLED_CHAPTER: &str = "未命名章节";

/// Title selectors, tried in order; the first non-empty match wins
pub const TITLE_SELECTORS: &[&str] = &[
    "h1",
    ".chapter-title",
    ".article-title",
    "#chapter-title",
    ".title",
];

/// Body selectors; the first one that yields non-empty cleaned text wins
pub const CONTENT_SELECTORS: &[&str] = &[
    "#content",
    ".chapter-content",
    ".article-content",
    ".content",
    "#chapter-content",
    ".read-content",
    ".article",
];

/// One downloaded chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,

    /// Cleaned body text, paragraphs separated by blank lines
    pub content: String,

    pub source_url: String,

    /// Position in the table of contents
    pub original_index: usize,
}

/// Extracts a chapter from its page
///
/// # Arguments
///
/// * `html` - The chapter page body
/// * `url` - Where the page came from
/// * `original_index` - Position of the chapter in the link set
///
/// # Returns
///
/// * `Ok(Chapter)` - Title (or [`UNTITLED_CHAPTER`]) and cleaned body
/// * `Err(ScrollError::NoContentExtracted)` - No body selector produced text
pub fn extract_chapter(html: &str, url: &Url, original_index: usize) -> Result<Chapter, ScrollError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| UNTITLED_CHAPTER.to_string());

    let content = extract_body(&document).ok_or_else(|| ScrollError::NoContentExtracted {
        url: url.to_string(),
    })?;

    Ok(Chapter {
        title,
        content,
        source_url: url.to_string(),
        original_index,
    })
}

fn extract_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        let element = document.select(&selector).next()?;
        let title = element.text().collect::<Vec<_>>().join(" ");
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        (!title.is_empty()).then_some(title)
    })
}

fn extract_body(document: &Html) -> Option<String> {
    CONTENT_SELECTORS.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        let raw: String = document.select(&selector).map(visible_text).collect();
        let cleaned = clean_chapter_text(&raw);
        (!cleaned.is_empty()).then_some(cleaned)
    })
}

/// Text of an element, skipping scripts and styles, with `<br>` as a newline
fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        if let Some(fragment) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| name == "script" || name == "style");
            if !hidden {
                text.push_str(fragment);
            }
        } else if let Some(element) = node.value().as_element() {
            if element.name() == "br" {
                text.push('\n');
            }
        }
    }

    text
}
