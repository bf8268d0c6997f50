//! Cheap discovery check for a table-of-contents URL
//!
//! A probe fetches the table of contents once, guesses the novel's name and
//! counts chapter links, without downloading any chapter.

use crate::crawler::links::LinkSet;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

/// `<title>` values containing these are the site's own branding, not a novel
pub const SITE_BRAND_MARKERS: &[&str] = &["5200小说网"];

/// An `<h1>` shorter than this (in characters) is taken as the novel's name
pub const MAX_HEADING_NAME_CHARS: usize = 30;

/// Rewrites applied to a page title, in order
static TITLE_CLEANUPS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"_.*$", r"最新章节.*$", r"小说$", r"全文阅读$", r"无弹窗$"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("title cleanup pattern is valid"))
        .collect()
});

static QUOTED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"《([^》]+)》").expect("quoted name pattern is valid"));

/// What a probe learned about a table-of-contents page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    /// The normalized URL that was fetched
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub novel_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_chapter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_chapter: Option<String>,

    /// Human-readable diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProbeReport {
    /// Report for a page whose chapter links were found
    pub fn with_links(base_url: &str, novel_name: Option<String>, links: &LinkSet) -> Self {
        let first_chapter = links.first().map(|link| link.url.to_string());
        let note = first_chapter.as_ref().map(|first| {
            format!("found {} chapter links, first: {}", links.len(), first)
        });

        Self {
            base_url: base_url.to_string(),
            novel_name,
            chapter_count: Some(links.len()),
            first_chapter,
            last_chapter: links.last().map(|link| link.url.to_string()),
            note,
        }
    }

    /// Report for a page that named a novel but listed no chapters
    pub fn name_only(base_url: &str, novel_name: String, reason: &str) -> Self {
        let note = Some(format!(
            "no chapter links found, but the page names the novel '{}': {}",
            novel_name, reason
        ));

        Self {
            base_url: base_url.to_string(),
            novel_name: Some(novel_name),
            chapter_count: None,
            first_chapter: None,
            last_chapter: None,
            note,
        }
    }
}

/// Guesses the novel's name from its table-of-contents page
///
/// # Name Sources
///
/// 1. The `<title>`, unless it is site branding, with `_…` and `最新章节…`
///    tails and trailing `小说`/`全文阅读`/`无弹窗` removed
/// 2. The `<h1>` text, which replaces the title when shorter than
///    [`MAX_HEADING_NAME_CHARS`]
/// 3. A `《…》` quote in the meta description, when nothing else matched
///
/// # Example
///
/// ```
/// use sumi_scroll::crawler::infer_novel_name;
///
/// let html = "<html><head><title>剑来最新章节_剑来全文阅读_某某书屋</title></head></html>";
/// assert_eq!(infer_novel_name(html), Some("剑来".to_string()));
/// ```
pub fn infer_novel_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let heading = select_text(&document, "h1")
        .filter(|text| text.chars().count() < MAX_HEADING_NAME_CHARS);

    heading
        .or_else(|| name_from_title(&document))
        .or_else(|| name_from_description(&document))
}

fn name_from_title(document: &Html) -> Option<String> {
    let title = select_text(document, "title")?;
    if SITE_BRAND_MARKERS.iter().any(|brand| title.contains(brand)) {
        return None;
    }

    let cleaned = TITLE_CLEANUPS.iter().fold(title, |text, cleanup| {
        cleanup.replace(&text, "").into_owned()
    });
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn name_from_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    let description = document
        .select(&selector)
        .next()?
        .value()
        .attr("content")?;

    let name = QUOTED_NAME.captures(description)?[1].trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Trimmed text of every element matching `selector`, if any
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let text: String = document
        .select(&selector)
        .flat_map(|element| element.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
