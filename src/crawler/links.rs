//! Chapter link extraction from a table-of-contents page
//!
//! Sites in this family agree on almost nothing, so extraction runs an
//! ordered list of [`LinkStrategy`] values and keeps the result of the first
//! one that finds anything:
//!
//! 1. Well-known chapter list selectors (`#list dd a` and friends)
//! 2. Anchors inside well-known list containers whose text reads like a
//!    chapter title
//! 3. Any same-origin anchor on the page whose text or href looks like a
//!    chapter
//! 4. Anchors whose href carries the novel's `/<section>_<id>/` fragment
//!
//! The result is deduplicated, ordered by chapter number and indexed.

use crate::url::novel_id_fragment;
use crate::ScrollError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Selectors that point straight at chapter anchors
pub const CHAPTER_LIST_SELECTORS: &[&str] = &[
    "#list dd a",
    ".listmain dd a",
    "#chapterlist dd a",
    "#chapter-list dd a",
    ".novel_list dd a",
    ".chapter-list dd a",
    ".article-list dd a",
    "#xslist dd a",
];

/// Containers that usually hold the chapter list, mixed with other links
pub const CHAPTER_CONTAINER_SELECTORS: &[&str] = &[
    "#list",
    ".listmain",
    "#chapterlist",
    "#chapter-list",
    ".novel_list",
    ".chapter-list",
    ".article-list",
    "#xslist",
];

/// Extraction strategies, tried in order
pub const LINK_STRATEGIES: &[LinkStrategy] = &[
    LinkStrategy::ListSelectors(CHAPTER_LIST_SELECTORS),
    LinkStrategy::ChapterContainers(CHAPTER_CONTAINER_SELECTORS),
    LinkStrategy::PageScan,
    LinkStrategy::NovelIdFragment,
];

static NUMBERED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*第.+[章节卷篇]\s*$").expect("numbered title pattern is valid")
});

static LIST_ITEM_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*[.、]").expect("list item pattern is valid"));

static BARE_NUMBER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("bare number pattern is valid"));

static NUMBERED_PAGE_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+\.html?$").expect("numbered page pattern is valid"));

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run pattern is valid"));

/// One way of finding chapter anchors on a table-of-contents page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// First selector that matches any anchor wins
    ListSelectors(&'static [&'static str]),

    /// First container whose anchors include chapter-like titles wins
    ChapterContainers(&'static [&'static str]),

    /// Every same-origin anchor that looks like a chapter
    PageScan,

    /// Every anchor whose href contains the base URL's novel-ID fragment
    NovelIdFragment,
}

impl LinkStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LinkStrategy::ListSelectors(_) => "list-selectors",
            LinkStrategy::ChapterContainers(_) => "chapter-containers",
            LinkStrategy::PageScan => "page-scan",
            LinkStrategy::NovelIdFragment => "novel-id-fragment",
        }
    }

    /// Collects absolute chapter URLs in document order
    pub fn collect(&self, document: &Html, base_url: &Url) -> Vec<Url> {
        match self {
            LinkStrategy::ListSelectors(selectors) => selectors
                .iter()
                .map(|selector| collect_list_anchors(document, selector, base_url))
                .find(|urls| !urls.is_empty())
                .unwrap_or_default(),
            LinkStrategy::ChapterContainers(selectors) => selectors
                .iter()
                .map(|selector| collect_container_anchors(document, selector, base_url))
                .find(|urls| !urls.is_empty())
                .unwrap_or_default(),
            LinkStrategy::PageScan => collect_page_anchors(document, base_url),
            LinkStrategy::NovelIdFragment => collect_fragment_anchors(document, base_url),
        }
    }
}

/// A chapter URL with its position in reading order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLink {
    pub url: Url,

    /// 0-based position after ordering
    pub index: usize,
}

/// Ordered, duplicate-free chapter URLs for one novel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: Vec<ChapterLink>,
}

impl LinkSet {
    /// Builds a link set from URLs in discovery order
    ///
    /// Later duplicates are dropped, the rest are stably sorted by
    /// [`chapter_number`] and then numbered from 0.
    ///
    /// The sort key is not the first integer anywhere in the URL: only the
    /// last path segment (or the query) counts, so digits in a host such as
    /// `xs5200.net` never become every link's key.
    pub fn from_discovered(urls: Vec<Url>) -> Self {
        let mut seen = HashSet::new();
        let mut unique: Vec<Url> = urls
            .into_iter()
            .filter(|url| seen.insert(url.as_str().to_string()))
            .collect();

        unique.sort_by(compare_reading_order);

        let links = unique
            .into_iter()
            .enumerate()
            .map(|(index, url)| ChapterLink { url, index })
            .collect();

        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn as_slice(&self) -> &[ChapterLink] {
        &self.links
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChapterLink> {
        self.links.iter()
    }

    pub fn first(&self) -> Option<&ChapterLink> {
        self.links.first()
    }

    pub fn last(&self) -> Option<&ChapterLink> {
        self.links.last()
    }
}

/// Extracts the ordered chapter links from a table-of-contents page
///
/// # Arguments
///
/// * `html` - The table-of-contents page body
/// * `base_url` - URL relative hrefs are resolved against
///
/// # Returns
///
/// * `Ok(LinkSet)` - At least one chapter link
/// * `Err(ScrollError::NoLinksFound)` - No strategy found anything
///
/// # Example
///
/// ```
/// use sumi_scroll::crawler::extract_chapter_links;
/// use url::Url;
///
/// let html = r#"<div id="list"><dl>
///     <dd><a href="/b/2.html">第二章</a></dd>
///     <dd><a href="/b/1.html">第一章</a></dd>
/// </dl></div>"#;
/// let base = Url::parse("https://example.com/b/").unwrap();
/// let links = extract_chapter_links(html, &base).unwrap();
/// assert_eq!(links.len(), 2);
/// assert_eq!(links.first().unwrap().url.as_str(), "https://example.com/b/1.html");
/// ```
pub fn extract_chapter_links(html: &str, base_url: &Url) -> Result<LinkSet, ScrollError> {
    let document = Html::parse_document(html);

    for strategy in LINK_STRATEGIES {
        let found = strategy.collect(&document, base_url);
        if found.is_empty() {
            tracing::debug!("Link strategy {} found nothing", strategy.name());
            continue;
        }

        let links = LinkSet::from_discovered(found);
        tracing::info!(
            "Link strategy {} found {} chapters",
            strategy.name(),
            links.len()
        );
        if let (Some(first), Some(last)) = (links.first(), links.last()) {
            tracing::debug!("First chapter: {}, last chapter: {}", first.url, last.url);
        }
        return Ok(links);
    }

    tracing::warn!("No chapter links found at {}", base_url);
    Err(ScrollError::NoLinksFound {
        url: base_url.to_string(),
    })
}

/// Returns true if anchor text reads like a chapter title
///
/// Accepts text mentioning 章 or 卷, `第…章`-style headings, numbered list
/// items like `12.` or `12、`, and bare numbers.
pub fn looks_like_chapter_title(text: &str) -> bool {
    text.contains('章')
        || text.contains('卷')
        || NUMBERED_TITLE.is_match(text)
        || LIST_ITEM_TITLE.is_match(text)
        || BARE_NUMBER_TITLE.is_match(text)
}

/// Returns true if an href looks like it points at a chapter page
pub fn looks_like_chapter_href(href: &str) -> bool {
    href.to_ascii_lowercase().contains("chapter") || NUMBERED_PAGE_HREF.is_match(href)
}

/// Sort key for reading order: the first digit run of the last path segment
///
/// Falls back to the first digit run of the query string, which covers
/// `read.php?id=12` style links. Digits in the host never count.
pub fn chapter_number(url: &Url) -> Option<u64> {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()));

    last_segment
        .and_then(first_number)
        .or_else(|| url.query().and_then(first_number))
}

fn first_number(text: &str) -> Option<u64> {
    DIGIT_RUN
        .find(text)
        .and_then(|found| found.as_str().parse().ok())
}

fn compare_reading_order(a: &Url, b: &Url) -> Ordering {
    match (chapter_number(a), chapter_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.as_str().cmp(b.as_str()),
    }
}

/// An anchor with a usable href and non-empty text
struct Anchor<'a> {
    href: &'a str,
    text: String,
}

fn anchor<'a>(element: ElementRef<'a>) -> Option<Anchor<'a>> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let text = element.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        return None;
    }

    Some(Anchor { href, text })
}

fn collect_list_anchors(document: &Html, selector: &str, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(anchor)
        .filter_map(|anchor| resolve_link(anchor.href, base_url))
        .collect()
}

fn collect_container_anchors(document: &Html, selector: &str, base_url: &Url) -> Vec<Url> {
    let (Ok(container), Ok(anchors)) = (Selector::parse(selector), Selector::parse("a")) else {
        return Vec::new();
    };

    document
        .select(&container)
        .flat_map(|element| element.select(&anchors))
        .filter_map(anchor)
        .filter(|anchor| looks_like_chapter_title(&anchor.text))
        .filter_map(|anchor| resolve_link(anchor.href, base_url))
        .collect()
}

fn collect_page_anchors(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(anchor)
        .filter(|anchor| {
            looks_like_chapter_title(&anchor.text) || looks_like_chapter_href(anchor.href)
        })
        .filter_map(|anchor| resolve_link(anchor.href, base_url))
        .filter(|url| url.origin() == base_url.origin())
        .collect()
}

fn collect_fragment_anchors(document: &Html, base_url: &Url) -> Vec<Url> {
    let Some(fragment) = novel_id_fragment(base_url) else {
        return Vec::new();
    };
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.contains(fragment.as_str()))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves an href to an absolute HTTP(S) URL without its fragment
///
/// Returns None for `javascript:`, `mailto:`, `tel:` and `data:` links,
/// same-page anchors, and anything that does not parse.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}
