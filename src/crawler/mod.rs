//! Crawler module for discovering and downloading chapters
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retries, redirects and anti-bot detection
//! - Chapter link discovery on table-of-contents pages
//! - Chapter title and body extraction
//! - Batch scheduling with a failure threshold
//! - Probe and crawl orchestration

mod clean;
mod content;
mod coordinator;
mod fetcher;
mod inspect;
mod links;
mod probe;
mod random;
mod retry;
mod scheduler;

#[cfg(test)]
mod testing;

pub use clean::{clean_chapter_text, TextTransform, CLEANING_PIPELINE};
pub use content::{
    extract_chapter, Chapter, CONTENT_SELECTORS, TITLE_SELECTORS, UNTITLED_CHAPTER,
};
pub use coordinator::NovelCrawler;
pub use fetcher::{
    browser_headers, build_http_client, AlternateUrls, FetchError, FetchOutcome, PageFetcher,
    PageSource,
};
pub use inspect::{
    detect_redirect, find_anti_bot_marker, inspect_body, is_not_found_page, looks_like_html,
    ANTI_BOT_MARKERS, NOT_FOUND_MARKERS,
};
pub use links::{
    chapter_number, extract_chapter_links, looks_like_chapter_href, looks_like_chapter_title,
    ChapterLink, LinkSet, LinkStrategy, LINK_STRATEGIES,
};
pub use probe::{infer_novel_name, ProbeReport};
pub use random::{NoJitter, RandomSource, SeededRandom, ThreadRandom};
pub use retry::RetryPolicy;
pub use scheduler::{BatchOutcome, BatchScheduler};
