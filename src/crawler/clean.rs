//! Chapter text cleanup
//!
//! Extracted chapter text arrives full of indentation entities, curly quotes
//! and site boilerplate. [`CLEANING_PIPELINE`] is the ordered list of named
//! transforms that turn it into plain paragraphs.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("newline pattern is valid"));

static LATEST_CHAPTER_BREADCRUMB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\n]*?最新章节[^\n]*?\n").expect("breadcrumb pattern is valid")
});

static PAGINATION_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"本章未完[^\n]*?下一页").expect("pagination pattern is valid"));

static READING_REMINDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"（记住[^\n]*?下次阅读）").expect("reminder pattern is valid")
});

static MOBILE_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)手机用户请访问.*\z").expect("footer pattern is valid"));

/// A named text rewrite step
#[derive(Clone, Copy)]
pub struct TextTransform {
    pub name: &'static str,
    rewrite: fn(&str) -> String,
}

impl TextTransform {
    pub fn apply(&self, text: &str) -> String {
        (self.rewrite)(text)
    }
}

impl std::fmt::Debug for TextTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextTransform")
            .field("name", &self.name)
            .finish()
    }
}

/// Cleanup steps in application order
///
/// Whitespace is normalized before the boilerplate patterns run, so they
/// only ever see `\n\n` between paragraphs.
pub const CLEANING_PIPELINE: &[TextTransform] = &[
    TextTransform {
        name: "collapse-whitespace",
        rewrite: collapse_whitespace,
    },
    TextTransform {
        name: "straighten-quotes",
        rewrite: straighten_quotes,
    },
    TextTransform {
        name: "separate-paragraphs",
        rewrite: separate_paragraphs,
    },
    TextTransform {
        name: "strip-latest-chapter-breadcrumb",
        rewrite: strip_latest_chapter_breadcrumb,
    },
    TextTransform {
        name: "strip-pagination-prompt",
        rewrite: strip_pagination_prompt,
    },
    TextTransform {
        name: "strip-reading-reminder",
        rewrite: strip_reading_reminder,
    },
    TextTransform {
        name: "strip-mobile-footer",
        rewrite: strip_mobile_footer,
    },
];

/// Runs the whole pipeline and trims the result
///
/// # Example
///
/// ```
/// use sumi_scroll::crawler::clean_chapter_text;
///
/// let raw = "\u{a0}\u{a0}他说：“走吧。”\n\n\n  她点头。（记住本站网址，方便下次阅读）";
/// assert_eq!(clean_chapter_text(raw), "他说：\"走吧。\"\n\n她点头。");
/// ```
pub fn clean_chapter_text(raw: &str) -> String {
    CLEANING_PIPELINE
        .iter()
        .fold(raw.trim().to_string(), |text, transform| {
            transform.apply(&text)
        })
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, "\n").into_owned()
}

fn straighten_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

fn separate_paragraphs(text: &str) -> String {
    NEWLINE_RUN.replace_all(text, "\n\n").into_owned()
}

fn strip_latest_chapter_breadcrumb(text: &str) -> String {
    LATEST_CHAPTER_BREADCRUMB.replace(text, "").into_owned()
}

fn strip_pagination_prompt(text: &str) -> String {
    PAGINATION_PROMPT.replace_all(text, "").into_owned()
}

fn strip_reading_reminder(text: &str) -> String {
    READING_REMINDER.replace_all(text, "").into_owned()
}

fn strip_mobile_footer(text: &str) -> String {
    MOBILE_FOOTER.replace(text, "").into_owned()
}
