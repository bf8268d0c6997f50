//! Response body inspection
//!
//! A 200 from the target site does not mean we got the page we asked for.
//! The site answers with client-side redirects, CAPTCHA walls and soft 404
//! pages, all with a success status. This module recognizes them.

use crate::crawler::fetcher::FetchError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Phrases that only appear on CAPTCHA or rate-limit pages
pub const ANTI_BOT_MARKERS: &[&str] = &["验证码", "访问太频繁", "请输入验证码", "访问受限"];

/// All of these must appear for a body to count as a "page missing" page
pub const NOT_FOUND_MARKERS: &[&str] = &["404", "页面不存在"];

static REFRESH_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)http-equiv\s*=\s*["']?refresh"#).expect("refresh tag pattern is valid")
});

static REFRESH_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)content\s*=\s*"[^"]*url\s*=\s*([^"]+)""#)
        .expect("refresh target pattern is valid")
});

static LOCATION_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)window\.location\.href\s*=\s*['"]([^'"]+)['"]"#)
        .expect("location target pattern is valid")
});

/// Finds a client-side redirect and resolves its target against `page_url`
///
/// Recognizes `<meta http-equiv="refresh" content="0;url=...">` and
/// `window.location.href = '...'` scripts. Returns `None` when there is no
/// redirect, the target does not parse, or it points back at the page itself.
pub fn detect_redirect(body: &str, page_url: &Url) -> Option<Url> {
    let from_refresh = if REFRESH_TAG.is_match(body) {
        REFRESH_TARGET
            .captures(body)
            .map(|captures| captures[1].trim().to_string())
    } else {
        None
    };

    let target = from_refresh.or_else(|| {
        LOCATION_TARGET
            .captures(body)
            .map(|captures| captures[1].trim().to_string())
    })?;

    let resolved = page_url.join(target.trim_matches(|c| c == '\'' || c == '"')).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    if resolved == *page_url {
        return None;
    }
    Some(resolved)
}

/// Returns the first anti-bot phrase found in `body`
pub fn find_anti_bot_marker(body: &str) -> Option<&'static str> {
    ANTI_BOT_MARKERS
        .iter()
        .copied()
        .find(|marker| body.contains(marker))
}

/// Returns true if `body` is the site's "page does not exist" page
pub fn is_not_found_page(body: &str) -> bool {
    NOT_FOUND_MARKERS.iter().all(|marker| body.contains(marker))
}

/// Returns true if `body` starts like an HTML document
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(512)
        .collect::<String>()
        .to_ascii_lowercase();

    head.starts_with("<!doctype")
        || head.starts_with("<html")
        || ((head.starts_with("<?xml") || head.starts_with("<!--")) && head.contains("<html"))
}

/// Checks a successful body for anti-bot, missing-page and non-HTML answers
///
/// # Returns
///
/// * `Ok(())` - The body is a usable HTML page
/// * `Err(FetchError::AntiBot)` - A CAPTCHA or rate-limit page
/// * `Err(FetchError::NotFound)` - A soft 404 page
/// * `Err(FetchError::Malformed)` - Not an HTML document
pub fn inspect_body(url: &Url, body: &str) -> Result<(), FetchError> {
    if let Some(marker) = find_anti_bot_marker(body) {
        return Err(FetchError::AntiBot {
            url: url.to_string(),
            marker: marker.to_string(),
        });
    }

    if is_not_found_page(body) {
        return Err(FetchError::NotFound {
            url: url.to_string(),
        });
    }

    if !looks_like_html(body) {
        return Err(FetchError::Malformed {
            url: url.to_string(),
            reason: "response is not an HTML document".to_string(),
        });
    }

    Ok(())
}
