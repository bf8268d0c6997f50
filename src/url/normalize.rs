use regex::Regex;
use std::sync::LazyLock;

/// Numeric `<section>_<id>` fragment used by the supported site family
static SECTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)_(\d+)").expect("section/id pattern is valid"));

/// A site whose table-of-contents URLs have one known-good shape
#[derive(Debug, Clone, Copy)]
pub struct SiteRule {
    /// Host fragment identifying the site (matched anywhere in the URL)
    pub host_marker: &'static str,

    /// Scheme and host every rewritten URL starts with
    pub canonical_origin: &'static str,
}

impl SiteRule {
    /// Rewrites `url` into `<origin>/<section>_<id>/` when the rule applies
    fn apply(&self, url: &str) -> Option<String> {
        if !url.contains(self.host_marker) || url.contains(".html") {
            return None;
        }

        let captures = SECTION_ID_PATTERN.captures(url)?;
        Some(format!(
            "{}/{}_{}/",
            self.canonical_origin, &captures[1], &captures[2]
        ))
    }
}

/// Site-specific canonicalization rules, checked in order
pub const SITE_RULES: &[SiteRule] = &[SiteRule {
    host_marker: "xs5200.net",
    canonical_origin: "https://www.xs5200.net",
}];

/// Normalizes a raw site URL into a crawl-ready base URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prepend `https://` when no HTTP(S) scheme is present
/// 3. Remove trailing slashes after the scheme separator
/// 4. Apply the first matching [`SITE_RULES`] entry
///
/// Unrecognized input passes through; this never fails. Applying it twice
/// gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use sumi_scroll::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("example.com/book/"), "https://example.com/book");
/// assert_eq!(
///     normalize_base_url("m.xs5200.net/44_44108"),
///     "https://www.xs5200.net/44_44108/"
/// );
/// ```
pub fn normalize_base_url(raw: &str) -> String {
    let (scheme, rest) = split_http_scheme(raw.trim());
    let with_scheme = format!("{}{}", scheme, rest.trim_end_matches('/'));

    SITE_RULES
        .iter()
        .find_map(|rule| rule.apply(&with_scheme))
        .unwrap_or(with_scheme)
}

/// Extracts the `/<section>_<id>/` path fragment identifying a novel
///
/// Chapter URLs on the supported site family embed this fragment, which makes
/// it a usable last-resort signal when no structural heuristic matches.
pub fn novel_id_fragment(url: &::url::Url) -> Option<String> {
    SECTION_ID_PATTERN
        .captures(url.path())
        .map(|captures| format!("/{}_{}/", &captures[1], &captures[2]))
}

/// Splits off a leading `http://` or `https://`, defaulting to `https://`
///
/// Slashes belonging to the scheme separator are never part of the rest.
fn split_http_scheme(url: &str) -> (&str, &str) {
    ["http://", "https://"]
        .iter()
        .find_map(|scheme| {
            url.get(..scheme.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
                .map(|prefix| (prefix, &url[scheme.len()..]))
        })
        .unwrap_or(("https://", url))
}
