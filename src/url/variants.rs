use url::{Host, Url};

/// Builds the alternate URLs tried when a page answers 404
///
/// Candidates, in order:
/// 1. Protocol swap (`https` <-> `http`)
/// 2. `www.` toggle (added when absent, removed when present)
/// 3. Mobile `m.` subdomain
/// 4. TLD swap (`.com` <-> `.net`)
///
/// Host rewrites are only produced for domain names, never for IP addresses.
/// The result is deduplicated and never contains `url` itself.
///
/// # Examples
///
/// ```
/// use sumi_scroll::url::alternate_urls;
/// use url::Url;
///
/// let url = Url::parse("https://www.example.com/book/").unwrap();
/// let alternates: Vec<String> = alternate_urls(&url).iter().map(|u| u.to_string()).collect();
/// assert_eq!(alternates[0], "http://www.example.com/book/");
/// assert_eq!(alternates[1], "https://example.com/book/");
/// ```
pub fn alternate_urls(url: &Url) -> Vec<Url> {
    let mut candidates = Vec::new();

    let swapped_scheme = if url.scheme() == "https" { "http" } else { "https" };
    let mut swapped = url.clone();
    if swapped.set_scheme(swapped_scheme).is_ok() {
        candidates.push(swapped);
    }

    if let Some(Host::Domain(host)) = url.host() {
        let bare = host
            .strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .unwrap_or(host);

        if host.starts_with("www.") {
            candidates.extend(with_host(url, bare));
        } else {
            candidates.extend(with_host(url, &format!("www.{}", bare)));
        }

        if !host.starts_with("m.") {
            candidates.extend(with_host(url, &format!("m.{}", bare)));
        }

        if let Some(stem) = host.strip_suffix(".com") {
            candidates.extend(with_host(url, &format!("{}.net", stem)));
        } else if let Some(stem) = host.strip_suffix(".net") {
            candidates.extend(with_host(url, &format!("{}.com", stem)));
        }
    }

    let mut unique: Vec<Url> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate != *url && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

fn with_host(url: &Url, host: &str) -> Option<Url> {
    let mut candidate = url.clone();
    candidate.set_host(Some(host)).ok()?;
    Some(candidate)
}
