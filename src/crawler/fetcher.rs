//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with browser-like headers
//! - Rotating user agents per request
//! - Retry logic with exponential backoff for transient failures
//! - Following client-side redirects
//! - Trying alternate URLs when a page answers 404
//! - Error classification

use crate::config::{FetcherConfig, DEFAULT_USER_AGENTS};
use crate::crawler::inspect::{detect_redirect, inspect_body};
use crate::crawler::random::RandomSource;
use crate::crawler::retry::RetryPolicy;
use crate::url::alternate_urls;
use crate::{ConfigError, ErrorKind, ScrollError};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL,
    COOKIE, PRAGMA, REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified reason a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timed out for {url}")]
    Timeout { url: String },

    #[error("Connection to {url} refused or unreachable, the site may be down or have moved")]
    Refused { url: String },

    #[error("Transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Access forbidden (HTTP {status}) for {url}, wait before trying again")]
    Forbidden { url: String, status: u16 },

    #[error("Anti-bot page at {url} (matched \"{marker}\"), wait before trying again")]
    AntiBot { url: String, marker: String },

    #[error("Page not found: {url}")]
    NotFound { url: String },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl FetchError {
    /// Returns true if waiting and trying the same URL again could help
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Refused { .. } | Self::Transport { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } | Self::Refused { .. } | Self::Transport { .. } => {
                ErrorKind::Transport
            }
            Self::Forbidden { .. } | Self::AntiBot { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Malformed { .. } => ErrorKind::MalformedResponse,
        }
    }
}

/// Result of fetching one page: the raw HTML or a classified failure
pub type FetchOutcome = Result<String, FetchError>;

/// Anything that can turn a URL into page HTML
///
/// [`PageFetcher`] is the network implementation; the scheduler and the
/// orchestrator only depend on this trait.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// Produces the ordered fallback URLs tried after a 404
pub type AlternateUrls = Box<dyn Fn(&Url) -> Vec<Url> + Send + Sync>;

/// What a single request produced before body inspection
enum Answer {
    Body(String),
    Missing,
}

/// Why a URL is in the candidate queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Requested,
    Redirect,
    Alternate,
}

/// Builds the fixed browser-like header set sent with every request
///
/// `User-Agent` and `Referer` are per request and not part of this set.
pub fn browser_headers(config: &FetcherConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Not A(Brand\";v=\"99\", \"Google Chrome\";v=\"121\", \"Chromium\";v=\"121\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    if !config.cookie.is_empty() {
        let cookie = HeaderValue::from_str(&config.cookie)
            .map_err(|e| ConfigError::Validation(format!("Invalid cookie header: {}", e)))?;
        headers.insert(COOKIE, cookie);
    }

    Ok(headers)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScrollError)` - Invalid header configuration or client setup failure
///
/// # Example
///
/// ```no_run
/// use sumi_scroll::config::FetcherConfig;
/// use sumi_scroll::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, ScrollError> {
    let headers = browser_headers(config)?;

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()?;

    Ok(client)
}

/// Network-backed [`PageSource`]
///
/// # Request Flow
///
/// 1. Send GET with a randomly chosen user agent
/// 2. Classify the status:
///    - 2xx → inspect the body
///    - 404 → queue alternate URLs
///    - 403 → `Forbidden`, final
///    - anything else → transport failure, retried
/// 3. Inspect the body:
///    - client-side redirect → follow (bounded hops)
///    - anti-bot phrase → `AntiBot`, final
///    - soft 404 page → `NotFound`, final
///    - not HTML → `Malformed`, final
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout / connection failure | Retry with backoff |
/// | Unexpected HTTP status | Retry with backoff |
/// | HTTP 403 | Immediate → Forbidden |
/// | Anti-bot body | Immediate → AntiBot |
/// | HTTP 404 | Try alternates → NotFound |
pub struct PageFetcher {
    client: Client,
    config: FetcherConfig,
    retry: RetryPolicy,
    random: Arc<dyn RandomSource>,
    alternates: AlternateUrls,
}

impl PageFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(config: &FetcherConfig, random: Arc<dyn RandomSource>) -> Result<Self, ScrollError> {
        Ok(Self {
            client: build_http_client(config)?,
            config: config.clone(),
            retry: RetryPolicy::from_config(config),
            random,
            alternates: Box::new(alternate_urls),
        })
    }

    /// Replaces the 404 fallback generator (defaults to [`alternate_urls`])
    pub fn with_alternates(
        mut self,
        alternates: impl Fn(&Url) -> Vec<Url> + Send + Sync + 'static,
    ) -> Self {
        self.alternates = Box::new(alternates);
        self
    }

    fn pick_user_agent(&self) -> &str {
        let agents = &self.config.user_agents;
        agents
            .get(self.random.pick(agents.len()))
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Sends one GET request and classifies the status
    async fn send_once(&self, url: &Url) -> Result<Answer, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.pick_user_agent())
            .header(REFERER, url.as_str())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(Answer::Missing);
        }

        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Forbidden {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Transport {
                url: url.to_string(),
                reason: format!("unexpected HTTP status {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        Ok(Answer::Body(body))
    }

    /// Sends a request, retrying transport failures with backoff
    async fn send_with_retry(&self, url: &Url) -> Result<Answer, FetchError> {
        let mut attempt = 0;
        loop {
            tracing::debug!("Fetching {} (attempt {})", url, attempt + 1);

            match self.send_once(url).await {
                Err(e) if e.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.delay_for(attempt, self.random.as_ref());
                    tracing::warn!("{}; retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            attempt + 1,
                            e
                        );
                    }
                    return Err(e);
                }
                Ok(answer) => return Ok(answer),
            }
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    /// Fetches a URL with full error handling, redirects and alternates
    ///
    /// Candidates are processed from a queue: the requested URL first,
    /// client-side redirect targets jump to the front, and on the first 404
    /// the alternate URLs are appended. Failures of alternates are logged and
    /// skipped; any other failure ends the fetch.
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let mut candidates = VecDeque::from([(url.clone(), Candidate::Requested)]);
        let mut redirect_hops = 0;
        let mut alternates_queued = false;

        while let Some((candidate, origin)) = candidates.pop_front() {
            let answer = match self.send_with_retry(&candidate).await {
                Ok(answer) => answer,
                Err(e) if origin == Candidate::Alternate => {
                    tracing::debug!("Alternate {} failed: {}", candidate, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match answer {
                Answer::Body(body) => {
                    if redirect_hops < self.config.max_redirect_hops {
                        if let Some(target) = detect_redirect(&body, &candidate) {
                            redirect_hops += 1;
                            tracing::info!(
                                "Client-side redirect from {} to {} (hop {})",
                                candidate,
                                target,
                                redirect_hops
                            );
                            candidates.push_front((target, Candidate::Redirect));
                            continue;
                        }
                    }

                    match inspect_body(&candidate, &body) {
                        Ok(()) => return Ok(body),
                        Err(FetchError::NotFound { .. }) if origin == Candidate::Alternate => {
                            tracing::debug!("Alternate {} is a missing page", candidate);
                        }
                        Err(e) => return Err(e),
                    }
                }
                Answer::Missing => {
                    tracing::debug!("HTTP 404 for {}", candidate);
                    if !alternates_queued {
                        alternates_queued = true;
                        let budget = self.config.max_not_found_attempts.saturating_sub(1) as usize;
                        let alternates = (self.alternates)(&candidate);
                        for alternate in alternates.into_iter().take(budget) {
                            tracing::debug!("Queueing alternate URL {}", alternate);
                            candidates.push_back((alternate, Candidate::Alternate));
                        }
                    }
                }
            }
        }

        Err(FetchError::NotFound {
            url: url.to_string(),
        })
    }
}

/// Maps a reqwest failure onto the fetch error classes
fn classify_transport_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Refused {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
