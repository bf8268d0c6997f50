use serde::Deserialize;

/// Browser user agents rotated across requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
];

/// Static visit cookie the target site expects on every request
pub const DEFAULT_COOKIE: &str = "jieqiVisitId=article_articleviews%3D44108";

/// Main configuration structure for Sumi-Scroll
///
/// Every table and key is optional; missing values fall back to the defaults
/// the crawler was tuned with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
}

/// Batch crawling behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of chapter fetches in flight at once
    pub concurrency_limit: usize,

    /// Number of chapters processed per batch
    pub chunk_size: usize,

    /// Fraction of failed chapters that aborts the crawl
    pub failure_threshold: f64,

    /// Lower bound of the randomized pause between batches (milliseconds)
    pub chunk_delay_min_ms: u64,

    /// Upper bound of the randomized pause between batches (milliseconds)
    pub chunk_delay_max_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            chunk_size: 20,
            failure_threshold: 0.2,
            chunk_delay_min_ms: 500,
            chunk_delay_max_ms: 1500,
        }
    }
}

/// HTTP fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// HTTP redirects followed by the client itself
    pub max_redirects: usize,

    /// Attempts per URL for retryable failures, including the first
    pub max_attempts: u32,

    /// Base of the exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound of the random jitter added to each backoff (milliseconds)
    pub backoff_jitter_ms: u64,

    /// Cap on the exponential part of the backoff (milliseconds)
    pub max_backoff_ms: u64,

    /// Client-side redirects (meta refresh, location scripts) followed
    pub max_redirect_hops: u32,

    /// Answered 404s tolerated across the original URL and its alternates
    pub max_not_found_attempts: u32,

    /// Skip TLS certificate validation
    pub accept_invalid_certs: bool,

    /// Cookie header sent with every request
    pub cookie: String,

    /// Pool of user agents, one picked at random per request
    pub user_agents: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 5,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_jitter_ms: 1000,
            max_backoff_ms: 8000,
            max_redirect_hops: 2,
            max_not_found_attempts: 3,
            accept_invalid_certs: true,
            cookie: DEFAULT_COOKIE.to_string(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the assembled text files are written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
