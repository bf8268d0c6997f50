//! Sumi-Scroll: a patient serialized-novel harvester
//!
//! This crate discovers the chapters of a web novel from its table-of-contents
//! page, downloads them with bounded concurrency while watching for anti-bot
//! pages, and stitches them back together in their original order.

pub mod config;
pub mod crawler;
pub mod job;
pub mod output;
pub mod url;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub use crawler::FetchError;

/// Main error type for Sumi-Scroll operations
#[derive(Debug, Error)]
pub enum ScrollError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("No chapter links found on {url}")]
    NoLinksFound { url: String },

    #[error("Cannot extract chapter content from {url}")]
    NoContentExtracted { url: String },

    #[error("Too many failed chapters ({failed} of {total}), the site is likely blocking the crawler")]
    TooManyFailures { failed: usize, total: usize },

    #[error("No chapters were downloaded successfully")]
    EmptyResult,

    #[error("Invalid crawl job: {0}")]
    InvalidJob(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrollError {
    /// Returns the failure class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::HttpClient(_) => ErrorKind::Transport,
            Self::NoLinksFound { .. } => ErrorKind::NoLinksFound,
            Self::NoContentExtracted { .. } => ErrorKind::NoContentExtracted,
            Self::TooManyFailures { .. } => ErrorKind::TooManyFailures,
            Self::EmptyResult => ErrorKind::EmptyResult,
            Self::Config(_) | Self::InvalidJob(_) | Self::UrlParse(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Classified failure kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Timeout, refused or reset connection, unexpected status (retried)
    Transport,
    /// Explicit denial or anti-bot page (never retried)
    Forbidden,
    /// 404 after the alternate URLs were exhausted, or a "page missing" body
    NotFound,
    /// Body that is not an HTML document
    MalformedResponse,
    NoLinksFound,
    NoContentExtracted,
    TooManyFailures,
    EmptyResult,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::MalformedResponse => "malformed-response",
            Self::NoLinksFound => "no-links-found",
            Self::NoContentExtracted => "no-content-extracted",
            Self::TooManyFailures => "too-many-failures",
            Self::EmptyResult => "empty-result",
            Self::Config => "config",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Sumi-Scroll operations
pub type Result<T> = std::result::Result<T, ScrollError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{NovelCrawler, ProbeReport};
pub use job::CrawlJob;
pub use output::CrawlResult;
pub use url::normalize_base_url;
