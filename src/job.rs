//! Crawl job definition
//!
//! A [`CrawlJob`] is the validated form of a caller's request: where the table
//! of contents lives, what to call the novel, and how hard to push the site.

use crate::config::CrawlerConfig;
use crate::ScrollError;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Concurrency used when the caller does not ask for one
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Chunk size used when the caller does not ask for one
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Accepted values for the number of fetches in flight
pub const CONCURRENCY_RANGE: RangeInclusive<usize> = 1..=10;

/// Accepted values for the number of chapters per batch
pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 10..=100;

/// An immutable, validated crawl request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlJob {
    base_url: String,
    novel_name: String,
    concurrency_limit: usize,
    chunk_size: usize,
}

impl CrawlJob {
    /// Creates a job, filling omitted limits with the defaults
    ///
    /// # Arguments
    ///
    /// * `base_url` - Table-of-contents URL as typed by the user
    /// * `novel_name` - Name used for the output file
    /// * `concurrency_limit` - Fetches in flight, 1 to 10
    /// * `chunk_size` - Chapters per batch, 10 to 100
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - The validated job
    /// * `Err(ScrollError::InvalidJob)` - A field is empty or out of range
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_scroll::CrawlJob;
    ///
    /// let job = CrawlJob::new("www.example.com/1_1", "My Novel", None, Some(50)).unwrap();
    /// assert_eq!(job.concurrency_limit(), 5);
    /// assert_eq!(job.chunk_size(), 50);
    /// ```
    pub fn new(
        base_url: &str,
        novel_name: &str,
        concurrency_limit: Option<usize>,
        chunk_size: Option<usize>,
    ) -> Result<Self, ScrollError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ScrollError::InvalidJob("url cannot be empty".to_string()));
        }

        let novel_name = novel_name.trim();
        if novel_name.is_empty() {
            return Err(ScrollError::InvalidJob(
                "novel name cannot be empty".to_string(),
            ));
        }

        let concurrency_limit = concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY_LIMIT);
        if !CONCURRENCY_RANGE.contains(&concurrency_limit) {
            return Err(ScrollError::InvalidJob(format!(
                "concurrency limit must be between {} and {}, got {}",
                CONCURRENCY_RANGE.start(),
                CONCURRENCY_RANGE.end(),
                concurrency_limit
            )));
        }

        let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if !CHUNK_SIZE_RANGE.contains(&chunk_size) {
            return Err(ScrollError::InvalidJob(format!(
                "chunk size must be between {} and {}, got {}",
                CHUNK_SIZE_RANGE.start(),
                CHUNK_SIZE_RANGE.end(),
                chunk_size
            )));
        }

        Ok(Self {
            base_url: base_url.to_string(),
            novel_name: novel_name.to_string(),
            concurrency_limit,
            chunk_size,
        })
    }

    /// Creates a job whose omitted limits come from the crawler configuration
    pub fn with_config(
        base_url: &str,
        novel_name: &str,
        concurrency_limit: Option<usize>,
        chunk_size: Option<usize>,
        config: &CrawlerConfig,
    ) -> Result<Self, ScrollError> {
        Self::new(
            base_url,
            novel_name,
            Some(concurrency_limit.unwrap_or(config.concurrency_limit)),
            Some(chunk_size.unwrap_or(config.chunk_size)),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn novel_name(&self) -> &str {
        &self.novel_name
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
