//! Batch scheduler for downloading every chapter of a novel
//!
//! This module handles:
//! - Splitting the ordered link set into sequential chunks
//! - Bounding in-flight fetches with fixed-size concurrent groups
//! - Pausing a random interval between chunks
//! - Aborting once failures pass the configured share of all chapters

use crate::config::CrawlerConfig;
use crate::crawler::content::{extract_chapter, Chapter};
use crate::crawler::fetcher::PageSource;
use crate::crawler::links::{ChapterLink, LinkSet};
use crate::crawler::random::RandomSource;
use crate::ScrollError;
use futures::future::join_all;
use std::sync::Arc;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Successfully extracted chapters, ordered by `original_index`
    pub chapters: Vec<Chapter>,

    /// Chapters whose fetch or extraction failed
    pub failed: usize,
}

/// Drives fetch and extraction of a whole link set
///
/// Output order depends only on each link's index, never on which fetch
/// finished first. Each task writes into its own slot of the chunk's result
/// buffer, so nothing else is shared between tasks.
pub struct BatchScheduler {
    source: Arc<dyn PageSource>,
    random: Arc<dyn RandomSource>,
    failure_threshold: f64,
    chunk_delay_min_ms: u64,
    chunk_delay_max_ms: u64,
}

impl BatchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `source` - Where chapter pages come from
    /// * `random` - Source for the pause between chunks
    /// * `config` - Failure threshold and pause window
    pub fn new(
        source: Arc<dyn PageSource>,
        random: Arc<dyn RandomSource>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            source,
            random,
            failure_threshold: config.failure_threshold,
            chunk_delay_min_ms: config.chunk_delay_min_ms,
            chunk_delay_max_ms: config.chunk_delay_max_ms,
        }
    }

    /// Fetches and extracts every link
    ///
    /// # Arguments
    ///
    /// * `links` - The ordered chapter links
    /// * `concurrency_limit` - Maximum fetches in flight at once
    /// * `chunk_size` - Links per chunk
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOutcome)` - The surviving chapters and the failure count
    /// * `Err(ScrollError::TooManyFailures)` - Failures after some chunk
    ///   exceeded `failure_threshold * links.len()`; later chunks never start
    pub async fn run(
        &self,
        links: &LinkSet,
        concurrency_limit: usize,
        chunk_size: usize,
    ) -> Result<BatchOutcome, ScrollError> {
        let total = links.len();
        let concurrency_limit = concurrency_limit.max(1);
        let chunk_size = chunk_size.max(1);
        let chunk_count = total.div_ceil(chunk_size);
        let failure_limit = self.failure_threshold * total as f64;

        let mut chapters = Vec::with_capacity(total);
        let mut failed = 0;

        for (chunk_number, chunk) in links.as_slice().chunks(chunk_size).enumerate() {
            if chunk_number > 0 {
                let pause = self
                    .random
                    .duration_between(self.chunk_delay_min_ms, self.chunk_delay_max_ms);
                tracing::debug!("Pausing {:?} before the next batch", pause);
                tokio::time::sleep(pause).await;
            }

            let first = chunk_number * chunk_size;
            tracing::info!(
                "Processing batch {}/{}: chapters {}-{} of {}",
                chunk_number + 1,
                chunk_count,
                first + 1,
                first + chunk.len(),
                total
            );

            let slots = self.run_chunk(chunk, concurrency_limit, total).await;
            let chunk_failed = slots.iter().filter(|slot| slot.is_none()).count();
            failed += chunk_failed;
            chapters.extend(slots.into_iter().flatten());

            tracing::info!(
                "Batch {}/{} done: {} failed in batch, {} failed overall",
                chunk_number + 1,
                chunk_count,
                chunk_failed,
                failed
            );

            if failed as f64 > failure_limit {
                tracing::error!(
                    "Aborting: {} of {} chapters failed, likely blocked by anti-bot protection",
                    failed,
                    total
                );
                return Err(ScrollError::TooManyFailures { failed, total });
            }
        }

        chapters.sort_by_key(|chapter| chapter.original_index);

        Ok(BatchOutcome { chapters, failed })
    }

    /// Runs one chunk as consecutive groups of at most `concurrency_limit`
    /// tasks, returning one slot per link in chunk order
    async fn run_chunk(
        &self,
        chunk: &[ChapterLink],
        concurrency_limit: usize,
        total: usize,
    ) -> Vec<Option<Chapter>> {
        let mut slots: Vec<Option<Chapter>> = Vec::with_capacity(chunk.len());

        for group in chunk.chunks(concurrency_limit) {
            let results = join_all(group.iter().map(|link| self.fetch_chapter(link, total))).await;
            slots.extend(results);
        }

        slots
    }

    async fn fetch_chapter(&self, link: &ChapterLink, total: usize) -> Option<Chapter> {
        tracing::debug!("Fetching chapter {}/{}: {}", link.index + 1, total, link.url);

        let html = match self.source.fetch(&link.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Chapter {} failed to download: {}", link.index + 1, e);
                return None;
            }
        };

        match extract_chapter(&html, &link.url, link.index) {
            Ok(chapter) => Some(chapter),
            Err(e) => {
                tracing::warn!("Chapter {} failed to extract: {}", link.index + 1, e);
                None
            }
        }
    }
}
