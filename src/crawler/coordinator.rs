//! Crawler coordinator - probe and full-crawl orchestration
//!
//! [`NovelCrawler`] composes the pipeline stages:
//! - Normalizing the table-of-contents URL
//! - Fetching it with the retrying page fetcher
//! - Extracting and ordering chapter links
//! - Scheduling chapter downloads in batches
//! - Assembling the final text

use crate::config::Config;
use crate::crawler::fetcher::{PageFetcher, PageSource};
use crate::crawler::links::extract_chapter_links;
use crate::crawler::probe::{infer_novel_name, ProbeReport};
use crate::crawler::random::{RandomSource, ThreadRandom};
use crate::crawler::scheduler::BatchScheduler;
use crate::job::CrawlJob;
use crate::output::{assemble, CrawlResult};
use crate::url::normalize_base_url;
use crate::ScrollError;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// A configured crawler service
///
/// Holds no per-crawl state, so one instance can serve many probes and
/// crawls, and independent instances never interfere.
pub struct NovelCrawler {
    config: Config,
    source: Arc<dyn PageSource>,
    random: Arc<dyn RandomSource>,
}

impl NovelCrawler {
    /// Creates a crawler that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(NovelCrawler)` - Ready to probe and crawl
    /// * `Err(ScrollError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, ScrollError> {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
        let fetcher = PageFetcher::new(&config.fetcher, random.clone())?;
        Ok(Self::with_parts(config, Arc::new(fetcher), random))
    }

    /// Creates a crawler from an explicit page source and random source
    pub fn with_parts(
        config: Config,
        source: Arc<dyn PageSource>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            config,
            source,
            random,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks a table-of-contents URL without downloading any chapter
    ///
    /// # Returns
    ///
    /// * `Ok(ProbeReport)` - Chapter count and name, or only a name when
    ///   no chapter links were found but the page names a novel
    /// * `Err(ScrollError)` - The page could not be fetched, or it yielded
    ///   neither links nor a name
    pub async fn probe(&self, raw_url: &str) -> Result<ProbeReport, ScrollError> {
        let base_url = Url::parse(&normalize_base_url(raw_url))?;
        tracing::info!("Probing {}", base_url);

        let html = self.source.fetch(&base_url).await?;
        let novel_name = infer_novel_name(&html);
        if let Some(name) = &novel_name {
            tracing::debug!("Inferred novel name: {}", name);
        }

        match extract_chapter_links(&html, &base_url) {
            Ok(links) => Ok(ProbeReport::with_links(
                base_url.as_str(),
                novel_name,
                &links,
            )),
            Err(e) => match novel_name {
                Some(name) => {
                    tracing::warn!("Probe found a name but no chapters: {}", e);
                    Ok(ProbeReport::name_only(
                        base_url.as_str(),
                        name,
                        &e.to_string(),
                    ))
                }
                None => Err(e),
            },
        }
    }

    /// Downloads every chapter of a novel and assembles the text
    ///
    /// # Arguments
    ///
    /// * `job` - What to crawl and with which batch sizes
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - The assembled text, filename and counts
    /// * `Err(ScrollError)` - The first stage that failed, unchanged
    pub async fn crawl(&self, job: &CrawlJob) -> Result<CrawlResult, ScrollError> {
        let started = Instant::now();
        let base_url = Url::parse(&normalize_base_url(job.base_url()))?;

        tracing::info!(
            "Starting crawl of '{}' from {} (concurrency {}, batch size {})",
            job.novel_name(),
            base_url,
            job.concurrency_limit(),
            job.chunk_size()
        );

        let toc = self.source.fetch(&base_url).await?;
        let links = extract_chapter_links(&toc, &base_url)?;
        tracing::info!("Found {} chapter links", links.len());

        let scheduler =
            BatchScheduler::new(self.source.clone(), self.random.clone(), &self.config.crawler);
        let outcome = scheduler
            .run(&links, job.concurrency_limit(), job.chunk_size())
            .await?;

        let result = assemble(
            outcome.chapters,
            outcome.failed,
            job.novel_name(),
            chrono::Utc::now(),
        )?;

        tracing::info!(
            "Crawl of '{}' finished in {:.1}s: {} chapters, {} failed",
            job.novel_name(),
            started.elapsed().as_secs_f64(),
            result.succeeded,
            result.failed
        );

        Ok(result)
    }
}
