//! In-memory page source for scheduler and coordinator tests

use crate::crawler::fetcher::{FetchError, FetchOutcome, PageSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Serves canned outcomes per URL and records how it was called
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<String, FetchOutcome>,
    latency: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn failure(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    pub fn slow(mut self, url: &str, latency: Duration) -> Self {
        self.latency.insert(url.to_string(), latency);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        self.requested.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .latency
            .get(url.as_str())
            .copied()
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.pages.get(url.as_str()).cloned().unwrap_or_else(|| {
            Err(FetchError::NotFound {
                url: url.to_string(),
            })
        })
    }
}

/// A minimal chapter page
pub fn chapter_page(title: &str, body: &str) -> String {
    format!(
        "<html><body><h1>{}</h1><div id=\"content\">{}</div></body></html>",
        title, body
    )
}

/// A table of contents listing `urls` under `#list`
pub fn toc_page(title: &str, urls: &[String]) -> String {
    let items: String = urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!("<dd><a href=\"{}\">第{}章</a></dd>", url, i + 1))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><div id=\"list\"><dl>{}</dl></div></body></html>",
        title, items
    )
}
