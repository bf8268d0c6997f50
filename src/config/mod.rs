//! Configuration module for Sumi-Scroll
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: [`Config::default`] carries the values the
//! crawler was tuned with.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scroll::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scroll.toml")).unwrap();
//! println!("Chapters per batch: {}", config.crawler.chunk_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherConfig, OutputConfig, DEFAULT_COOKIE, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
