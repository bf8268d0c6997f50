//! URL handling module for Sumi-Scroll
//!
//! This module provides base URL normalization, site-specific canonicalization
//! rules, and the alternate URL candidates used when a page goes missing.

mod normalize;
mod variants;

// Re-export main functions
pub use normalize::{normalize_base_url, novel_id_fragment, SiteRule, SITE_RULES};
pub use variants::alternate_urls;
