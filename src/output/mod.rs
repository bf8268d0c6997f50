//! Output module for the assembled novel
//!
//! This module handles:
//! - Ordering and concatenating downloaded chapters
//! - Deriving the output file name
//! - Writing the text file to disk

mod assembler;

pub use assembler::{
    artifact_filename, assemble, render_chapter, write_artifact, CrawlResult,
    CHAPTER_DIVIDER_WIDTH,
};
