//! Final text assembly
//!
//! Chapters are rendered as a title, a blank line and the body, then joined
//! with a rule of `=` characters.

use crate::crawler::Chapter;
use crate::ScrollError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Width of the rule between chapters
pub const CHAPTER_DIVIDER_WIDTH: usize = 50;

/// The assembled novel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// Every downloaded chapter, in table-of-contents order
    pub content: String,

    /// Suggested file name, `<novel name>_<UTC timestamp>.txt`
    pub filename: String,

    /// Chapters included in `content`
    pub succeeded: usize,

    /// Chapters that could not be downloaded or extracted
    pub failed: usize,
}

/// Concatenates chapters into the final text
///
/// # Arguments
///
/// * `chapters` - Downloaded chapters in any order
/// * `failed` - Number of chapters that were lost
/// * `novel_name` - Name used for the file name
/// * `timestamp` - Completion time used for the file name
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The assembled text
/// * `Err(ScrollError::EmptyResult)` - There were no chapters
pub fn assemble(
    mut chapters: Vec<Chapter>,
    failed: usize,
    novel_name: &str,
    timestamp: DateTime<Utc>,
) -> Result<CrawlResult, ScrollError> {
    if chapters.is_empty() {
        return Err(ScrollError::EmptyResult);
    }

    chapters.sort_by_key(|chapter| chapter.original_index);

    let divider = format!("\n{}\n\n", "=".repeat(CHAPTER_DIVIDER_WIDTH));
    let content = chapters
        .iter()
        .map(render_chapter)
        .collect::<Vec<_>>()
        .join(&divider);

    Ok(CrawlResult {
        content,
        filename: artifact_filename(novel_name, timestamp),
        succeeded: chapters.len(),
        failed,
    })
}

/// Renders one chapter as `title`, a blank line, `content` and a blank line
pub fn render_chapter(chapter: &Chapter) -> String {
    format!("{}\n\n{}\n\n", chapter.title, chapter.content)
}

/// Builds `<novel name>_<timestamp>.txt`
///
/// The timestamp is ISO-8601 UTC with millisecond precision, with `:` and
/// `.` replaced by `-`. Path separators in the name become `_`.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sumi_scroll::output::artifact_filename;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
/// assert_eq!(
///     artifact_filename("剑来", at),
///     "剑来_2024-03-09T08-05-01-000Z.txt"
/// );
/// ```
pub fn artifact_filename(novel_name: &str, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(|c| c == ':' || c == '.', "-");

    let name: String = novel_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    format!("{}_{}.txt", name, stamp)
}

/// Writes the assembled text into `directory`, creating it when needed
///
/// # Returns
///
/// The path of the written file
pub fn write_artifact(result: &CrawlResult, directory: &Path) -> Result<PathBuf, ScrollError> {
    fs::create_dir_all(directory)?;

    let path = directory.join(&result.filename);
    let mut file = File::create(&path)?;
    file.write_all(result.content.as_bytes())?;

    tracing::info!("Wrote {} chapters to {}", result.succeeded, path.display());
    Ok(path)
}
