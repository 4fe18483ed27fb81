//! Small helpers for text cleanup, logging and the file system.
//!
//! - Text cleanup applied to every string scraped from a page
//! - String truncation for log previews
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use unicode_normalization::UnicodeNormalization;

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").expect("static regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").expect("static regex"));

/// Normalize text scraped from HTML.
///
/// Applies NFKC first, so full-width and compatibility forms compare equal
/// to their plain counterparts. Then collapses runs of spaces and blank lines, drops straight and curly quotes,
/// and trims the result. Quotes are removed because fact-check sites wrap the
/// claim text in them inconsistently.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_string("  “Hello”\n\n\n world "), "Hello\nworld");
/// ```
pub fn clean_string(s: &str) -> String {
    let s: String = s.nfkc().collect();
    let s = s.replace(['"', '\'', '“', '”', '‘', '’'], "");
    let s = SPACES.replace_all(&s, " ");
    let s = BLANK_LINES.replace_all(&s, "\n");
    s.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Like [`clean_string`] but returns `None` when nothing is left.
pub fn clean_opt(s: &str) -> Option<String> {
    let cleaned = clean_string(s);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (on a char boundary) with an ellipsis
/// and a byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+8 bytes)"));
    }

    #[test]
    fn test_clean_string() {
        assert_eq!(
            clean_string(" Last winter,   tens of thousands waited on A&E trolleys. "),
            "Last winter, tens of thousands waited on A&E trolleys."
        );
        assert_eq!(clean_string("“Quoted”\n\n\n  next\tline"), "Quoted\nnext line");
        assert_eq!(clean_string("\u{a0}\u{a0}"), "");
        assert_eq!(clean_string("ＦＡＬＳＥ\u{3000}claim"), "FALSE claim");
        assert_eq!(clean_string("ﬁve ﬂags"), "five flags");
    }

    #[test]
    fn test_clean_opt() {
        assert_eq!(clean_opt("  "), None);
        assert_eq!(clean_opt(" x "), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
