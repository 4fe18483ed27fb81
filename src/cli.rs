//! Command-line interface definitions for the harvester.
//!
//! Flags override the YAML config file; anything left unset keeps the file's
//! value or the built-in default.

use clap::Parser;
use std::path::PathBuf;

use crate::config::HarvestConfig;

/// Harvest claim reviews from fact-checking sites into one JSON dataset.
///
/// # Examples
///
/// ```sh
/// # Every site, no record limit
/// claim_review_harvest -o claims.json
///
/// # Two sites, stop after 500 records
/// claim_review_harvest -w politifact,snopes --maxclaims 500 -o claims.json
///
/// # Forget a cached page so the next run refetches it
/// claim_review_harvest --invalidate https://www.snopes.com/fact-check/some-claim/
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site ids to crawl (repeatable or comma separated); all sites if omitted
    #[arg(short, long = "website", value_delimiter = ',')]
    pub websites: Vec<String>,

    /// Stop after this many records; 0 means no limit
    #[arg(long, default_value_t = 0)]
    pub maxclaims: usize,

    /// Path of the JSON file to write
    #[arg(short, long, default_value = "output_got.json")]
    pub output: PathBuf,

    /// Directory of the page cache
    #[arg(long, env = "CLAIM_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the available site ids and exit
    #[arg(long)]
    pub list_sites: bool,

    /// Drop the cached copy of this URL and exit
    #[arg(long, value_name = "URL")]
    pub invalidate: Option<String>,
}

impl Cli {
    /// Overlay the flags that have a config counterpart.
    pub fn apply_to(&self, config: &mut HarvestConfig) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["claim_review_harvest"]).unwrap();
        assert!(cli.websites.is_empty());
        assert_eq!(cli.maxclaims, 0);
        assert_eq!(cli.output, PathBuf::from("output_got.json"));
        assert!(!cli.list_sites);
        assert!(cli.invalidate.is_none());
    }

    #[test]
    fn test_websites_repeatable_and_comma_separated() {
        let cli = Cli::try_parse_from([
            "claim_review_harvest",
            "--website",
            "politifact,snopes",
            "-w",
            "afp",
            "--maxclaims",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.websites, vec!["politifact", "snopes", "afp"]);
        assert_eq!(cli.maxclaims, 10);
    }

    #[test]
    fn test_cache_dir_overrides_config() {
        let cli = Cli::try_parse_from(["claim_review_harvest", "--cache-dir", "/tmp/pages"]).unwrap();
        let mut config = HarvestConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/pages"));

        let untouched = Cli::try_parse_from(["claim_review_harvest"]).unwrap();
        let mut config = HarvestConfig::default();
        untouched.apply_to(&mut config);
        assert_eq!(config, HarvestConfig::default());
    }

    #[test]
    fn test_rejects_negative_maxclaims() {
        assert!(Cli::try_parse_from(["claim_review_harvest", "--maxclaims", "-1"]).is_err());
    }
}
