//! Reduction of every site's verdict label to a [`CanonicalRating`].
//!
//! Each site documents its own vocabulary ([`SourceExtractor::rating_vocabulary`]).
//! The normalizer indexes those tables by site id and resolves a label in
//! three steps:
//!
//! 1. exact lookup of the normalized label in the site's table
//! 2. keyword fallback shared by all sites, checked in the order FALSE, TRUE,
//!    MIXTURE
//! 3. [`CanonicalRating::Other`]
//!
//! The keyword fallback is best effort. It exists for labels a site
//! introduces after its table was written; the tables are authoritative.
//! `normalize` is total and deterministic: the same `(source, label)` always
//! yields the same rating, and a missing label is `Other`.

use std::collections::HashMap;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::extractors::{RatingVocabulary, SourceExtractor};
use crate::models::{CanonicalRating, NormalizedRecord, RawRecord};

const FALSE_KEYWORDS: &[&str] = &[
    "false", "fake", "pants on fire", "incorrect", "untrue", "not true", "wrong", "hoax",
    "fabricated", "scam", "faux",
];
const TRUE_KEYWORDS: &[&str] = &["true", "correct", "accurate", "vrai"];
const MIXTURE_KEYWORDS: &[&str] = &[
    "mixture", "mixed", "misleading", "half", "partly", "partially", "missing context",
    "exaggerat", "trompeur",
];
/// Qualifiers that turn a TRUE keyword into a partial verdict ("half true").
const MIXTURE_QUALIFIERS: &[&str] = &["half", "partly", "partially", "mixed"];

/// Canonical form of a label: NFKC, lower-cased, whitespace collapsed, surrounding
/// quotes and trailing punctuation removed.
pub fn normalize_label(label: &str) -> String {
    let label: String = label.nfkc().collect();
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    collapsed
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '«' | '»'))
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';' | ':' | '…'))
        .trim()
        .to_string()
}

/// Keyword fallback for labels missing from a site's table.
fn heuristic(label: &str) -> Option<CanonicalRating> {
    let has = |words: &[&str]| words.iter().any(|w| label.contains(w));
    if has(FALSE_KEYWORDS) {
        Some(CanonicalRating::False)
    } else if has(TRUE_KEYWORDS) && !has(MIXTURE_QUALIFIERS) {
        Some(CanonicalRating::True)
    } else if has(MIXTURE_KEYWORDS) {
        Some(CanonicalRating::Mixture)
    } else {
        None
    }
}

/// Immutable label tables for a set of sites.
#[derive(Debug, Clone, Default)]
pub struct RatingNormalizer {
    tables: HashMap<String, HashMap<String, CanonicalRating>>,
}

impl RatingNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for every extractor given.
    pub fn from_registry(extractors: &[Box<dyn SourceExtractor>]) -> Self {
        extractors.iter().fold(Self::new(), |n, e| {
            n.with_vocabulary(e.site().id, e.rating_vocabulary())
        })
    }

    /// Add (or extend) the table of `source`.
    pub fn with_vocabulary(mut self, source: &str, vocabulary: RatingVocabulary) -> Self {
        let table = self.tables.entry(source.to_string()).or_default();
        for (label, rating) in vocabulary {
            table.insert(normalize_label(label), *rating);
        }
        self
    }

    pub fn normalize(&self, source: &str, label: Option<&str>) -> CanonicalRating {
        let Some(label) = label.map(normalize_label).filter(|l| !l.is_empty()) else {
            return CanonicalRating::Other;
        };
        if let Some(rating) = self.tables.get(source).and_then(|t| t.get(&label)) {
            return *rating;
        }
        let rating = heuristic(&label).unwrap_or(CanonicalRating::Other);
        debug!(%source, %label, %rating, "Label not in site table, used fallback");
        rating
    }

    pub fn normalize_record(&self, record: RawRecord) -> NormalizedRecord {
        let canonical_rating = self.normalize(&record.source, record.rating.as_deref());
        NormalizedRecord {
            record,
            canonical_rating,
        }
    }
}
