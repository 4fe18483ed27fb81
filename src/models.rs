//! Record model shared by extractors, the normalizer and the output writer.
//!
//! - [`RawRecord`]: what an extractor produces from one claim-review page
//! - [`NormalizedRecord`]: a raw record plus its [`CanonicalRating`]
//! - [`RatingScale`]: the schema.org numeric rating some sites publish
//!
//! Only the claim text and the review URL are mandatory. Everything else is an
//! `Option` or an empty collection so that "the site did not publish it" is
//! never confused with a placeholder value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::RecordError;

/// The four-valued taxonomy every site's verdict is reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CanonicalRating {
    True,
    False,
    Mixture,
    Other,
}

impl CanonicalRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalRating::True => "TRUE",
            CanonicalRating::False => "FALSE",
            CanonicalRating::Mixture => "MIXTURE",
            CanonicalRating::Other => "OTHER",
        }
    }
}

impl fmt::Display for CanonicalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric rating published in schema.org `reviewRating` metadata.
///
/// Values are kept as published (some sites use `"1"`, others `1.0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    pub value: Option<String>,
    pub best: Option<String>,
    pub worst: Option<String>,
}

impl RatingScale {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.best.is_none() && self.worst.is_none()
    }
}

/// A claim review as extracted from one site, before rating normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Identifier of the site that published the review (registry key).
    pub source: String,
    /// The statement being fact-checked.
    pub claim: String,
    /// Verdict label exactly as published (after whitespace cleanup).
    pub rating: Option<String>,
    /// URL of the claim review.
    pub url: String,
    /// Text of the review article.
    pub body: Option<String>,
    /// Date the review was published.
    pub date: Option<NaiveDate>,
    /// Links cited in the review body, in document order, without duplicates.
    pub referred_links: Vec<String>,
    pub tags: BTreeSet<String>,
    /// ISO 639-3 code of the review's language.
    pub language: Option<String>,
    pub title: Option<String>,
    pub review_author: Option<String>,
    /// Profile page of the review author.
    pub review_author_url: Option<String>,
    /// Who made the claim.
    pub claim_author: Option<String>,
    /// When the claim was made, if the site says so.
    pub claim_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "RatingScale::is_empty", default)]
    pub rating_scale: RatingScale,
}

impl RawRecord {
    /// Build a record, enforcing that claim text and URL are non-empty.
    pub fn new(
        source: impl Into<String>,
        claim: impl AsRef<str>,
        url: impl AsRef<str>,
    ) -> Result<Self, RecordError> {
        let claim = claim.as_ref().trim();
        let url = url.as_ref().trim();
        if claim.is_empty() {
            return Err(RecordError::MissingField("claim"));
        }
        if url.is_empty() {
            return Err(RecordError::MissingField("url"));
        }
        Ok(Self {
            source: source.into(),
            claim: claim.to_string(),
            rating: None,
            url: url.to_string(),
            body: None,
            date: None,
            referred_links: Vec::new(),
            tags: BTreeSet::new(),
            language: None,
            title: None,
            review_author: None,
            review_author_url: None,
            claim_author: None,
            claim_date: None,
            rating_scale: RatingScale::default(),
        })
    }

    /// Set the published verdict.
    ///
    /// Quotes are stripped and only the first sentence is kept: several sites
    /// follow the verdict with an explanation ("Incorrect. The figure is...").
    pub fn with_rating(mut self, label: Option<String>) -> Self {
        self.rating = label.and_then(|l| {
            let l = l.replace('"', "");
            let first = l.split(". ").next().unwrap_or("").trim().trim_end_matches('.');
            non_empty(first)
        });
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body.and_then(|b| non_empty(&b));
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for link in links {
            let link = link.into();
            if !link.is_empty() && !self.referred_links.contains(&link) {
                self.referred_links.push(link);
            }
        }
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .filter_map(|t| non_empty(t.as_ref().trim_start_matches('#'))),
        );
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.and_then(|t| non_empty(&t));
        self
    }

    pub fn with_review_author(mut self, author: Option<String>) -> Self {
        self.review_author = author.and_then(|a| non_empty(&a));
        self
    }

    pub fn with_review_author_url(mut self, url: Option<String>) -> Self {
        self.review_author_url = url.and_then(|u| non_empty(&u));
        self
    }

    pub fn with_claim_author(mut self, author: Option<String>) -> Self {
        self.claim_author = author.and_then(|a| non_empty(&a));
        self
    }

    pub fn with_claim_date(mut self, date: Option<NaiveDate>) -> Self {
        self.claim_date = date;
        self
    }

    pub fn with_rating_scale(mut self, scale: RatingScale) -> Self {
        self.rating_scale = scale;
        self
    }

    /// Identity used for deduplication across listing pages.
    pub fn key(&self) -> (&str, &str) {
        (&self.source, &self.url)
    }
}

/// A raw record with its normalized rating attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    pub canonical_rating: CanonicalRating,
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RawRecord {
        RawRecord::new("politifact", "The moon is made of cheese", "https://example.org/a")
            .unwrap()
    }

    #[test]
    fn test_new_rejects_empty_claim_and_url() {
        assert_eq!(
            RawRecord::new("s", "   ", "https://example.org").unwrap_err(),
            RecordError::MissingField("claim")
        );
        assert_eq!(
            RawRecord::new("s", "claim", "").unwrap_err(),
            RecordError::MissingField("url")
        );
    }

    #[test]
    fn test_optional_fields_start_missing() {
        let r = record();
        assert_eq!(r.rating, None);
        assert_eq!(r.body, None);
        assert_eq!(r.date, None);
        assert!(r.referred_links.is_empty());
        assert!(r.tags.is_empty());
        assert_eq!(r.language, None);
    }

    #[test]
    fn test_with_rating_keeps_first_sentence() {
        let r = record().with_rating(Some("\"Incorrect. The figure is lower.\"".into()));
        assert_eq!(r.rating.as_deref(), Some("Incorrect"));

        let r = record().with_rating(Some("Mostly True".into()));
        assert_eq!(r.rating.as_deref(), Some("Mostly True"));

        let r = record().with_rating(Some("  ".into()));
        assert_eq!(r.rating, None);
    }

    #[test]
    fn test_links_keep_order_and_drop_duplicates() {
        let r = record().with_links(["https://b", "https://a", "https://b", ""]);
        assert_eq!(r.referred_links, vec!["https://b", "https://a"]);
    }

    #[test]
    fn test_tags_are_a_set() {
        let r = record().with_tags(["#health", "health", "vaccines", " "]);
        assert_eq!(r.tags.len(), 2);
        assert!(r.tags.contains("health"));
    }

    #[test]
    fn test_normalized_record_serialization() {
        let n = NormalizedRecord {
            record: record().with_rating(Some("Pants on Fire".into())),
            canonical_rating: CanonicalRating::False,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["canonical_rating"], "FALSE");
        assert_eq!(json["rating"], "Pants on Fire");
        assert_eq!(json["claim"], "The moon is made of cheese");
        assert!(json["date"].is_null());
        assert!(json.get("rating_scale").is_none());
    }

    #[test]
    fn test_canonical_rating_display() {
        assert_eq!(CanonicalRating::Mixture.to_string(), "MIXTURE");
        assert_eq!(CanonicalRating::Other.as_str(), "OTHER");
    }
}
