//! AFP fact checks, in English ([factcheck.afp.com](https://factcheck.afp.com))
//! and French ([factuel.afp.com](https://factuel.afp.com)).
//!
//! Both editions share one layout and publish a schema.org `ClaimReview`
//! block, which holds the claim, the verdict with its numeric scale, the
//! claimer and the claim date. Only the host, the language and the verdict
//! vocabulary differ between the two.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{
    body_text, find_claim_review, first_text, hrefs, json_ld, json_str, links_in, selector, text,
};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RatingScale, RawRecord};
use crate::utils::clean_opt;

static ENGLISH: SiteInfo = SiteInfo {
    id: "afp",
    name: "AFP Fact Check",
    base_url: "https://factcheck.afp.com",
    language: "eng",
};

static FRENCH: SiteInfo = SiteInfo {
    id: "afp-fr",
    name: "AFP Factuel",
    base_url: "https://factuel.afp.com",
    language: "fra",
};

const ENGLISH_VOCABULARY: RatingVocabulary = &[
    ("false", False),
    ("altered", False),
    ("fake", False),
    ("altered photo", False),
    ("altered video", False),
    ("misleading", Mixture),
    ("partly false", Mixture),
    ("missing context", Mixture),
    ("mixture", Mixture),
    ("true", True),
    ("satire", Other),
    ("unproven", Other),
];

const FRENCH_VOCABULARY: RatingVocabulary = &[
    ("faux", False),
    ("photo retouchée", False),
    ("vidéo retouchée", False),
    ("trompeur", Mixture),
    ("partiellement faux", Mixture),
    ("manque de contexte", Mixture),
    ("vrai", True),
    ("satire", Other),
    ("parodie", Other),
    ("invérifiable", Other),
];

static LISTING: Lazy<Selector> = Lazy::new(|| selector("div.card a[href]"));
static PAGINATION: Lazy<Selector> = Lazy::new(|| selector("nav#pagination .page-link-desktop[href]"));
static AUTHORS: Lazy<Selector> = Lazy::new(|| selector("span.meta-author"));
static AUTHOR_LINKS: Lazy<Selector> = Lazy::new(|| selector("span.meta-author a[href]"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("div.article-entry"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static TAGS: Lazy<Selector> = Lazy::new(|| selector("div.tags a"));

static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"page=(\d+)").expect("static regex"));

/// One AFP edition.
#[derive(Debug, Clone, Copy)]
pub struct Afp {
    site: &'static SiteInfo,
    locale: DateLocale,
    vocabulary: RatingVocabulary,
}

impl Afp {
    pub fn english() -> Self {
        Self {
            site: &ENGLISH,
            locale: DateLocale::English,
            vocabulary: ENGLISH_VOCABULARY,
        }
    }

    pub fn french() -> Self {
        Self {
            site: &FRENCH,
            locale: DateLocale::French,
            vocabulary: FRENCH_VOCABULARY,
        }
    }

    fn parse_review(&self, url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
        let metadata = json_ld(doc);
        let review = find_claim_review(&metadata).ok_or(ParseError::Missing("ClaimReview metadata"))?;
        let claim = json_str(review, &["claimReviewed"]).ok_or(ParseError::Missing("claimReviewed"))?;
        let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

        let scale = RatingScale {
            value: json_str(review, &["reviewRating", "ratingValue"]),
            best: json_str(review, &["reviewRating", "bestRating"]),
            worst: json_str(review, &["reviewRating", "worstRating"]),
        };
        // Some reviews only carry the numeric value; 1 is the bottom of the scale.
        let rating = json_str(review, &["reviewRating", "alternateName"])
            .map(|r| title_case(&r))
            .or_else(|| (scale.value.as_deref() == Some("1")).then(|| "False".to_string()));

        let authors = first_text(doc, &AUTHORS).map(|a| {
            a.split(',')
                .filter_map(clean_opt)
                .collect::<Vec<_>>()
                .join(", ")
        });

        let author_urls = hrefs(doc, &AUTHOR_LINKS, &base);

        let article = doc.select(&ARTICLE).next();
        let record = RawRecord::new(self.site.id, claim, url)?
            .with_rating(rating)
            .with_rating_scale(scale)
            .with_title(json_str(review, &["name"]).or_else(|| first_text(doc, &HEADLINE)))
            .with_review_author(authors.or_else(|| json_str(review, &["author", "name"])))
            .with_review_author_url(Some(author_urls.join(", ")))
            .with_date(json_str(review, &["datePublished"]).and_then(|d| parse_date(&d, self.locale)))
            .with_claim_author(json_str(review, &["itemReviewed", "author", "name"]))
            .with_claim_date(
                json_str(review, &["itemReviewed", "datePublished"])
                    .and_then(|d| parse_date(&d, self.locale)),
            )
            .with_body(article.and_then(body_text))
            .with_links(article.map(|a| links_in(a, &base)).unwrap_or_default())
            .with_tags(doc.select(&TAGS).map(text))
            .with_language(self.site.language);
        Ok(record)
    }
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Highest page number linked from the pagination bar.
fn last_listed_page(doc: &Html) -> Option<u32> {
    doc.select(&PAGINATION)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|h| PAGE_PARAM.captures(h).and_then(|c| c[1].parse().ok()))
        .max()
}

impl SourceExtractor for Afp {
    fn site(&self) -> &'static SiteInfo {
        self.site
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        let base = self.site.base_url;
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, move |n| {
            Request::get(format!("{base}/list?page={n}"))
        }))
    }

    fn parse_listing(&self, page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(self.site.base_url).expect("static url");
        let last = last_listed_page(&doc).is_some_and(|last| page.page >= last);
        Listing::new(hrefs(&doc, &LISTING, &base)).last(last)
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        keep_parsed(self.site, url, [self.parse_review(url, &doc)])
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ENGLISH_PAGE: &str = r#"
        <html><head>
          <script type="application/ld+json">{"@context":"http://schema.org","@graph":[{"@type":"ClaimReview","name":"Video does not show flooding in Dubai","datePublished":"2024-04-18 10:12","claimReviewed":"Video shows flooding in Dubai airport","reviewRating":{"@type":"Rating","ratingValue":"1","bestRating":"5","worstRating":"1","alternateName":"MISLEADING"},"itemReviewed":{"@type":"Claim","author":{"@type":"Organization","name":["Social media users"]},"datePublished":"2024-04-16"}}]}</script>
        </head><body>
          <h1>Video does not show flooding in Dubai</h1>
          <span class="meta-author"><a href="/author/jane-doe">Jane Doe</a>, <a href="/author/john-roe">John Roe</a></span>
          <div class="article-entry clearfix">
            <p>The clip was filmed in <a href="https://example.com/source">2019</a>.</p>
            <script>ads()</script>
          </div>
          <div class="tags"><a href="/tag/weather">Weather</a><a href="/tag/uae">UAE</a></div>
        </body></html>"#;

    #[test]
    fn test_editions_differ_by_host_and_language() {
        let en = Afp::english();
        let fr = Afp::french();
        assert_eq!(en.site().id, "afp");
        assert_eq!(fr.site().id, "afp-fr");
        assert_eq!(
            en.list_pages().next().unwrap().request.url,
            "https://factcheck.afp.com/list?page=1"
        );
        assert_eq!(
            fr.list_pages().nth(2).unwrap().request.url,
            "https://factuel.afp.com/list?page=3"
        );
        assert!(fr.rating_vocabulary().iter().any(|(l, _)| *l == "faux"));
    }

    #[test]
    fn test_listing_detects_last_page() {
        let afp = Afp::english();
        let body = r#"<div class="card"><a href="/doc.afp.com.ABC">x</a></div>
            <nav id="pagination"><a class="page-link-desktop" href="/list?page=2">2</a><a class="page-link-desktop" href="/list?page=3">3</a></nav>"#;
        let pages: Vec<PageRef> = afp.list_pages().take(3).collect();
        let first = afp.parse_listing(&pages[0], body);
        assert_eq!(first.reviews, vec!["https://factcheck.afp.com/doc.afp.com.ABC"]);
        assert!(!first.last_page);
        assert!(afp.parse_listing(&pages[2], body).last_page);
    }

    #[test]
    fn test_claim_review_metadata() {
        let url = "https://factcheck.afp.com/doc.afp.com.ABC";
        let r = Afp::english().parse_page(url, ENGLISH_PAGE).remove(0);
        assert_eq!(r.source, "afp");
        assert_eq!(r.claim, "Video shows flooding in Dubai airport");
        assert_eq!(r.rating.as_deref(), Some("Misleading"));
        assert_eq!(r.rating_scale.value.as_deref(), Some("1"));
        assert_eq!(r.rating_scale.best.as_deref(), Some("5"));
        assert_eq!(r.title.as_deref(), Some("Video does not show flooding in Dubai"));
        assert_eq!(r.review_author.as_deref(), Some("Jane Doe, John Roe"));
        assert_eq!(
            r.review_author_url.as_deref(),
            Some("https://factcheck.afp.com/author/jane-doe, https://factcheck.afp.com/author/john-roe")
        );
        assert_eq!(r.claim_author.as_deref(), Some("Social media users"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 4, 18));
        assert_eq!(r.claim_date, NaiveDate::from_ymd_opt(2024, 4, 16));
        assert_eq!(r.referred_links, vec!["https://example.com/source"]);
        assert!(r.tags.contains("UAE"));
        assert_eq!(r.language.as_deref(), Some("eng"));
    }

    #[test]
    fn test_numeric_only_rating_is_false() {
        let page = ENGLISH_PAGE.replace(r#","alternateName":"MISLEADING""#, "");
        let r = Afp::english().parse_page("https://factcheck.afp.com/x", &page).remove(0);
        assert_eq!(r.rating.as_deref(), Some("False"));
    }

    #[test]
    fn test_french_edition_records() {
        let page = ENGLISH_PAGE.replace("MISLEADING", "faux");
        let r = Afp::french().parse_page("https://factuel.afp.com/x", &page).remove(0);
        assert_eq!(r.source, "afp-fr");
        assert_eq!(r.rating.as_deref(), Some("Faux"));
        assert_eq!(r.language.as_deref(), Some("fra"));
    }

    #[test]
    fn test_page_without_claim_review_yields_nothing() {
        let records = Afp::english().parse_page("https://factcheck.afp.com/x", "<html><h1>t</h1></html>");
        assert!(records.is_empty());
    }
}
