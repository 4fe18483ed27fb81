//! [Vishvas News](https://www.vishvasnews.com), in nine Indian languages.
//!
//! Every `(language, category)` pair is its own listing series. The first
//! page of a series is the category page itself; later pages are loaded by
//! POSTing to WordPress' `admin-ajax.php`, which answers with an HTML
//! fragment. A fragment without a `nav` block is the last page.
//!
//! Records carry the language of the edition they were found in, taken from
//! the first path segment of the review URL.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{absolutize, first_text, hrefs, selector, text};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "vishvasnews",
    name: "Vishvas News",
    base_url: "https://www.vishvasnews.com",
    language: "eng",
};

const AJAX_URL: &str = "https://www.vishvasnews.com/wp-admin/admin-ajax.php";

/// Edition path segment and its ISO 639-3 code.
const EDITIONS: [(&str, &str); 9] = [
    ("english", "eng"),
    ("urdu", "urd"),
    ("assamese", "asm"),
    ("tamil", "tam"),
    ("malayalam", "mal"),
    ("gujarati", "guj"),
    ("telugu", "tel"),
    ("marathi", "mar"),
    ("odia", "ori"),
];

/// Editions that are not crawled but may still appear in review URLs.
const OTHER_EDITIONS: [(&str, &str); 3] = [("punjabi", "pan"), ("hindi", "hin"), ("bangla", "ben")];

const CATEGORIES: [&str; 5] = ["politics", "society", "world", "viral", "health"];

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("false", False),
    ("misleading", Mixture),
    ("fake", False),
    // Punjabi
    ("ਸੱਚ", True),
    ("ਫਰਜ਼ੀ", False),
    ("ਭ੍ਰਮਕ", Mixture),
    // Urdu
    ("سچ", True),
    ("جھوٹ", False),
    ("گمراہ کن", Mixture),
];

static STATIC_LISTING: Lazy<Selector> =
    Lazy::new(|| selector("div.ajax-data-load ul.listing li div.imagecontent h3 a[href]"));
static AJAX_LISTING: Lazy<Selector> =
    Lazy::new(|| selector("ul.listing li div.imagecontent h3 a[href]"));
static NAV: Lazy<Selector> = Lazy::new(|| selector("nav"));
static VERDICT: Lazy<Selector> = Lazy::new(|| selector("div.selected span"));
static CLAIM_SPANS: Lazy<Selector> = Lazy::new(|| selector("ul.claim-review li span"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.article-heading"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("div.lhs-area > p"));
static BODY_LINKS: Lazy<Selector> = Lazy::new(|| {
    selector("div.lhs-area p a[href], div.lhs-area figure iframe")
});
static UPDATED: Lazy<Selector> = Lazy::new(|| selector("ul.updated li"));
static TAGS: Lazy<Selector> = Lazy::new(|| selector("ul.tags a"));
static AUTHORS: Lazy<Selector> = Lazy::new(|| selector("li.name a"));

#[derive(Debug, Clone, Copy, Default)]
pub struct VishvasNews;

/// Request for page `n` of an edition's category listing.
fn listing_request(edition: &str, category: &str, n: u32) -> Request {
    if n == 1 {
        return Request::get(format!("https://www.vishvasnews.com/{edition}/{category}/"));
    }
    Request::post(AJAX_URL)
        .header("X-Requested-With", "XMLHttpRequest")
        .form("action", "ajax_pagination")
        .form(
            "query_vars",
            format!(r#"{{"category_name" : "{category}", "lang" : "{edition}"}}"#),
        )
        .form("page", (n - 1).to_string())
        .form("loadPage", "file-archive-posts-part")
}

/// ISO 639-3 code for the edition a review URL belongs to.
fn language_of(url: &str) -> &'static str {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next()).map(str::to_string));
    segment
        .and_then(|s| {
            EDITIONS
                .iter()
                .chain(OTHER_EDITIONS.iter())
                .find(|(name, _)| *name == s)
                .map(|(_, code)| *code)
        })
        .unwrap_or(SITE.language)
}

impl SourceExtractor for VishvasNews {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        let series = EDITIONS
            .iter()
            .flat_map(|(edition, _)| CATEGORIES.iter().map(move |category| (*edition, *category)));
        Box::new(series.enumerate().flat_map(|(i, (edition, category))| {
            numbered_pages(i as u16, 1, MAX_LISTING_PAGES, move |n| {
                listing_request(edition, category, n)
            })
        }))
    }

    fn parse_listing(&self, page: &PageRef, body: &str) -> Listing {
        let base = Url::parse(SITE.base_url).expect("static url");
        if page.page == 1 {
            let doc = Html::parse_document(body);
            return Listing::new(hrefs(&doc, &STATIC_LISTING, &base));
        }
        let fragment = Html::parse_fragment(body);
        let last = fragment.select(&NAV).next().is_none();
        Listing::new(hrefs(&fragment, &AJAX_LISTING, &base)).last(last)
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        keep_parsed(&SITE, url, [parse_review(url, &doc)])
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        VOCABULARY
    }
}

fn links(doc: &Html, base: &Url) -> Vec<String> {
    doc.select(&BODY_LINKS)
        .filter_map(|el| {
            let v = el.value();
            v.attr("href").or_else(|| v.attr("src")).or_else(|| v.attr("data-src"))
        })
        .filter_map(|h| absolutize(base, h))
        .collect()
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let rating = first_text(doc, &VERDICT)
        .map(|r| r.replace('\u{200e}', ""))
        .and_then(|r| clean_opt(&r))
        .ok_or(ParseError::Missing("verdict"))?;
    let spans: Vec<String> = doc.select(&CLAIM_SPANS).map(text).collect();
    let claim = spans.first().cloned().ok_or(ParseError::Missing("claim"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    // Second entry reads "Updated: March 5, 2024".
    let date = doc.select(&UPDATED).nth(1).and_then(|li| {
        let t = text(li);
        let t = t.trim_start_matches("Updated").trim_start_matches(':');
        parse_date(t, DateLocale::English)
    });
    let authors: Vec<String> = doc.select(&AUTHORS).map(text).filter(|a| !a.is_empty()).collect();
    let body = clean_opt(&doc.select(&PARAGRAPHS).map(text).collect::<Vec<_>>().join("\n"));

    let record = RawRecord::new(SITE.id, claim, url)?
        .with_rating(Some(rating))
        .with_claim_author(spans.get(1).cloned())
        .with_title(first_text(doc, &TITLE))
        .with_review_author((!authors.is_empty()).then(|| authors.join(", ")))
        .with_date(date)
        .with_body(body)
        .with_links(links(doc, &base))
        .with_tags(doc.select(&TAGS).map(text))
        .with_language(language_of(url));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::request::Method;
    use chrono::NaiveDate;

    const REVIEW_PAGE: &str = r#"
        <html><body>
          <h1 class="article-heading">Fact Check: Old video shared as recent</h1>
          <ul class="updated"><li>By Staff</li><li>Updated: March 5, 2024</li></ul>
          <ul class="claim-review"><li><span>Video shows floods in Chennai this week</span></li><li><span>Facebook user</span></li></ul>
          <div class="selected"><span>&lrm;Misleading</span></div>
          <ul class="authors"><li class="name"><a href="/author/a">Asha Rao</a></li></ul>
          <div class="lhs-area">
            <p>The video is from <a href="https://example.com/2015">2015</a>.</p>
            <figure><iframe data-src="https://www.youtube.com/embed/abc"></iframe></figure>
          </div>
          <ul class="tags"><a href="/tag/floods">Floods</a></ul>
        </body></html>"#;

    #[test]
    fn test_series_cover_every_edition_and_category() {
        let firsts: Vec<PageRef> = VishvasNews.list_pages().filter(|p| p.page == 1).collect();
        assert_eq!(firsts.len(), EDITIONS.len() * CATEGORIES.len());
        assert_eq!(firsts[0].request.url, "https://www.vishvasnews.com/english/politics/");
        assert_eq!(firsts[0].request.method, Method::Get);
        assert_eq!(firsts[5].request.url, "https://www.vishvasnews.com/urdu/politics/");
    }

    #[test]
    fn test_later_pages_are_ajax_posts() {
        let second = VishvasNews.list_pages().nth(1).unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.request.method, Method::Post);
        assert_eq!(second.request.url, AJAX_URL);
        assert_eq!(second.request.form.get("page").map(String::as_str), Some("1"));
        assert_eq!(
            second.request.headers.get("x-requested-with").map(String::as_str),
            Some("XMLHttpRequest")
        );
        assert_eq!(
            second.request.form.get("query_vars").map(String::as_str),
            Some(r#"{"category_name" : "politics", "lang" : "english"}"#)
        );
    }

    #[test]
    fn test_ajax_fragment_without_nav_is_last() {
        let pages: Vec<PageRef> = VishvasNews.list_pages().take(2).collect();
        let item = r#"<ul class="listing"><li><div class="imagecontent"><h3><a href="https://www.vishvasnews.com/english/viral/old-video/">x</a></h3></div></li></ul>"#;

        let first = VishvasNews.parse_listing(
            &pages[0],
            &format!(r#"<div class="ajax-data-load">{item}</div><ul class="listing"><li><div class="imagecontent"><h3><a href="/sidebar/">s</a></h3></div></li></ul>"#),
        );
        assert_eq!(first.reviews, vec!["https://www.vishvasnews.com/english/viral/old-video/"]);
        assert!(!first.last_page);

        let more = VishvasNews.parse_listing(&pages[1], &format!("{item}<nav>next</nav>"));
        assert!(!more.last_page);
        let end = VishvasNews.parse_listing(&pages[1], item);
        assert_eq!(end.reviews.len(), 1);
        assert!(end.last_page);
    }

    #[test]
    fn test_review_fields() {
        let url = "https://www.vishvasnews.com/english/viral/old-video/";
        let r = VishvasNews.parse_page(url, REVIEW_PAGE).remove(0);
        assert_eq!(r.claim, "Video shows floods in Chennai this week");
        assert_eq!(r.claim_author.as_deref(), Some("Facebook user"));
        assert_eq!(r.rating.as_deref(), Some("Misleading"));
        assert_eq!(r.review_author.as_deref(), Some("Asha Rao"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(
            r.referred_links,
            vec!["https://example.com/2015", "https://www.youtube.com/embed/abc"]
        );
        assert!(r.tags.contains("Floods"));
        assert_eq!(r.language.as_deref(), Some("eng"));
    }

    #[test]
    fn test_language_follows_url_edition() {
        assert_eq!(language_of("https://www.vishvasnews.com/urdu/viral/x/"), "urd");
        assert_eq!(language_of("https://www.vishvasnews.com/punjabi/viral/x/"), "pan");
        assert_eq!(language_of("https://www.vishvasnews.com/"), "eng");
    }

    #[test]
    fn test_page_without_verdict_yields_nothing() {
        let page = REVIEW_PAGE.replace("div class=\"selected\"", "div class=\"other\"");
        assert!(VishvasNews.parse_page("https://www.vishvasnews.com/english/x/", &page).is_empty());
    }
}
