//! Request descriptors and their cache fingerprints.
//!
//! A fingerprint is the SHA-256 of the request's canonical form:
//!
//! ```text
//! POST https://www.example.org/wp-admin/admin-ajax.php?a=1&b=2
//! form:action=ajax_pagination
//! form:page=3
//! header:accept-language=fr
//! ```
//!
//! Scheme and host are lower-cased, default ports and fragments are dropped,
//! query pairs, form fields and headers are sorted. Two descriptors that
//! differ only in those respects share a cache entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything about a request that can change the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Form fields sent as `application/x-www-form-urlencoded` (POST only).
    pub form: BTreeMap<String, String>,
    /// Headers that vary the content. Transport-wide headers such as the
    /// user agent are not listed here.
    pub headers: BTreeMap<String, String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            form: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Canonical text the fingerprint is computed from.
    pub fn canonical(&self) -> String {
        let mut out = format!("{} {}", self.method, canonical_url(&self.url));
        for (k, v) in &self.form {
            out.push_str(&format!(
                "\nform:{}={}",
                urlencoding::encode(k),
                urlencoding::encode(v)
            ));
        }
        for (k, v) in &self.headers {
            out.push_str(&format!("\nheader:{}={}", k, v.trim()));
        }
        out
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(self.canonical().as_bytes());
        Fingerprint(hex::encode(digest))
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Normalize a URL for fingerprinting. Unparseable input is only trimmed, so
/// the fingerprint stays deterministic and the transport reports the error.
pub fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };
    url.set_fragment(None);
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.set_query(None);
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url.to_string()
}

/// Stable cache key of a [`Request`]: lower-case hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_url_normalizes_host_port_query_and_fragment() {
        assert_eq!(
            canonical_url("HTTPS://WWW.Example.org:443/path?b=2&a=1#section"),
            "https://www.example.org/path?a=1&b=2"
        );
        assert_eq!(canonical_url("https://example.org"), "https://example.org/");
        assert_eq!(canonical_url("not a url "), "not a url");
    }

    #[test]
    fn test_equivalent_requests_share_a_fingerprint() {
        let a = Request::get("https://www.politifact.com/factchecks/?page=2&x=1");
        let b = Request::get("https://WWW.politifact.com/factchecks/?x=1&page=2#top");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_method_form_and_headers_change_the_fingerprint() {
        let get = Request::get("https://example.org/ajax");
        let post = Request::post("https://example.org/ajax");
        assert_ne!(get.fingerprint(), post.fingerprint());

        let page1 = Request::post("https://example.org/ajax").form("page", "1");
        let page2 = Request::post("https://example.org/ajax").form("page", "2");
        assert_ne!(page1.fingerprint(), page2.fingerprint());

        let fr = Request::get("https://example.org/").header("Accept-Language", "fr");
        let en = Request::get("https://example.org/").header("accept-language", "en");
        assert_ne!(fr.fingerprint(), en.fingerprint());
    }

    #[test]
    fn test_form_order_does_not_matter() {
        let a = Request::post("https://example.org/ajax")
            .form("action", "load")
            .form("page", "3");
        let b = Request::post("https://example.org/ajax")
            .form("page", "3")
            .form("action", "load");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(a.canonical().contains("form:action=load\nform:page=3"));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = Request::get("https://example.org/").fingerprint();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
