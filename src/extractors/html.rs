//! Markup helpers shared by the site extractors.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::utils::{clean_opt, clean_string};

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector"));

/// Parse a selector known at compile time.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Concatenated, cleaned text of an element.
pub fn text(el: ElementRef<'_>) -> String {
    clean_string(&el.text().collect::<String>())
}

/// Cleaned text of the first match in a document, if non-empty.
pub fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel).next().and_then(|el| clean_opt(&el.text().collect::<String>()))
}

/// Cleaned text of the first match under an element, if non-empty.
pub fn first_text_in(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().and_then(|e| clean_opt(&e.text().collect::<String>()))
}

pub fn first_attr(doc: &Html, sel: &Selector, name: &str) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// `content` of `<meta property=…>` or `<meta name=…>`.
pub fn meta(doc: &Html, key: &str) -> Option<String> {
    let css = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
    let sel = Selector::parse(&css).ok()?;
    first_attr(doc, &sel, "content").and_then(|c| clean_opt(&c))
}

/// Readable text of an element: text outside scripts, styles and navigation,
/// one line per block element.
pub fn body_text(el: ElementRef<'_>) -> Option<String> {
    body_text_excluding(el, &[])
}

/// [`body_text`], also skipping elements carrying any of `skip_classes`
/// (fact boxes, related-article widgets).
pub fn body_text_excluding(el: ElementRef<'_>, skip_classes: &[&str]) -> Option<String> {
    fn collect(el: ElementRef<'_>, skip_classes: &[&str], out: &mut String) {
        for child in el.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
            } else if let Some(child) = ElementRef::wrap(child) {
                let name = child.value().name();
                if matches!(name, "script" | "style" | "noscript" | "nav" | "button")
                    || child.value().classes().any(|c| skip_classes.contains(&c))
                {
                    continue;
                }
                collect(child, skip_classes, out);
                if matches!(
                    name,
                    "p" | "div" | "li" | "br" | "h1" | "h2" | "h3" | "h4" | "blockquote"
                ) {
                    out.push('\n');
                }
            }
        }
    }

    let mut out = String::new();
    collect(el, skip_classes, &mut out);
    clean_opt(&out)
}

/// Resolve `href` against `base`, keeping only http(s) targets.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Absolute `href`s of the anchors matched by `sel`, in document order.
pub fn hrefs(doc: &Html, sel: &Selector, base: &Url) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for el in doc.select(sel) {
        if let Some(link) = el.value().attr("href").and_then(|h| absolutize(base, h)) {
            if !out.contains(&link) {
                out.push(link);
            }
        }
    }
    out
}

/// Links cited inside an element.
pub fn links_in(el: ElementRef<'_>, base: &Url) -> Vec<String> {
    el.select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|h| absolutize(base, h))
        .collect()
}

/// Every JSON-LD block of the page. Blocks that do not parse are skipped.
pub fn json_ld(doc: &Html) -> Vec<Value> {
    doc.select(&JSON_LD)
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(error = %e, "Ignoring invalid JSON-LD block");
                    None
                }
            }
        })
        .collect()
}

/// Every object typed `ty`, looking inside arrays and `@graph`, in document
/// order.
pub fn find_typed<'a>(blocks: &'a [Value], ty: &str) -> Vec<&'a Value> {
    fn walk<'a>(v: &'a Value, ty: &str, out: &mut Vec<&'a Value>) {
        match v {
            Value::Array(items) => items.iter().for_each(|item| walk(item, ty, out)),
            Value::Object(map) => {
                let typed = match map.get("@type") {
                    Some(Value::String(t)) => t == ty,
                    Some(Value::Array(ts)) => ts.iter().any(|t| t == ty),
                    _ => false,
                };
                if typed {
                    out.push(v);
                } else if let Some(graph) = map.get("@graph") {
                    walk(graph, ty, out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    blocks.iter().for_each(|b| walk(b, ty, &mut out));
    out
}

/// First object typed `ClaimReview`.
pub fn find_claim_review(blocks: &[Value]) -> Option<&Value> {
    find_typed(blocks, "ClaimReview").into_iter().next()
}

/// String or number at a JSON path, as text. Arrays along the path,
/// including at its end, contribute their first element.
pub fn json_str(v: &Value, path: &[&str]) -> Option<String> {
    let mut cur = v;
    for key in path {
        cur = match cur {
            Value::Array(items) => items.first()?.get(key)?,
            _ => cur.get(key)?,
        };
    }
    if let Value::Array(items) = cur {
        cur = items.first()?;
    }
    match cur {
        Value::String(s) => clean_opt(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
