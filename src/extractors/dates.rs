//! Date parsing for the formats fact-checking sites print.
//!
//! Handles ISO 8601 / RFC 3339 timestamps, `YYYY-MM-DD` prefixes, and
//! textual dates with English or French month names in either order
//! ("March 5, 2024", "5 mars 2024", "Published Mar 5, 2024"). Purely numeric
//! day/month dates are only read when the locale fixes the order. Anything
//! else yields `None`.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
    English,
    /// Day-first numeric dates, French month names.
    French,
}

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("static regex"));
static NUMERIC_DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b").expect("static regex"));
static TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:st|nd|rd|th|er)?|\p{L}+").expect("static regex"));

const ENGLISH_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const FRENCH_MONTHS: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

fn month_number(word: &str, locale: DateLocale) -> Option<u32> {
    let word = word.to_lowercase();
    let lookup = |names: &[&str; 12]| {
        names.iter().position(|m| {
            *m == word || (word.chars().count() >= 3 && m.starts_with(word.as_str()))
        })
    };
    let found = match locale {
        DateLocale::French => lookup(&FRENCH_MONTHS)
            .or_else(|| (word == "fevrier").then_some(1))
            .or_else(|| (word == "aout").then_some(7))
            .or_else(|| (word == "decembre").then_some(11)),
        DateLocale::English => None,
    }
    .or_else(|| lookup(&ENGLISH_MONTHS));
    found.map(|i| i as u32 + 1)
}

/// Parse a date as printed on a page. Returns `None` rather than guess.
pub fn parse_date(text: &str, locale: DateLocale) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Some(c) = ISO_PREFIX.captures(text) {
        let (y, m, d) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(date) = parse_textual(text, locale) {
        return Some(date);
    }
    if locale == DateLocale::French {
        if let Some(c) = NUMERIC_DMY.captures(text) {
            let (d, m, y) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
            return NaiveDate::from_ymd_opt(y, m, d);
        }
    }
    None
}

enum Token {
    Number(u32, usize),
    Month(u32),
    Word,
}

fn parse_textual(text: &str, locale: DateLocale) -> Option<NaiveDate> {
    let tokens: Vec<Token> = TOKENS
        .captures_iter(text)
        .map(|c| match c.get(1) {
            Some(n) => n
                .as_str()
                .parse()
                .map(|v| Token::Number(v, n.as_str().len()))
                .unwrap_or(Token::Word),
            None => month_number(&c[0], locale).map_or(Token::Word, Token::Month),
        })
        .collect();

    let month_at = tokens.iter().position(|t| matches!(t, Token::Month(_)))?;
    let Token::Month(month) = tokens[month_at] else {
        return None;
    };
    let year = tokens[month_at..].iter().find_map(|t| match t {
        Token::Number(y, 4) => Some(*y as i32),
        _ => None,
    })?;
    let day_of = |t: Option<&Token>| match t {
        Some(Token::Number(d, len)) if *len <= 2 && (1..=31).contains(d) => Some(*d),
        _ => None,
    };
    let day = day_of(tokens.get(month_at + 1))
        .or_else(|| month_at.checked_sub(1).and_then(|i| day_of(tokens.get(i))))?;
    NaiveDate::from_ymd_opt(year, month, day)
}
