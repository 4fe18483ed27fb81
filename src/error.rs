//! Error types shared across the harvester.
//!
//! Fetch errors carry a transient/permanent split because the retry layer,
//! the extractor failure policy and the run summary all branch on it.
//! Everything that can go wrong while parsing a single item is a
//! [`ParseError`] and never escapes the extractor that produced it.

use thiserror::Error;

/// Failure of a single fetch, after any retries the transport performed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Timeouts, connection resets, 5xx, 408 and 429 responses.
    #[error("transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },

    /// 4xx responses (other than 408/429) and malformed requests.
    #[error("permanent failure fetching {url} (status {status:?}): {reason}")]
    Permanent {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("cache store error: {0}")]
    Cache(#[from] CacheError),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// HTTP status of a permanent failure, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Permanent { status, .. } => *status,
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A record failed its construction invariants.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
}

/// One item on a page could not be turned into a record.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("element not found: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("embedded JSON-LD is invalid: {0}")]
    JsonLd(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown site identifier(s): {}", .0.join(", "))]
    UnknownSites(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_flagged() {
        let e = FetchError::Transient {
            url: "https://example.org".into(),
            reason: "timeout".into(),
        };
        assert!(e.is_transient());
        assert_eq!(e.status(), None);
    }

    #[test]
    fn permanent_errors_expose_status() {
        let e = FetchError::Permanent {
            url: "https://example.org/missing".into(),
            status: Some(404),
            reason: "not found".into(),
        };
        assert!(!e.is_transient());
        assert_eq!(e.status(), Some(404));
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn unknown_sites_lists_every_id() {
        let e = SelectionError::UnknownSites(vec!["alpha".into(), "beta".into()]);
        assert_eq!(e.to_string(), "unknown site identifier(s): alpha, beta");
    }
}
