use crate::error::{Result, ScanError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// True when `input` starts with `scheme://`. A `://` later in the text,
/// e.g. inside a query string, does not count.
fn has_scheme(input: &str) -> bool {
    input.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Normalized base URL of a target site: scheme, host and port only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteRoot {
    url: Url,
    root: String,
}

impl SiteRoot {
    /// Parse a site root, assuming `https://` when no scheme is given.
    /// Any path, query or fragment is dropped.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ScanError::InvalidUrl("empty site root".to_string()));
        }

        let candidate = if has_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let parsed = Url::parse(&candidate)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                trimmed,
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ScanError::InvalidUrl(format!("{}: missing host", trimmed)));
        }

        let root = parsed.origin().ascii_serialization();
        let url = Url::parse(&root).map_err(|e| ScanError::InvalidUrl(e.to_string()))?;

        Ok(Self { url, root })
    }

    /// `scheme://host[:port]` without a trailing slash.
    pub fn as_str(&self) -> &str {
        &self.root
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Host with a leading `www.` removed, as recorded on lead rows.
    pub fn domain(&self) -> &str {
        let host = self.host();
        host.strip_prefix("www.").unwrap_or(host)
    }

    /// Absolute URL for a root-relative path such as `/robots.txt`.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.root, path)
        } else {
            format!("{}/{}", self.root, path)
        }
    }

    /// Scheme, host and port all match this site.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.url.origin()
    }
}

impl fmt::Display for SiteRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}

impl FromStr for SiteRoot {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SiteRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.root)
    }
}
