//! Resource URI parsing
//!
//! Anything [`url::Url`] accepts is split into scheme, host, path and query.
//! Strings without a scheme are bare paths; they keep their text verbatim,
//! apart from an optional `?query` suffix.

use crate::{Error, Result};
use percent_encoding::percent_decode_str;
use std::fmt;
use url::{form_urlencoded, ParseError, Url};

/// Stand-in for secret values in logs and error messages
pub const REDACTED: &str = "********";

/// Query parameters whose values are never logged
const SECRET_PARAMS: &[&str] = &["secret_key"];

/// A parsed resource identifier
#[derive(Clone, PartialEq, Eq)]
pub struct ResourceUri {
    raw: String,
    scheme: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    url: Option<Url>,
}

impl ResourceUri {
    /// Parse `raw`; a string with no scheme is a bare path, not an error
    pub fn parse(raw: &str) -> Result<Self> {
        match Url::parse(raw) {
            Ok(url) => Ok(Self::from_url(raw, url)),
            Err(ParseError::RelativeUrlWithoutBase) => Ok(Self::bare_path(raw)),
            Err(e) => Err(Error::InvalidUri {
                uri: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn from_url(raw: &str, url: Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        ResourceUri {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            host,
            path: decode(url.path()),
            query: url.query_pairs().into_owned().collect(),
            url: Some(url),
        }
    }

    fn bare_path(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));

        ResourceUri {
            raw: raw.to_string(),
            scheme: String::new(),
            host: String::new(),
            path: path.to_string(),
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            url: None,
        }
    }

    /// The text this URI was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercase scheme, empty for bare paths
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host, with the port when one is given
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Percent-decoded path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of the query parameter `name`
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All query parameters in order
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Query string with secret values masked
    pub fn redacted_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.query_pairs() {
            let value = if SECRET_PARAMS.contains(&key) && !value.is_empty() {
                REDACTED
            } else {
                value
            };
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// The URI with secret query values and any password masked
    pub fn redacted(&self) -> String {
        let mut shown = match &self.url {
            Some(url) => {
                let mut url = url.clone();
                if url.password().is_some() {
                    // Fails only for URLs that cannot carry credentials
                    let _ = url.set_password(Some(REDACTED));
                }
                url.set_query(None);
                url.to_string()
            }
            None => self.path.clone(),
        };

        if !self.query.is_empty() {
            shown.push('?');
            shown.push_str(&self.redacted_query());
        }
        shown
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceUri")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("query", &self.redacted_query())
            .finish()
    }
}

fn decode(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}
