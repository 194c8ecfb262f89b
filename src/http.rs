//! Request and response descriptors seen at the interception boundary.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

/// What the page intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    /// `<img>` and other image loads.
    Image,
    /// Scripts, stylesheets, XHR and everything else.
    #[default]
    Other,
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "other" | "" => Ok(Self::Other),
            other => Err(format!("unknown destination '{other}'")),
        }
    }
}

/// Request mode, which decides how readable a cross-origin response is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Document navigation.
    Navigate,
    /// Only same-origin targets are allowed.
    SameOrigin,
    /// Cross-origin allowed with a readable response.
    Cors,
    /// Cross-origin allowed, response is opaque.
    #[default]
    NoCors,
}

/// Visibility class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response, fully introspectable.
    #[default]
    Basic,
    /// Cross-origin response obtained in CORS mode.
    Cors,
    /// Cross-origin response whose status and body cannot be read.
    Opaque,
    /// Network error placeholder.
    Error,
}

/// An outgoing request as seen by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, upper-case.
    pub method: String,
    /// Absolute request URL.
    pub url: Url,
    /// Intended use of the response.
    pub destination: Destination,
    /// Request mode.
    pub mode: RequestMode,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

impl Request {
    /// Creates a GET request for a subresource.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            destination: Destination::Other,
            mode: RequestMode::NoCors,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a top-level document navigation.
    #[must_use]
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_destination(Destination::Document)
            .with_mode(RequestMode::Navigate)
    }

    /// Creates an image load.
    #[must_use]
    pub fn image(url: Url) -> Self {
        Self::get(url).with_destination(Destination::Image)
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    /// Sets the destination.
    #[must_use]
    pub const fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the request mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialized origin of the request URL, e.g. `https://cdn.jsdelivr.net`.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Whether this is a `GET`. Only `GET` requests are looked up in or written to partitions.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Cache key for this request.
    #[must_use]
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Identity of a cache entry: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Upper-case HTTP method.
    pub method: String,
    /// URL with the fragment removed.
    pub url: String,
}

impl RequestKey {
    /// Builds a normalised key.
    #[must_use]
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Key for a plain GET of `url`.
    #[must_use]
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response snapshot, either from the network or from a partition.
///
/// Bodies are reference-counted, so cloning a response to hand one copy to
/// the caller and write the other to a partition does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code. Opaque responses report 0.
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
    /// Visibility class.
    pub kind: ResponseType,
}

impl Response {
    /// Creates a basic response with the canonical reason phrase.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseType::Basic,
        }
    }

    /// Creates an opaque response, as produced by a no-cors cross-origin fetch.
    #[must_use]
    pub fn opaque() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: Bytes::new(),
            kind: ResponseType::Opaque,
        }
    }

    /// Creates a JSON response from a serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn json<T: Serialize>(status: u16, value: &T) -> crate::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status, body).with_header("Content-Type", "application/json"))
    }

    /// Sets the response type.
    #[must_use]
    pub const fn with_type(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for any 2xx status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the first header value matching `name`, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the fetch handler may write this response to a partition.
    ///
    /// Only a plain 200 with a same-origin body qualifies.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }
}
