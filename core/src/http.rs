//! HTTP transport types described as plain data.
//!
//! # Design
//! The backend builds an `HttpRequest` value and hands it to an
//! `HttpSession`; the session reports back a `RawResponse` value. Keeping
//! both sides as plain data means the request builder and the response
//! classifier can be tested without touching the network, and the session
//! can be swapped for a fake.
//!
//! `RawResponse` mirrors what a network stack actually reports: an optional
//! body, optional HTTP metadata and an optional transport error. The
//! classifier decides what that combination means.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::Dictionary;
use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(field, value)` header pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub field: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Request body parameters: a single object or an ordered list of objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    Object(Dictionary),
    Array(Vec<Dictionary>),
}

impl Parameters {
    /// Serialize to the JSON request body.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Parameters::Object(object) => serde_json::to_vec(object),
            Parameters::Array(objects) => serde_json::to_vec(objects),
        }
    }
}

impl From<Dictionary> for Parameters {
    fn from(object: Dictionary) -> Self {
        Parameters::Object(object)
    }
}

impl From<Vec<Dictionary>> for Parameters {
    fn from(objects: Vec<Dictionary>) -> Self {
        Parameters::Array(objects)
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HttpBackend` and executed by an `HttpSession`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<HttpHeader>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First header value matching `field`, compared case-insensitively.
    pub fn header(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.field.eq_ignore_ascii_case(field))
            .map(|h| h.value.as_str())
    }
}

/// Status line and headers of a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Everything a session reports about one round trip.
#[derive(Debug, Default)]
pub struct RawResponse {
    pub body: Option<Vec<u8>>,
    pub head: Option<ResponseHead>,
    pub error: Option<TransportError>,
}

impl RawResponse {
    /// A response that reached the server and came back.
    pub fn received(head: ResponseHead, body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            head: Some(head),
            error: None,
        }
    }

    /// A round trip that failed in transit.
    pub fn failed(error: impl Into<TransportError>) -> Self {
        Self {
            body: None,
            head: None,
            error: Some(error.into()),
        }
    }
}
