//! Error types for the repository client.
//!
//! # Design
//! `ApiError` is a closed set: every failure a repository call can produce
//! is one of these variants, delivered through the failure branch of a
//! `Deferred`. `NotFound` gets a dedicated variant because callers
//! frequently distinguish "the resource does not exist" from "the server
//! returned an unexpected status". 5xx statuses land in `ServerError`,
//! every other non-2xx in `Undefined`, both with the raw status code.
//!
//! `EntityError` explains why a dictionary could not become an entity. It
//! is surfaced wrapped in `ApiError::Parsing`.

use thiserror::Error;

/// Boxed transport failure carried by `ApiError::Other`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the backend and repository layers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be built: malformed URL or non-serializable
    /// parameters. Nothing was sent.
    #[error("request could not be built: {0}")]
    BadRequest(String),

    /// No transport error occurred, but the response was missing or its
    /// body was not the JSON shape the caller asked for.
    #[error("response is missing or malformed")]
    BadResponse,

    /// The body was valid JSON but could not be converted into the entity.
    #[error("entity could not be parsed: {0}")]
    Parsing(#[source] EntityError),

    /// The server returned 404 or 410.
    #[error("resource not found")]
    NotFound,

    /// The server returned a 5xx status.
    #[error("server error (HTTP {0})")]
    ServerError(u16),

    /// The server returned a non-2xx status with no dedicated variant.
    #[error("unexpected HTTP status {0}")]
    Undefined(u16),

    /// The request failed in transit (connectivity, timeout, TLS, ...).
    #[error("transport failure: {0}")]
    Other(#[source] TransportError),
}

impl ApiError {
    /// The HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::ServerError(code) | ApiError::Undefined(code) => Some(*code),
            _ => None,
        }
    }
}

/// Reasons a dictionary fails to convert into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` has the wrong type, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field `{field}` holds malformed date `{value}`")]
    MalformedDate { field: String, value: String },

    /// Free-form rejection raised by an entity's own validation.
    #[error("{0}")]
    Invalid(String),
}

impl From<EntityError> for ApiError {
    fn from(err: EntityError) -> Self {
        ApiError::Parsing(err)
    }
}
