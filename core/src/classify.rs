//! Response classification.
//!
//! # Design
//! Turns the `RawResponse` a session reports into either a `Payload` (body
//! plus optional pagination info) or a classified `ApiError`. The decision
//! is a flat table, checked in order:
//!
//! | Input                          | Outcome               |
//! |--------------------------------|-----------------------|
//! | transport error present        | `Other(error)`        |
//! | no HTTP metadata               | `BadResponse`         |
//! | status 200..=299               | success               |
//! | status 404 or 410              | `NotFound`            |
//! | status 500..=599               | `ServerError(status)` |
//! | any other status               | `Undefined(status)`   |
//!
//! Classification is pure. Pagination headers that are missing or not
//! integers simply leave `page_info` empty.

use crate::error::ApiError;
use crate::http::{RawResponse, ResponseHead};
use crate::page::PageInfo;

pub const TOTAL_HEADER: &str = "X-Total";
pub const PER_PAGE_HEADER: &str = "X-Per-Page";
pub const PAGE_HEADER: &str = "X-Page";

/// Successful outcome of a backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub body: Option<Vec<u8>>,
    pub page_info: Option<PageInfo>,
}

/// Strategy that turns a raw response into a payload or an error.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, response: RawResponse) -> Result<Payload, ApiError>;
}

/// The default classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpResponseParser;

impl ResponseParser for HttpResponseParser {
    fn parse(&self, response: RawResponse) -> Result<Payload, ApiError> {
        classify(response)
    }
}

/// Classify a raw response.
pub fn classify(response: RawResponse) -> Result<Payload, ApiError> {
    let RawResponse { body, head, error } = response;
    if let Some(error) = error {
        return Err(ApiError::Other(error));
    }
    let head = head.ok_or(ApiError::BadResponse)?;
    if let Some(error) = error_for_status(head.status) {
        return Err(error);
    }
    Ok(Payload {
        body,
        page_info: page_info(&head),
    })
}

/// Map a status code to its error, or `None` for 2xx.
pub fn error_for_status(status: u16) -> Option<ApiError> {
    match status {
        200..=299 => None,
        404 | 410 => Some(ApiError::NotFound),
        500..=599 => Some(ApiError::ServerError(status)),
        _ => Some(ApiError::Undefined(status)),
    }
}

/// Read pagination headers. All three must be present and numeric.
pub fn page_info(head: &ResponseHead) -> Option<PageInfo> {
    let number = head.header(PAGE_HEADER)?.trim().parse().ok()?;
    let size = head.header(PER_PAGE_HEADER)?.trim().parse().ok()?;
    let total = head.header(TOTAL_HEADER)?.trim().parse().ok()?;
    Some(PageInfo::new(number, size, total))
}
