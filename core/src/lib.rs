//! Generic repository layer for JSON REST backends.
//!
//! # Overview
//! Application code declares entity types (via `FromDictionary`,
//! `ToDictionary` and `Identifiable`) and repositories naming a collection
//! path. The capability traits in `repository` turn those into typed CRUD and
//! pagination operations against any `Backend`.
//!
//! Every operation returns a `Deferred`: a lazily started, callback-driven
//! computation. Starting it issues the HTTP call on a worker thread and
//! delivers exactly one `Result<_, ApiError>` to the completion callback.
//!
//! # Design
//! - `HttpBackend` resolves paths against `BackendConfig::base_url`, sends
//!   through an `HttpSession` and classifies the answer with a
//!   `ResponseParser`. Both seams can be swapped, which is how the tests run
//!   without a network.
//! - Classification is a flat status table (see `classify`); pagination
//!   metadata comes from `X-Total` / `X-Per-Page` / `X-Page`.
//! - Single entities parse strictly, collections leniently.
//! - `RequestLogger` numbers requests and writes one line per request and
//!   response through the `log` facade.

pub mod backend;
pub mod classify;
pub mod config;
pub mod deferred;
pub mod entity;
pub mod error;
pub mod http;
pub mod logger;
pub mod page;
pub mod parse;
pub mod repository;

pub use backend::{Backend, HttpBackend, HttpSession, SessionCompletion, UreqSession};
pub use classify::{HttpResponseParser, Payload, ResponseParser};
pub use config::{BackendConfig, ConfigError};
pub use deferred::{Completion, Deferred};
pub use entity::{Dictionary, FromDictionary, Identifiable, ToDictionary};
pub use error::{ApiError, EntityError, TransportError};
pub use http::{HttpHeader, HttpMethod, HttpRequest, Parameters, RawResponse, ResponseHead};
pub use logger::RequestLogger;
pub use page::{Page, PageInfo};
pub use repository::{Creatable, Deletable, Paged, Readable, Repository, Updatable};
