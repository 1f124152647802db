//! Backends: turn `(path, method, parameters)` into a classified `Deferred`.
//!
//! # Design
//! `Backend` is the seam repositories are written against. `HttpBackend` is
//! the real implementation and is split in three collaborators:
//!
//! - request building (`HttpBackend::build_request`): resolve the path
//!   against the configured base URL, attach the configured headers and
//!   serialize parameters. Any failure here is `BadRequest` and nothing is
//!   sent.
//! - an `HttpSession` that performs the round trip and reports a
//!   `RawResponse` through a callback. `UreqSession` runs each request on its
//!   own thread so `start` never blocks the caller.
//! - a `ResponseParser` that classifies the `RawResponse`.
//!
//! Each `start` of the returned `Deferred` builds and sends the request
//! again; the backend holds no per-request state besides the logger's
//! counter.

use std::sync::Arc;
use std::thread;

use url::Url;

use crate::classify::{HttpResponseParser, Payload, ResponseParser};
use crate::config::BackendConfig;
use crate::deferred::{Completion, Deferred};
use crate::error::ApiError;
use crate::http::{HttpHeader, HttpMethod, HttpRequest, Parameters, RawResponse, ResponseHead};
use crate::logger::RequestLogger;

/// Issues one call against a resource path and classifies the outcome.
pub trait Backend: Send + Sync {
    fn future(
        &self,
        path: &str,
        method: HttpMethod,
        parameters: Option<Parameters>,
    ) -> Deferred<Payload, ApiError>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn future(
        &self,
        path: &str,
        method: HttpMethod,
        parameters: Option<Parameters>,
    ) -> Deferred<Payload, ApiError> {
        (**self).future(path, method, parameters)
    }
}

/// Callback receiving the raw outcome of one round trip.
pub type SessionCompletion = Box<dyn FnOnce(RawResponse) + Send>;

/// Performs HTTP round trips.
pub trait HttpSession: Send + Sync {
    /// Send `request` and call `completion` exactly once with what came back.
    fn execute(&self, request: HttpRequest, completion: SessionCompletion);
}

/// `HttpSession` backed by a `ureq` agent, one thread per request.
#[derive(Clone)]
pub struct UreqSession {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqSession {
    pub fn new(config: &BackendConfig) -> Self {
        // Status codes are classified by the response parser, not by ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: config.max_response_bytes.unwrap_or(u64::MAX),
        }
    }

    /// Session over a caller-built agent. Response bodies are read whole.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for UreqSession {
    fn default() -> Self {
        Self::new(&BackendConfig::default())
    }
}

impl HttpSession for UreqSession {
    fn execute(&self, request: HttpRequest, completion: SessionCompletion) {
        let agent = self.agent.clone();
        let body_limit = self.body_limit;
        thread::spawn(move || completion(perform(&agent, body_limit, request)));
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[HttpHeader]) -> ureq::RequestBuilder<B> {
    for header in headers {
        builder = builder.header(header.field.as_str(), header.value.as_str());
    }
    builder
}

fn perform(agent: &ureq::Agent, body_limit: u64, request: HttpRequest) -> RawResponse {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;
    let url = url.as_str();
    let sent = match (method, body) {
        (HttpMethod::Get, None) => with_headers(agent.get(url), &headers).call(),
        (HttpMethod::Get, Some(body)) => with_headers(agent.get(url), &headers)
            .force_send_body()
            .send(body.as_slice()),
        (HttpMethod::Delete, None) => with_headers(agent.delete(url), &headers).call(),
        (HttpMethod::Delete, Some(body)) => with_headers(agent.delete(url), &headers)
            .force_send_body()
            .send(body.as_slice()),
        (HttpMethod::Post, body) => send(with_headers(agent.post(url), &headers), body),
        (HttpMethod::Put, body) => send(with_headers(agent.put(url), &headers), body),
        (HttpMethod::Patch, body) => send(with_headers(agent.patch(url), &headers), body),
    };

    let mut response = match sent {
        Ok(response) => response,
        Err(err) => return RawResponse::failed(err),
    };
    let head = ResponseHead {
        status: response.status().as_u16(),
        headers: response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect(),
    };
    match response.body_mut().with_config().limit(body_limit).read_to_vec() {
        Ok(body) => RawResponse::received(head, body),
        // The server answered; only the body is unusable.
        Err(ureq::Error::BodyExceedsLimit(limit)) => {
            log::warn!(target: "restrepo", "response body from {url} exceeds {limit} bytes, dropped");
            RawResponse {
                body: None,
                head: Some(head),
                error: None,
            }
        }
        Err(err) => RawResponse {
            body: None,
            head: Some(head),
            error: Some(Box::new(err)),
        },
    }
}

fn send(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_slice()),
        None => builder.send_empty(),
    }
}

/// `Backend` that talks to a JSON REST server over HTTP.
pub struct HttpBackend<S = UreqSession> {
    config: Arc<BackendConfig>,
    session: Arc<S>,
    parser: Arc<dyn ResponseParser>,
    logger: Arc<RequestLogger>,
}

impl<S> Clone for HttpBackend<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            session: Arc::clone(&self.session),
            parser: Arc::clone(&self.parser),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl HttpBackend<UreqSession> {
    /// Backend using `ureq`, the default classifier and a `log`-backed logger.
    pub fn new(config: BackendConfig) -> Self {
        let session = UreqSession::new(&config);
        Self::with_session(config, session)
    }
}

impl Default for HttpBackend<UreqSession> {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl<S: HttpSession + 'static> HttpBackend<S> {
    pub fn with_session(config: BackendConfig, session: S) -> Self {
        let logger = Arc::new(RequestLogger::new(config.log_requests));
        Self {
            config: Arc::new(config),
            session: Arc::new(session),
            parser: Arc::new(HttpResponseParser),
            logger,
        }
    }

    /// Replace the response classifier.
    pub fn with_parser(mut self, parser: impl ResponseParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Share an externally owned logger.
    pub fn with_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<RequestLogger> {
        &self.logger
    }

    /// Resolve `path` against the base URL. The base is treated as a
    /// directory, so `http://host/api` + `users` is `http://host/api/users`.
    pub fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        let mut base = Url::parse(&self.config.base_url)
            .map_err(|err| ApiError::BadRequest(format!("invalid base URL `{}`: {err}", self.config.base_url)))?;
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        base.join(path)
            .map_err(|err| ApiError::BadRequest(format!("invalid path `{path}`: {err}")))
    }

    /// Build the request for one call without sending it.
    pub fn build_request(
        &self,
        path: &str,
        method: HttpMethod,
        parameters: Option<&Parameters>,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.url_for(path)?;
        let body = parameters
            .map(Parameters::to_json)
            .transpose()
            .map_err(|err| ApiError::BadRequest(format!("parameters are not serializable: {err}")))?;
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: self.config.headers.clone(),
            body,
        })
    }
}

impl<S: HttpSession + 'static> Backend for HttpBackend<S> {
    fn future(
        &self,
        path: &str,
        method: HttpMethod,
        parameters: Option<Parameters>,
    ) -> Deferred<Payload, ApiError> {
        let backend = self.clone();
        let path = path.to_string();
        Deferred::new(move |completion: Completion<Payload, ApiError>| {
            let request = match backend.build_request(&path, method, parameters.as_ref()) {
                Ok(request) => request,
                Err(err) => return completion(Err(err)),
            };
            let number = backend.logger.request(method, &request.url);
            let parser = Arc::clone(&backend.parser);
            let logger = Arc::clone(&backend.logger);
            backend.session.execute(
                request,
                Box::new(move |response: RawResponse| {
                    let result = parser.parse(response);
                    logger.response(number, &result);
                    completion(result);
                }),
            );
        })
    }
}
