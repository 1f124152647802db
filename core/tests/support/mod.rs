//! Shared fixtures for the integration tests: sample entities and
//! repositories, a backend that records calls, and a scripted HTTP session.

#![allow(dead_code)]

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use restrepo_core::entity::{date_value, required_bool, required_date, required_str};
use restrepo_core::{
    ApiError, Backend, Creatable, Deferred, Deletable, Dictionary, EntityError, FromDictionary, HttpMethod,
    HttpRequest, HttpSession, Identifiable, Paged, Parameters, Payload, RawResponse, Readable, Repository,
    SessionCompletion, ToDictionary, Updatable,
};
use serde_json::{json, Value};
use time::Date;
use uuid::Uuid;

/// Start `deferred` and wait for its single outcome.
pub fn outcome<T: Send + 'static, E: Send + 'static>(deferred: &Deferred<T, E>) -> Result<T, E> {
    let (tx, rx) = mpsc::channel();
    deferred.start(move |result| {
        let _ = tx.send(result);
    });
    rx.recv_timeout(Duration::from_secs(10)).expect("deferred never completed")
}

pub fn object(value: Value) -> Dictionary {
    value.as_object().cloned().expect("expected a JSON object")
}

// --- entities ---

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub name: String,
}

impl Document {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl FromDictionary for Document {
    fn from_dictionary(d: &Dictionary) -> Result<Self, EntityError> {
        Ok(Self {
            id: required_str(d, "id")?,
            name: required_str(d, "name")?,
        })
    }
}

impl ToDictionary for Document {
    fn to_dictionary(&self) -> Dictionary {
        let mut d = Dictionary::new();
        d.insert("id".into(), json!(self.id));
        d.insert("name".into(), json!(self.name));
        d
    }
}

impl Identifiable for Document {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

/// A UUID-keyed entity with a date field.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub due: Date,
}

impl FromDictionary for Task {
    fn from_dictionary(d: &Dictionary) -> Result<Self, EntityError> {
        let raw_id = required_str(d, "id")?;
        let id = Uuid::parse_str(&raw_id).map_err(|_| EntityError::Invalid(format!("`{raw_id}` is not a UUID")))?;
        Ok(Self {
            id,
            title: required_str(d, "title")?,
            done: required_bool(d, "done")?,
            due: required_date(d, "due")?,
        })
    }
}

impl ToDictionary for Task {
    fn to_dictionary(&self) -> Dictionary {
        let mut d = Dictionary::new();
        d.insert("id".into(), json!(self.id.to_string()));
        d.insert("title".into(), json!(self.title));
        d.insert("done".into(), json!(self.done));
        d.insert("due".into(), date_value(self.due));
        d
    }
}

impl Identifiable for Task {
    type Id = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }
}

// --- repositories ---

pub struct Documents<B> {
    backend: B,
    name: String,
    page_size: u64,
}

impl<B: Backend> Documents<B> {
    pub fn new(backend: B, name: &str) -> Self {
        Self {
            backend,
            name: name.to_string(),
            page_size: 20,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

impl<B: Backend> Repository for Documents<B> {
    type Entity = Document;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<B: Backend> Readable for Documents<B> {}
impl<B: Backend> Creatable for Documents<B> {}
impl<B: Backend> Updatable for Documents<B> {}
impl<B: Backend> Deletable for Documents<B> {}

impl<B: Backend> Paged for Documents<B> {
    fn page_size(&self) -> u64 {
        self.page_size
    }
}

pub struct Tasks<B> {
    backend: B,
}

impl<B: Backend> Tasks<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: Backend> Repository for Tasks<B> {
    type Entity = Task;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn name(&self) -> &str {
        "tasks"
    }
}

impl<B: Backend> Readable for Tasks<B> {}
impl<B: Backend> Creatable for Tasks<B> {}
impl<B: Backend> Updatable for Tasks<B> {}
impl<B: Backend> Deletable for Tasks<B> {}

// --- recording backend ---

/// One call received by `RecordingBackend`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub method: HttpMethod,
    pub parameters: Option<Parameters>,
}

type Responder = dyn Fn(&Call) -> Result<Payload, ApiError> + Send + Sync;

/// `Backend` that records every started call and answers from a closure.
#[derive(Clone)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    responder: Arc<Responder>,
}

impl RecordingBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Call) -> Result<Payload, ApiError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Answer every call with `body` serialized as JSON.
    pub fn replying(body: Value) -> Self {
        Self::new(move |_| {
            Ok(Payload {
                body: Some(body.to_string().into_bytes()),
                page_info: None,
            })
        })
    }

    /// Answer every call with an empty successful payload.
    pub fn empty() -> Self {
        Self::new(|_| Ok(Payload::default()))
    }

    /// Fail every call with the error built by `error`.
    pub fn failing(error: fn() -> ApiError) -> Self {
        Self::new(move |_| Err(error()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no call recorded")
    }
}

impl Backend for RecordingBackend {
    fn future(&self, path: &str, method: HttpMethod, parameters: Option<Parameters>) -> Deferred<Payload, ApiError> {
        let calls = Arc::clone(&self.calls);
        let responder = Arc::clone(&self.responder);
        let path = path.to_string();
        Deferred::new(move |completion| {
            let call = Call {
                path: path.clone(),
                method,
                parameters: parameters.clone(),
            };
            let result = responder(&call);
            calls.lock().unwrap().push(call);
            completion(result);
        })
    }
}

// --- scripted session ---

type Script = dyn Fn(&HttpRequest) -> RawResponse + Send + Sync;

/// `HttpSession` that never touches the network: it keeps each request and
/// answers synchronously with whatever the script builds.
#[derive(Clone)]
pub struct FakeSession {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    script: Arc<Script>,
}

impl FakeSession {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&HttpRequest) -> RawResponse + Send + Sync + 'static,
    {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(script),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpSession for FakeSession {
    fn execute(&self, request: HttpRequest, completion: SessionCompletion) {
        let response = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        completion(response);
    }
}
