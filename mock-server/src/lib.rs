//! In-memory JSON REST server used by the end-to-end tests.
//!
//! Collections are schema-free: any path segment names a collection of JSON
//! objects, created on first write. Documents are identified by their `id`
//! field, which the server fills with a v4 UUID when a create omits it.
//!
//! | Route                      | Behavior                                         |
//! |----------------------------|--------------------------------------------------|
//! | `GET /{collection}`        | list; paged with `?page&per_page`                |
//! | `POST /{collection}`       | create one (object) or many (array), 201         |
//! | `PATCH /{collection}`      | merge each array element into the stored doc     |
//! | `GET /{collection}/{id}`   | fetch, 404 when absent                           |
//! | `PUT /{collection}/{id}`   | replace, 404 when absent                         |
//! | `DELETE /{collection}/{id}`| 204, 404 when absent                             |
//! | `GET/DELETE /settings`     | singleton resource                               |
//! | `ANY /status/{code}`       | empty response with that status                  |

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TOTAL_HEADER: &str = "x-total";
pub const PER_PAGE_HEADER: &str = "x-per-page";
pub const PAGE_HEADER: &str = "x-page";

pub type Document = Map<String, Value>;

#[derive(Debug)]
pub struct Store {
    collections: HashMap<String, Vec<Document>>,
    settings: Option<Document>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            collections: HashMap::new(),
            settings: Some(default_settings()),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Initial content of the `/settings` singleton.
pub fn default_settings() -> Document {
    let mut settings = Document::new();
    settings.insert("id".into(), json!("settings"));
    settings.insert("name".into(), json!("default"));
    settings
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/settings", get(read_settings).delete(delete_settings))
        .route("/status/{code}", any(status))
        .route(
            "/{collection}",
            get(list_documents).post(create_documents).patch(update_documents),
        )
        .route(
            "/{collection}/{id}",
            get(get_document).put(replace_document).delete(delete_document),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// `HOST:PORT` to listen on, defaulting to `127.0.0.1:3000`.
pub fn bind_address(lookup: impl Fn(&str) -> Option<String>) -> String {
    let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
    format!("{host}:{port}")
}

/// The `id` of a document rendered as a path segment.
pub fn id_of(document: &Document) -> Option<String> {
    match document.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn with_id(mut document: Document) -> Document {
    if id_of(&document).is_none() {
        document.insert("id".into(), json!(Uuid::new_v4().to_string()));
    }
    document
}

async fn list_documents(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(paging): Query<Paging>,
) -> Response {
    let store = db.read().await;
    let documents = store.collections.get(&collection).map(Vec::as_slice).unwrap_or_default();

    let (Some(page), Some(per_page)) = (paging.page, paging.per_page) else {
        return Json(documents.to_vec()).into_response();
    };
    let page = page.max(1);
    let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
    let take = usize::try_from(per_page).unwrap_or(usize::MAX);
    let slice: Vec<Document> = documents.iter().skip(skip).take(take).cloned().collect();
    (
        [
            (TOTAL_HEADER, documents.len().to_string()),
            (PER_PAGE_HEADER, per_page.to_string()),
            (PAGE_HEADER, page.to_string()),
        ],
        Json(slice),
    )
        .into_response()
}

async fn create_documents(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(input): Json<Value>,
) -> Response {
    let mut store = db.write().await;
    let documents = store.collections.entry(collection).or_default();
    match input {
        Value::Object(document) => {
            let document = with_id(document);
            documents.push(document.clone());
            (StatusCode::CREATED, Json(Value::Object(document))).into_response()
        }
        Value::Array(items) => {
            let mut created = Vec::with_capacity(items.len());
            for item in items {
                let Value::Object(document) = item else {
                    return StatusCode::UNPROCESSABLE_ENTITY.into_response();
                };
                created.push(with_id(document));
            }
            documents.extend(created.iter().cloned());
            (StatusCode::CREATED, Json(created)).into_response()
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    }
}

async fn update_documents(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(input): Json<Vec<Document>>,
) -> Json<Vec<Document>> {
    let mut store = db.write().await;
    let documents = store.collections.entry(collection).or_default();
    let mut updated = Vec::new();
    for patch in input {
        let Some(id) = id_of(&patch) else { continue };
        if let Some(stored) = documents.iter_mut().find(|d| id_of(d).as_deref() == Some(id.as_str())) {
            stored.extend(patch);
            updated.push(stored.clone());
        }
    }
    Json(updated)
}

async fn get_document(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, StatusCode> {
    let store = db.read().await;
    store
        .collections
        .get(&collection)
        .and_then(|documents| documents.iter().find(|d| id_of(d).as_deref() == Some(id.as_str())))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_document(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    Json(mut input): Json<Document>,
) -> Result<Json<Document>, StatusCode> {
    let mut store = db.write().await;
    let stored = store
        .collections
        .get_mut(&collection)
        .and_then(|documents| documents.iter_mut().find(|d| id_of(d).as_deref() == Some(id.as_str())))
        .ok_or(StatusCode::NOT_FOUND)?;
    // The path id wins over whatever the body carries.
    if let Some(original) = stored.get("id").cloned() {
        input.insert("id".into(), original);
    }
    *stored = input;
    Ok(Json(stored.clone()))
}

async fn delete_document(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
) -> StatusCode {
    let mut store = db.write().await;
    let Some(documents) = store.collections.get_mut(&collection) else {
        return StatusCode::NOT_FOUND;
    };
    match documents.iter().position(|d| id_of(d).as_deref() == Some(id.as_str())) {
        Some(index) => {
            documents.remove(index);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn read_settings(State(db): State<Db>) -> Result<Json<Document>, StatusCode> {
    db.read().await.settings.clone().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_settings(State(db): State<Db>) -> StatusCode {
    match db.write().await.settings.take() {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::GONE,
    }
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}
