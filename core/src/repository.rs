//! Repository capabilities over one entity type and one backend.
//!
//! # Design
//! `Repository` ties an entity type to a backend and a collection name.
//! Each capability trait adds one family of operations with a default body,
//! so a concrete repository opts in with an empty `impl`:
//!
//! ```ignore
//! impl Readable for DocumentRepository {}
//! impl Creatable for DocumentRepository {}
//! ```
//!
//! Paths follow one rule: the collection path is `"{name}"`, a resource path
//! is `"{name}/{id}"`. The id is percent-encoded as a single segment, so
//! `/`, `?` and `#` inside an id never change which resource is addressed.
//!
//! Every operation chains backend call → body parsing → entity parsing with
//! `Deferred::and_then`. Single entities are parsed strictly; lists are
//! parsed leniently (elements that fail to parse are dropped). Create and
//! update resolve to the entity echoed back by the server, not the one that
//! was sent.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::backend::Backend;
use crate::deferred::Deferred;
use crate::entity::{FromDictionary, Identifiable, ToDictionary};
use crate::error::ApiError;
use crate::http::{HttpMethod, Parameters};
use crate::page::Page;
use crate::parse;

/// Bytes escaped in an id segment: the URL path set plus `/` and `%`.
const ID_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A named collection of entities reachable through a backend.
pub trait Repository {
    type Entity: Identifiable + FromDictionary + ToDictionary + Send + 'static;
    type Backend: Backend;

    fn backend(&self) -> &Self::Backend;

    /// Collection name, e.g. `"users"`.
    fn name(&self) -> &str;

    /// `"{name}/{id}"` with the id escaped as one path segment.
    fn path_for_id(&self, id: &<Self::Entity as Identifiable>::Id) -> String {
        let id = id.to_string();
        format!("{}/{}", self.name(), utf8_percent_encode(&id, ID_SEGMENT))
    }
}

fn one<E>(
    backend: &impl Backend,
    path: &str,
    method: HttpMethod,
    parameters: Option<Parameters>,
) -> Deferred<E, ApiError>
where
    E: FromDictionary + Send + 'static,
{
    backend
        .future(path, method, parameters)
        .and_then(|payload| parse::dictionary(payload.body))
        .and_then(parse::entity::<E>)
}

fn many<E>(
    backend: &impl Backend,
    path: &str,
    method: HttpMethod,
    parameters: Option<Parameters>,
) -> Deferred<Vec<E>, ApiError>
where
    E: FromDictionary + Send + 'static,
{
    backend
        .future(path, method, parameters)
        .and_then(|payload| parse::dictionaries(payload.body))
        .and_then(parse::entities::<E>)
}

/// Read access.
pub trait Readable: Repository {
    /// The only entity of a singleton resource (`GET name`).
    fn read(&self) -> Deferred<Self::Entity, ApiError> {
        one(self.backend(), self.name(), HttpMethod::Get, None)
    }

    /// Every entity in the collection (`GET name`).
    fn read_all(&self) -> Deferred<Vec<Self::Entity>, ApiError> {
        many(self.backend(), self.name(), HttpMethod::Get, None)
    }

    /// The entity with `id` (`GET name/id`). Watch for `ApiError::NotFound`.
    fn read_by_id(&self, id: &<Self::Entity as Identifiable>::Id) -> Deferred<Self::Entity, ApiError> {
        one(self.backend(), &self.path_for_id(id), HttpMethod::Get, None)
    }

    /// One page of the collection (`GET name?page=N&per_page=S`).
    fn read_page(&self, page: u64, per_page: u64) -> Deferred<Page<Self::Entity>, ApiError> {
        let path = format!("{}?page={page}&per_page={per_page}", self.name());
        self.backend()
            .future(&path, HttpMethod::Get, None)
            .and_then(|payload| {
                let page_info = payload.page_info;
                parse::dictionaries(payload.body).map(move |dictionaries| Page {
                    entities: parse::entities_from_dictionaries(&dictionaries),
                    page_info,
                })
            })
    }
}

/// A readable repository with a fixed page size.
pub trait Paged: Readable {
    fn page_size(&self) -> u64;

    fn read_page_number(&self, page: u64) -> Deferred<Page<Self::Entity>, ApiError> {
        self.read_page(page, self.page_size())
    }
}

/// Create access.
pub trait Creatable: Repository {
    /// `POST name` with the entity's dictionary; resolves to the server's copy.
    fn create(&self, entity: &Self::Entity) -> Deferred<Self::Entity, ApiError> {
        let parameters = Parameters::Object(entity.to_dictionary());
        one(self.backend(), self.name(), HttpMethod::Post, Some(parameters))
    }

    /// `POST name` with an array of dictionaries.
    fn create_all(&self, entities: &[Self::Entity]) -> Deferred<Vec<Self::Entity>, ApiError> {
        let parameters = Parameters::Array(entities.iter().map(ToDictionary::to_dictionary).collect());
        many(self.backend(), self.name(), HttpMethod::Post, Some(parameters))
    }
}

/// Update access.
pub trait Updatable: Repository {
    /// `PUT name/{entity.id}`; resolves to the server's copy.
    fn update(&self, entity: &Self::Entity) -> Deferred<Self::Entity, ApiError> {
        self.update_by_id(entity, entity.id())
    }

    /// `PUT name/{id}` with an explicitly given id.
    fn update_by_id(
        &self,
        entity: &Self::Entity,
        id: &<Self::Entity as Identifiable>::Id,
    ) -> Deferred<Self::Entity, ApiError> {
        let parameters = Parameters::Object(entity.to_dictionary());
        one(self.backend(), &self.path_for_id(id), HttpMethod::Put, Some(parameters))
    }

    /// `PATCH name` with an array of dictionaries.
    fn update_all(&self, entities: &[Self::Entity]) -> Deferred<Vec<Self::Entity>, ApiError> {
        let parameters = Parameters::Array(entities.iter().map(ToDictionary::to_dictionary).collect());
        many(self.backend(), self.name(), HttpMethod::Patch, Some(parameters))
    }
}

/// Delete access. The response body is ignored.
pub trait Deletable: Repository {
    /// `DELETE name/{entity.id}`.
    fn delete(&self, entity: &Self::Entity) -> Deferred<(), ApiError> {
        self.delete_by_id(entity.id())
    }

    /// `DELETE name/{id}`.
    fn delete_by_id(&self, id: &<Self::Entity as Identifiable>::Id) -> Deferred<(), ApiError> {
        self.backend()
            .future(&self.path_for_id(id), HttpMethod::Delete, None)
            .map(|_| ())
    }

    /// `DELETE name`, for singleton resources.
    fn delete_singleton(&self) -> Deferred<(), ApiError> {
        self.backend()
            .future(self.name(), HttpMethod::Delete, None)
            .map(|_| ())
    }
}
