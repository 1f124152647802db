//! Body and entity parsing steps.
//!
//! # Design
//! Two stages sit between a successful `Payload` and the caller's entities:
//!
//! 1. body → dictionary (or list of dictionaries). An absent body, invalid
//!    JSON or the wrong JSON shape is a `BadResponse`.
//! 2. dictionary → entity. A single entity is strict: any field failure is a
//!    `Parsing` error. A collection is lenient: elements that fail to parse
//!    are dropped and the rest are returned in their original order.
//!
//! Each stage has a plain function and a `Deferred` wrapper so repository
//! pipelines can chain them with `and_then`.

use serde_json::Value;

use crate::deferred::Deferred;
use crate::entity::{Dictionary, FromDictionary};
use crate::error::ApiError;

fn json_from_body(body: Option<&[u8]>) -> Result<Value, ApiError> {
    let bytes = body.ok_or(ApiError::BadResponse)?;
    serde_json::from_slice(bytes).map_err(|_| ApiError::BadResponse)
}

/// Parse a body holding a single JSON object.
pub fn dictionary_from_body(body: Option<&[u8]>) -> Result<Dictionary, ApiError> {
    match json_from_body(body)? {
        Value::Object(object) => Ok(object),
        _ => Err(ApiError::BadResponse),
    }
}

/// Parse a body holding a JSON array of objects.
pub fn dictionaries_from_body(body: Option<&[u8]>) -> Result<Vec<Dictionary>, ApiError> {
    let Value::Array(items) = json_from_body(body)? else {
        return Err(ApiError::BadResponse);
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(object) => Ok(object),
            _ => Err(ApiError::BadResponse),
        })
        .collect()
}

/// Build one entity, failing on any field error.
pub fn entity_from_dictionary<E: FromDictionary>(dictionary: &Dictionary) -> Result<E, ApiError> {
    E::from_dictionary(dictionary).map_err(ApiError::Parsing)
}

/// Build every entity that parses, silently skipping the rest.
pub fn entities_from_dictionaries<E: FromDictionary>(dictionaries: &[Dictionary]) -> Vec<E> {
    dictionaries
        .iter()
        .filter_map(|dictionary| match E::from_dictionary(dictionary) {
            Ok(entity) => Some(entity),
            Err(err) => {
                log::debug!(target: "restrepo", "skipping unparsable element: {err}");
                None
            }
        })
        .collect()
}

/// `Deferred` form of `dictionary_from_body`.
pub fn dictionary(body: Option<Vec<u8>>) -> Deferred<Dictionary, ApiError> {
    Deferred::new(move |completion| completion(dictionary_from_body(body.as_deref())))
}

/// `Deferred` form of `dictionaries_from_body`.
pub fn dictionaries(body: Option<Vec<u8>>) -> Deferred<Vec<Dictionary>, ApiError> {
    Deferred::new(move |completion| completion(dictionaries_from_body(body.as_deref())))
}

/// `Deferred` form of `entity_from_dictionary`.
pub fn entity<E>(dictionary: Dictionary) -> Deferred<E, ApiError>
where
    E: FromDictionary + 'static,
{
    Deferred::new(move |completion| completion(entity_from_dictionary(&dictionary)))
}

/// `Deferred` form of `entities_from_dictionaries`.
pub fn entities<E>(dictionaries: Vec<Dictionary>) -> Deferred<Vec<E>, ApiError>
where
    E: FromDictionary + 'static,
{
    Deferred::new(move |completion| completion(Ok(entities_from_dictionaries(&dictionaries))))
}
