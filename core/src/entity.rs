//! Conversion contract between JSON dictionaries and domain entities.
//!
//! # Design
//! The library never looks inside an entity. It only needs three
//! capabilities: build one from a `Dictionary` (fallible), turn one back into
//! a `Dictionary` (infallible), and expose an identifier that renders into a
//! resource path.
//!
//! The `required_*` helpers cover the common field extraction cases so entity
//! implementations stay a flat list of lookups. Dates use the fixed
//! `YYYY-MM-DD` wire format.

use std::fmt::Display;

use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::error::EntityError;

/// A string-keyed JSON object, the wire shape of a single entity.
pub type Dictionary = serde_json::Map<String, Value>;

/// Wire format for date-only fields.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Entities that can be built from a dictionary.
pub trait FromDictionary: Sized {
    /// Fails if any required field is absent or holds the wrong JSON type.
    fn from_dictionary(dictionary: &Dictionary) -> Result<Self, EntityError>;
}

/// Entities that can be rendered back into a dictionary.
pub trait ToDictionary {
    fn to_dictionary(&self) -> Dictionary;
}

/// Entities addressable by an identifier.
pub trait Identifiable {
    /// Rendered with `Display` into `"{collection}/{id}"` paths.
    type Id: Display + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;
}

fn field<'a>(dictionary: &'a Dictionary, key: &str) -> Result<&'a Value, EntityError> {
    dictionary
        .get(key)
        .ok_or_else(|| EntityError::MissingField(key.to_string()))
}

fn wrong_type(key: &str, expected: &'static str) -> EntityError {
    EntityError::WrongType {
        field: key.to_string(),
        expected,
    }
}

/// Extract a string field.
pub fn required_str(dictionary: &Dictionary, key: &str) -> Result<String, EntityError> {
    field(dictionary, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(key, "string"))
}

/// Extract an integer field.
pub fn required_i64(dictionary: &Dictionary, key: &str) -> Result<i64, EntityError> {
    field(dictionary, key)?
        .as_i64()
        .ok_or_else(|| wrong_type(key, "integer"))
}

/// Extract a boolean field.
pub fn required_bool(dictionary: &Dictionary, key: &str) -> Result<bool, EntityError> {
    field(dictionary, key)?
        .as_bool()
        .ok_or_else(|| wrong_type(key, "boolean"))
}

/// Extract a `YYYY-MM-DD` date field.
pub fn required_date(dictionary: &Dictionary, key: &str) -> Result<Date, EntityError> {
    let raw = required_str(dictionary, key)?;
    Date::parse(&raw, DATE_FORMAT).map_err(|_| EntityError::MalformedDate {
        field: key.to_string(),
        value: raw,
    })
}

/// Render a date in the wire format used by `required_date`.
pub fn date_value(date: Date) -> Value {
    // Formatting a calendar date with a date-only description cannot fail.
    Value::String(date.format(DATE_FORMAT).unwrap_or_default())
}
