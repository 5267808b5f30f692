//! Book record and validation of incoming records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog entry. JSON keys mirror the field names on disk and on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "imageLink")]
    pub image_link: Option<String>,
}

impl Book {
    /// A record with only the required title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            pages: None,
            country: None,
            language: None,
            year: None,
            link: None,
            image_link: None,
        }
    }
}

/// A field-level problem with a submitted record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Offending field, or empty when the whole body is wrong.
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Text,
    Integer,
}

const OPTIONAL_FIELDS: [(&str, Kind); 7] = [
    ("author", Kind::Text),
    ("pages", Kind::Integer),
    ("country", Kind::Text),
    ("language", Kind::Text),
    ("year", Kind::Integer),
    ("link", Kind::Text),
    ("imageLink", Kind::Text),
];

/// Validate a submitted JSON body and turn it into a [`Book`].
///
/// `title` must be a string; the other known fields may be absent or null.
/// Unknown keys are ignored.
pub fn parse_new_book(payload: Value) -> Result<Book, FieldError> {
    let object = match payload {
        Value::Object(map) => map,
        _ => return Err(FieldError::new("", "body must be a JSON object")),
    };

    match object.get("title") {
        Some(Value::String(_)) => {}
        None | Some(Value::Null) => return Err(FieldError::new("title", "field required")),
        Some(_) => return Err(FieldError::new("title", "str type expected")),
    }

    for (name, kind) in OPTIONAL_FIELDS {
        check_optional(&object, name, kind)?;
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| FieldError::new("", e.to_string()))
}

fn check_optional(object: &Map<String, Value>, name: &str, kind: Kind) -> Result<(), FieldError> {
    let ok = match (object.get(name), kind) {
        (None | Some(Value::Null), _) => true,
        (Some(Value::String(_)), Kind::Text) => true,
        (Some(value), Kind::Integer) => value.as_i64().is_some(),
        _ => false,
    };
    if ok {
        return Ok(());
    }
    let message = match kind {
        Kind::Text => "str type expected",
        Kind::Integer => "value is not a valid integer",
    };
    Err(FieldError::new(name, message))
}
