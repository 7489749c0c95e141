//! Request validation producing field-level error messages.

use crate::i18n::Locale;
use crate::models::{NewPost, PostChanges};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// Maximum length of a post title, in characters
pub const TITLE_MAX_CHARS: u64 = 255;

/// Body fields accepted on create and update
const POST_FIELDS: [&str; 2] = ["title", "content"];

/// Field name → messages, serialized as `{"title": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors for a single field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            for error in list {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field));
                fields.add(&field, message);
            }
        }
        fields
    }
}

/// Body of `POST /v1/posts`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(
        required(message = "The title field is required."),
        length(
            min = 1,
            max = 255,
            message = "The title field must be between 1 and 255 characters."
        )
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "The content field is required."),
        length(min = 1, message = "The content field must not be empty.")
    )]
    pub content: Option<String>,
}

/// Body of `PUT|PATCH /v1/posts/{id}`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "The title field must be between 1 and 255 characters."
    ))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "The content field must not be empty."))]
    pub content: Option<String>,
}

/// Validate a create request: `title` (≤255 chars) and `content` both required.
pub fn validate_new_post(body: Value) -> Result<NewPost, FieldErrors> {
    let mut request: CreatePostRequest = decode(body, FieldErrors::new())?;
    request.title = trimmed(request.title);
    request.content = trimmed(request.content);
    request.validate()?;

    match (request.title, request.content) {
        (Some(title), Some(content)) => Ok(NewPost { title, content }),
        _ => Err(FieldErrors::single("body", "The title and content fields are required.")),
    }
}

/// Validate an update request: `title` and `content` are optional, but must be
/// non-empty strings when present.
pub fn validate_post_changes(body: Value) -> Result<PostChanges, FieldErrors> {
    // An explicit null is a value that fails validation, not an omitted field
    let mut errors = FieldErrors::new();
    if let Value::Object(object) = &body {
        for field in POST_FIELDS {
            if object.get(field) == Some(&Value::Null) {
                errors.add(field, format!("The {} field must not be empty.", field));
            }
        }
    }

    let mut request: UpdatePostRequest = decode(body, errors)?;
    request.title = trimmed(request.title);
    request.content = trimmed(request.content);
    request.validate()?;

    Ok(PostChanges {
        title: request.title,
        content: request.content,
    })
}

/// Validate a required locale parameter against the supported set.
pub fn required_locale(field: &str, value: Option<&str>) -> Result<Locale, FieldErrors> {
    match value.map(str::trim) {
        None | Some("") => Err(FieldErrors::single(
            field,
            format!("The {} field is required.", field),
        )),
        Some(code) => code
            .parse()
            .map_err(|_| FieldErrors::single(field, format!("The selected {} is invalid.", field))),
    }
}

/// Validate an optional locale parameter, defaulting to the canonical locale.
pub fn locale_or_default(field: &str, value: Option<&str>) -> Result<Locale, FieldErrors> {
    match value.map(str::trim) {
        None | Some("") => Ok(Locale::canonical()),
        Some(code) => required_locale(field, Some(code)),
    }
}

/// Deserialize a post body, reporting wrong JSON types per field.
///
/// `errors` carries problems already found by the caller; they are returned
/// together with any type errors.
fn decode<T: DeserializeOwned>(body: Value, mut errors: FieldErrors) -> Result<T, FieldErrors> {
    let Value::Object(object) = body else {
        return Err(FieldErrors::single(
            "body",
            "The request body must be a JSON object.",
        ));
    };

    for field in POST_FIELDS {
        if let Some(value) = object.get(field) {
            if Option::<String>::deserialize(value).is_err() {
                errors.add(field, format!("The {} field must be a string.", field));
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| FieldErrors::single("body", e.to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}
