use std::{borrow::Cow, collections::BTreeMap};

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use super::types::ApiError;

pub const INVALID_BODY: &str = "Invalid request body";

/// Body accepted by create and update.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TodoRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
}

impl TodoRequest {
    /// Empty or truncated input is a body error; anything else that fails is a validation error.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let request: TodoRequest = serde_json::from_slice(body).map_err(|e| {
            if e.is_eof() {
                ApiError::BadRequest(INVALID_BODY.to_string())
            } else {
                ApiError::Validation(BTreeMap::from([("body".to_string(), e.to_string())]))
            }
        })?;
        request.validate()?;
        Ok(request)
    }
}

/// Raw `GET /todo` query string, before any parsing.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Validate)]
pub struct TodoListRequest {
    #[validate(length(max = 100, message = "q must be at most 100 characters"))]
    pub q: String,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, message = "per_page must be at least 1"))]
    pub per_page: Option<i64>,
}

impl TodoListRequest {
    pub fn parse(params: ListParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = parse_number("page", params.page.as_deref(), &mut errors);
        let per_page = parse_number("per_page", params.per_page.as_deref(), &mut errors);
        if !errors.is_empty() { return Err(errors) }

        let request = Self { q: params.q.unwrap_or_default(), page, per_page };
        request.validate()?;
        Ok(request)
    }
}

// Absent and empty both mean "use the default".
fn parse_number(field: &'static str, raw: Option<&str>, errors: &mut ValidationErrors) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            let mut err = ValidationError::new("numeric");
            err.message = Some(Cow::Owned(format!("{field} must be a number")));
            errors.add(field, err);
            None
        }
    }
}

/// Flattens validator output into one message per field.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect()
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self { ApiError::Validation(field_messages(&errors)) }
}
