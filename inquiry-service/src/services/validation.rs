//! Validation Gateway.
//!
//! Turns an untyped request body into a [`ValidatedInquiry`] or a
//! [`ValidationErrors`] naming every failing field. Unknown fields, including
//! any client-supplied `timestamp` or `_id`, are ignored.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

use crate::models::Inquiry;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_CONTACT_CHARS: usize = 320;
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Failure codes reported per field.
pub mod codes {
    pub const MISSING: &str = "missing";
    pub const WRONG_TYPE: &str = "wrong_type";
    pub const EMPTY: &str = "empty";
    pub const TOO_LONG: &str = "too_long";
}

/// An [`Inquiry`] that passed validation and carries a server-side timestamp.
/// Only this module can build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedInquiry(Inquiry);

impl ValidatedInquiry {
    pub fn inquiry(&self) -> &Inquiry {
        &self.0
    }

    pub fn into_inner(self) -> Inquiry {
        self.0
    }
}

#[derive(Debug)]
pub enum GatewayError {
    /// The body was not a JSON object at all.
    NotAnObject,
    Invalid(ValidationErrors),
}

impl From<GatewayError> for service_core::error::AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotAnObject => service_core::error::AppError::BadRequest(
                anyhow::anyhow!("Request body must be a JSON object"),
            ),
            GatewayError::Invalid(errors) => errors.into(),
        }
    }
}

pub fn validate(raw: &Value) -> Result<ValidatedInquiry, GatewayError> {
    validate_at(raw, Utc::now())
}

/// Like [`validate`] with an explicit clock. The timestamp is cut to
/// millisecond precision so it survives a BSON round trip unchanged.
pub fn validate_at(raw: &Value, now: DateTime<Utc>) -> Result<ValidatedInquiry, GatewayError> {
    let fields = raw.as_object().ok_or(GatewayError::NotAnObject)?;
    let mut errors = ValidationErrors::new();

    let name = required_text(fields, "name", MAX_NAME_CHARS, &mut errors);
    let contact = required_text(fields, "contact", MAX_CONTACT_CHARS, &mut errors);
    let message = optional_text(fields, "message", MAX_MESSAGE_CHARS, &mut errors);

    match (name, contact, message) {
        (Some(name), Some(contact), Ok(message)) if errors.is_empty() => {
            Ok(ValidatedInquiry(Inquiry {
                id: None,
                name,
                contact,
                message,
                timestamp: now.trunc_subsecs(3),
            }))
        }
        _ => Err(GatewayError::Invalid(errors)),
    }
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn required_text(
    fields: &Map<String, Value>,
    field: &'static str,
    max_chars: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match fields.get(field) {
        None => {
            errors.add(field, field_error(codes::MISSING, format!("{} is required", field)));
            None
        }
        Some(Value::String(s)) => check_text(field, s, max_chars, errors),
        Some(_) => {
            errors.add(
                field,
                field_error(codes::WRONG_TYPE, format!("{} must be a string", field)),
            );
            None
        }
    }
}

/// `Ok(None)` when the field is absent, null or blank.
fn optional_text(
    fields: &Map<String, Value>,
    field: &'static str,
    max_chars: usize,
    errors: &mut ValidationErrors,
) -> Result<Option<String>, ()> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => check_text(field, s, max_chars, errors).map(Some).ok_or(()),
        Some(_) => {
            errors.add(
                field,
                field_error(codes::WRONG_TYPE, format!("{} must be a string", field)),
            );
            Err(())
        }
    }
}

fn check_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, field_error(codes::EMPTY, format!("{} cannot be empty", field)));
        return None;
    }
    if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            field_error(
                codes::TOO_LONG,
                format!("{} must be at most {} characters", field, max_chars),
            ),
        );
        return None;
    }
    Some(trimmed.to_string())
}
