//! Request DTO validation.
//!
//! DTOs derive [`validator::Validate`]; failures are converted to
//! [`CoreError::InvalidFields`] so every field error renders as
//! `{ "fields": { "<name>": ["<message>", ...] } }` with status 422.

use storefront_core::error::{CoreError, FieldErrors};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// Validate `input`, merging `extra` checks the derive cannot express.
pub fn validate_with<T: Validate>(input: &T, extra: FieldErrors) -> Result<(), AppError> {
    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => field_errors(&e),
    };
    for (field, messages) in extra {
        errors.entry(field).or_default().extend(messages);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::InvalidFields(errors)))
    }
}

/// Validate `input` with its derived rules only.
pub fn validate<T: Validate>(input: &T) -> Result<(), AppError> {
    validate_with(input, FieldErrors::new())
}

/// Flatten validator output into per-field messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let field = field.to_string();
        let messages = errs.iter().map(|e| message_for(&field, e)).collect::<Vec<_>>();
        out.entry(field).or_default().extend(messages);
    }
    out
}

fn message_for(field: &str, err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let param = |name: &str| err.params.get(name).map(|v| v.to_string());
    match err.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("The {field} must be between {min} and {max} characters.")
            }
            (Some(min), None) if min == "1" => format!("The {field} field is required."),
            (Some(min), None) => format!("The {field} must be at least {min} characters."),
            (None, Some(max)) => format!("The {field} may not be greater than {max} characters."),
            (None, None) => format!("The {field} has an invalid length."),
        },
        "range" => match param("min") {
            Some(min) => format!("The {field} must be at least {min}."),
            None => format!("The {field} is out of range."),
        },
        "email" => format!("The {field} must be a valid email address."),
        _ => format!("The {field} field is invalid."),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5))]
        name: String,
        #[validate(email)]
        email: String,
        #[validate(range(min = 0))]
        count: i32,
    }

    #[test]
    fn test_valid_input_passes() {
        let ok = Sample {
            name: "abc".into(),
            email: "a@example.com".into(),
            count: 0,
        };
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn test_every_failing_field_is_reported() {
        let bad = Sample {
            name: "".into(),
            email: "nope".into(),
            count: -1,
        };
        let err = validate(&bad).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::InvalidFields(fields)) => {
            assert_eq!(
                fields.keys().cloned().collect::<Vec<_>>(),
                vec!["count", "email", "name"]
            );
            assert_eq!(fields["email"], vec!["The email must be a valid email address."]);
            assert!(fields["count"][0].starts_with("The count must be at least"));
        });
    }

    #[test]
    fn test_extra_errors_are_merged() {
        let ok = Sample {
            name: "abc".into(),
            email: "a@example.com".into(),
            count: 1,
        };
        let mut extra = FieldErrors::new();
        extra.insert("price".into(), vec!["The price must be at least 0.".into()]);
        let err = validate_with(&ok, extra).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::InvalidFields(fields)) => {
            assert!(fields.contains_key("price"));
        });
    }
}
