//! Request validation
//!
//! Pure functions that turn raw request payloads into typed, normalised
//! values before they reach the credential authority or the task service.

use serde::Serialize;
use thiserror::Error;

use crate::auth::models::{Credentials, LoginRequest, RegisterRequest};
use crate::database::models::{CreateTaskRequest, NewTask, TaskChanges, UpdateTaskRequest};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
const EMAIL_MAX_CHARS: usize = 254;

/// One rejected field
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Error)]
#[error("request validation failed")]
pub struct ValidationError {
    pub details: Vec<FieldError>,
}

impl ValidationError {
    /// The request body itself could not be parsed.
    pub fn body(msg: impl Into<String>) -> Self {
        Self {
            details: vec![FieldError {
                loc: vec!["body".to_string()],
                msg: msg.into(),
                kind: "parse_error".to_string(),
            }],
        }
    }

    /// A path parameter could not be parsed, e.g. a malformed id.
    pub fn path(key: Option<String>, msg: impl Into<String>) -> Self {
        let mut loc = vec!["path".to_string()];
        loc.extend(key);
        Self {
            details: vec![FieldError {
                loc,
                msg: msg.into(),
                kind: "parse_error".to_string(),
            }],
        }
    }
}

/// Collects field errors so a single response can report all of them.
#[derive(Default)]
struct Errors(Vec<FieldError>);

impl Errors {
    fn push(&mut self, field: &str, kind: &str, msg: impl Into<String>) {
        self.0.push(FieldError {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        });
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { details: self.0 })
        }
    }
}

pub fn validate_register(req: RegisterRequest) -> Result<Credentials, ValidationError> {
    validate_credentials(req.email, req.password)
}

pub fn validate_login(req: LoginRequest) -> Result<Credentials, ValidationError> {
    validate_credentials(req.email, req.password)
}

/// Normalises the email and checks its shape. Password strength is the
/// authority's concern, so only presence is checked here.
fn validate_credentials(email: String, password: String) -> Result<Credentials, ValidationError> {
    let mut errors = Errors::default();
    let email = normalize_email(&email);

    if email.chars().count() > EMAIL_MAX_CHARS {
        errors.push("email", "string_too_long", "email is too long");
    } else if !is_plausible_email(&email) {
        errors.push("email", "value_error", "value is not a valid email address");
    }

    errors.finish(Credentials { email, password })
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

pub fn validate_new_task(req: CreateTaskRequest) -> Result<NewTask, ValidationError> {
    let mut errors = Errors::default();
    let title = check_title(&mut errors, req.title);
    check_description(&mut errors, req.description.as_deref());

    errors.finish(NewTask {
        title,
        description: req.description,
        completed: req.completed.unwrap_or(false),
    })
}

pub fn validate_task_update(req: UpdateTaskRequest) -> Result<TaskChanges, ValidationError> {
    let mut errors = Errors::default();
    let title = req.title.map(|title| check_title(&mut errors, title));
    if let Some(Some(description)) = &req.description {
        check_description(&mut errors, Some(description));
    }

    errors.finish(TaskChanges {
        title,
        description: req.description,
        completed: req.completed,
    })
}

fn check_title(errors: &mut Errors, title: String) -> String {
    let title = title.trim().to_string();
    if title.is_empty() {
        errors.push("title", "string_too_short", "title must not be empty");
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push(
            "title",
            "string_too_long",
            format!("title must be at most {} characters", TITLE_MAX_CHARS),
        );
    }
    title
}

fn check_description(errors: &mut Errors, description: Option<&str>) {
    if let Some(description) = description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(
                "description",
                "string_too_long",
                format!("description must be at most {} characters", DESCRIPTION_MAX_CHARS),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        let creds = validate_register(register("  Alice@Example.COM ")).unwrap();
        assert_eq!(creds.email, "alice@example.com");
    }

    #[test]
    fn test_rejects_malformed_emails() {
        for bad in ["", "alice", "@example.com", "alice@", "a@b@c", "al ice@example.com", "a@.com"] {
            let err = validate_register(register(bad)).unwrap_err();
            assert_eq!(err.details[0].loc, vec!["body", "email"], "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_new_task_defaults_and_trims() {
        let task = validate_new_task(CreateTaskRequest {
            title: "  Buy milk ".to_string(),
            description: Some("2%".to_string()),
            completed: None,
        })
        .unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("2%"));
        assert!(!task.completed);
    }

    #[test]
    fn test_new_task_reports_every_bad_field() {
        let err = validate_new_task(CreateTaskRequest {
            title: "   ".to_string(),
            description: Some("x".repeat(DESCRIPTION_MAX_CHARS + 1)),
            completed: None,
        })
        .unwrap_err();
        let fields: Vec<_> = err.details.iter().map(|d| d.loc[1].as_str()).collect();
        assert_eq!(fields, vec!["title", "description"]);
    }

    #[test]
    fn test_title_limit_counts_characters() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        assert!(
            validate_new_task(CreateTaskRequest {
                title,
                description: None,
                completed: None,
            })
            .is_ok()
        );
    }

    #[test]
    fn test_update_allows_clearing_description() {
        let changes = validate_task_update(UpdateTaskRequest {
            title: None,
            description: Some(None),
            completed: Some(true),
        })
        .unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.completed, Some(true));
        assert!(changes.title.is_none());
    }

    #[test]
    fn test_update_rejects_empty_title() {
        let err = validate_task_update(UpdateTaskRequest {
            title: Some(String::new()),
            description: None,
            completed: None,
        })
        .unwrap_err();
        assert_eq!(err.details[0].kind, "string_too_short");
    }
}
