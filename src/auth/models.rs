//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::UserRead;

/// Authenticated user information extracted from JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request payload. OAuth2 password forms send the email as `username`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

/// Validated login handle and raw password
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A freshly signed token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token response after successful authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
    pub user: UserRead,
}

impl TokenResponse {
    pub fn new(issued: &IssuedToken, user: UserRead) -> Self {
        Self {
            access_token: issued.token.clone(),
            token_type: "bearer".to_string(),
            expires_in: (issued.expires_at - Utc::now()).num_seconds().max(0),
            expires_at: issued.expires_at.timestamp(),
            user,
        }
    }
}

/// Successful login: the token plus the user it was issued for
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub user: UserRead,
}
