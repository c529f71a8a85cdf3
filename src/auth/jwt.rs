//! JWT Token Service
//!
//! Handles JWT creation, validation, and claims management for user authentication.
//! Tokens are HS256, self-contained and stateless: nothing is stored server side.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::IssuedToken;
use crate::config::AuthConfig;
use crate::error::AppError;

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service from the auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        // Expiry is checked by hand in `validate_token` so that a token is
        // rejected exactly when now >= exp, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.jwt_issuer.clone(),
            ttl: config.token_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a JWT token for a user
    pub fn create_token(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AppError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Generate a token as if issued at `issued_at`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("token expiry out of range"))?;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("failed to encode JWT token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Validate and decode a JWT token
    ///
    /// The signature is checked before expiry, so a forged token reports
    /// `InvalidToken` even when its `exp` lies in the past.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_token_at(token, Utc::now())
    }

    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => {
                    tracing::debug!("JWT validation failed: {:?}", e);
                    AppError::InvalidToken
                }
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(AppError::ExpiredToken);
        }
        Ok(data.claims)
    }
}
