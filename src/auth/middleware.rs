//! Authentication Middleware
//!
//! Axum middleware for bearer token validation and user authentication.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::server::AppState;

/// Name of the cookie set at login
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authentication middleware that validates tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating tokens
    ///
    /// On success an [`AuthUser`](crate::auth::models::AuthUser) is inserted
    /// into the request extensions for downstream handlers.
    pub async fn validate_token(
        State(state): State<AppState>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        tracing::debug!("[AuthMiddleware] Incoming request: {} {}", req.method(), req.uri());

        let Some(token) = extract_token(&req) else {
            tracing::warn!("[AuthMiddleware] Missing Authorization header and access_token cookie");
            return Err(AppError::InvalidToken);
        };

        let auth_user = state.authority.authenticate(&token).await.map_err(|e| {
            tracing::warn!("[AuthMiddleware] Token rejected: {}", e);
            e
        })?;
        tracing::debug!("[AuthMiddleware] AuthUser injected: id={}", auth_user.id);

        req.extensions_mut().insert(auth_user);
        Ok(next.run(req).await)
    }
}

/// Token from `Authorization: Bearer ...`, falling back to the
/// `access_token` cookie.
fn extract_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme
                .eq_ignore_ascii_case("bearer")
                .then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}
