//! Auth routes for registration, login, logout and user info

use axum::{
    Extension, Json, Router, middleware,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::middleware::{ACCESS_TOKEN_COOKIE, AuthMiddleware};
use crate::auth::models::{AuthUser, RegisterRequest, TokenResponse};
use crate::database::models::UserRead;
use crate::error::AppError;
use crate::routes::extract::{ApiJson, LoginPayload};
use crate::server::AppState;
use crate::validation::{validate_login, validate_register};

/// Register a new user with email and password.
///
/// Returns the created user (never the password hash).
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let creds = validate_register(payload)?;
    let user = state.authority.register(creds).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticate a user and return a bearer token.
///
/// The token is also set as an `access_token` cookie so browser clients
/// can rely on it across reloads.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    LoginPayload(payload): LoginPayload,
) -> Result<impl IntoResponse, AppError> {
    let creds = validate_login(payload)?;
    let outcome = state.authority.login(creds).await?;
    let response = TokenResponse::new(&outcome.token, outcome.user);

    let mut cookie = Cookie::new(ACCESS_TOKEN_COOKIE, outcome.token.token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    if state.config.auth.cookie_secure {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None); // cross origin
    } else {
        cookie.set_same_site(SameSite::Lax);
    }
    // Set expiry to match JWT expiry
    if response.expires_in > 0 {
        cookie.set_max_age(time::Duration::seconds(response.expires_in));
    }

    Ok((jar.add(cookie), Json(response)))
}

/// Tokens are stateless, so logout only clears the cookie. The token itself
/// stays valid until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let mut cookie = Cookie::from(ACCESS_TOKEN_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

/// Current authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserRead>, AppError> {
    Ok(Json(state.authority.current_user(&auth).await?))
}

pub fn create_auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/v1/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/api/v1/register", post(register))
        .route("/api/v1/login", post(login))
        .route("/api/v1/logout", post(logout))
        .merge(protected)
}
