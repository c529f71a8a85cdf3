//! Request extractors that report malformed input as `AppError`, so clients
//! get the same JSON error shape for parse failures as for validation ones.

use axum::{
    Form, Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        path::ErrorKind,
        rejection::PathRejection,
    },
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::auth::models::LoginRequest;
use crate::error::AppError;
use crate::validation::ValidationError;

/// `Json<T>` with the rejection mapped to a validation error
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::body(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Path<T>` with the rejection mapped to a validation error, so a
/// malformed id gets the same JSON error body as a malformed payload.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_error)?;
        Ok(Self(value))
    }
}

fn path_error(rejection: PathRejection) -> ValidationError {
    let key = match &rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            ErrorKind::ParseErrorAtKey { key, .. }
            | ErrorKind::DeserializeError { key, .. }
            | ErrorKind::InvalidUtf8InPathParam { key } => Some(key.clone()),
            _ => None,
        },
        _ => None,
    };
    ValidationError::path(key, rejection.body_text())
}

/// Login body as JSON, or as an OAuth2 password form
/// (`application/x-www-form-urlencoded` with `username` and `password`).
pub struct LoginPayload(pub LoginRequest);

impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(login) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ValidationError::body(rejection.body_text()))?;
            Ok(Self(login))
        } else {
            let ApiJson(login) = ApiJson::<LoginRequest>::from_request(req, state).await?;
            Ok(Self(login))
        }
    }
}
