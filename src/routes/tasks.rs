//! Task routes
//!
//! Handlers only parse and validate input; ownership checks happen in
//! [`TaskService`](crate::services::TaskService).

use axum::{
    Extension, Json, Router, middleware,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::auth::{AuthMiddleware, AuthUser};
use crate::database::models::{CreateTaskRequest, Task, TaskListResponse, UpdateTaskRequest};
use crate::error::AppError;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::server::AppState;
use crate::validation::{validate_new_task, validate_task_update};

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = state.tasks.list_tasks(&auth, user_id).await?;
    Ok(Json(TaskListResponse { tasks }))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = validate_new_task(payload)?;
    let task = state.tasks.create_task(&auth, user_id, new).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath((user_id, task_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.tasks.get_task(&auth, user_id, task_id).await?))
}

/// Serves both PUT and PATCH; only the fields present in the body change.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath((user_id, task_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let changes = validate_task_update(payload)?;
    Ok(Json(
        state
            .tasks
            .update_task(&auth, user_id, task_id, changes)
            .await?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath((user_id, task_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete_task(&auth, user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_task_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/{user_id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/api/v1/{user_id}/tasks/{task_id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::validate_token,
        ))
}
