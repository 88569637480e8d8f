use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{LessonRequest, ListParams};
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_lesson;

pub async fn list_lessons(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let lessons = state
        .store
        .list_lessons(params.cursor.unwrap_or(0), DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list lessons")?;

    let (lessons, next_cursor, has_more) =
        paginate(lessons, DEFAULT_PAGE_SIZE as usize, |l| l.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(lessons, next_cursor, has_more)))
}

pub async fn create_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LessonRequest>,
) -> impl IntoResponse {
    validate_lesson(&req.name, &req.topic)?;

    let lesson = state
        .store
        .create_lesson(&req.name, &req.topic)
        .api_err("Failed to create lesson")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(lesson))))
}

pub async fn get_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let lesson = state
        .store
        .get_lesson(id)
        .api_err("Failed to get lesson")?
        .or_not_found("Lesson not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lesson)))
}

pub async fn update_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<LessonRequest>,
) -> impl IntoResponse {
    let mut lesson = state
        .store
        .get_lesson(id)
        .api_err("Failed to get lesson")?
        .or_not_found("Lesson not found")?;

    validate_lesson(&req.name, &req.topic)?;
    lesson.name = req.name;
    lesson.topic = req.topic;

    state
        .store
        .update_lesson(&lesson)
        .api_err("Failed to update lesson")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lesson)))
}

pub async fn delete_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_lesson(id)
        .api_err("Failed to delete lesson")?;

    if !deleted {
        return Err(ApiError::not_found("Lesson not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
