use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{
    CreateTakenLessonRequest, LessonEntry, ListParams, RecordLessonRequest,
    UpdateTakenLessonRequest,
};
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};

use super::access::load_profile;

pub async fn list_taken_lessons(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let taken = state
        .store
        .list_taken_lessons(params.cursor.unwrap_or(0), DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list taken lessons")?;

    let (taken, next_cursor, has_more) =
        paginate(taken, DEFAULT_PAGE_SIZE as usize, |t| t.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(taken, next_cursor, has_more)))
}

/// Plain insert. A second row for the same (profile, lesson) pair is a 400;
/// repeat takes go through [`record_lesson_taken`].
pub async fn create_taken_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTakenLessonRequest>,
) -> impl IntoResponse {
    let taken = state
        .store
        .create_taken_lesson(req.profile, req.lesson, req.times_taken)
        .api_err("Failed to create taken lesson")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(taken))))
}

pub async fn record_lesson_taken(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RecordLessonRequest>,
) -> impl IntoResponse {
    let taken = state
        .store
        .record_lesson_taken(req.profile, req.lesson)
        .api_err("Failed to record lesson")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(taken)))
}

pub async fn get_taken_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let taken = state
        .store
        .get_taken_lesson(id)
        .api_err("Failed to get taken lesson")?
        .or_not_found("Taken lesson not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(taken)))
}

pub async fn update_taken_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateTakenLessonRequest>,
) -> impl IntoResponse {
    let mut taken = state
        .store
        .get_taken_lesson(id)
        .api_err("Failed to get taken lesson")?
        .or_not_found("Taken lesson not found")?;

    if let Some(profile) = req.profile {
        taken.profile = profile;
    }
    if let Some(lesson) = req.lesson {
        taken.lesson = lesson;
    }
    if let Some(times_taken) = req.times_taken {
        taken.times_taken = times_taken;
    }

    state
        .store
        .update_taken_lesson(&taken)
        .api_err("Failed to update taken lesson")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(taken)))
}

pub async fn delete_taken_lesson(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_taken_lesson(id)
        .api_err("Failed to delete taken lesson")?;

    if !deleted {
        return Err(ApiError::not_found("Taken lesson not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Lessons taken by one profile. An unknown profile is a 404; a known one
/// with no history is an empty list.
pub async fn list_profile_lessons(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(profile_id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, profile_id)?;

    let lessons: Vec<LessonEntry> = store
        .list_profile_lessons(profile.id)
        .api_err("Failed to list lessons")?
        .into_iter()
        .map(LessonEntry::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(lessons)))
}
