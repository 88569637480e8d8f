use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{RequireAuth, RequireStaff};
use crate::server::AppState;
use crate::server::account::create_account;
use crate::server::dto::{
    CreateProfileRequest, FriendResponse, LessonEntry, ListParams, ProfileResponse,
    UpdateProfileRequest,
};
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
};
use crate::server::validation::{validate_email, validate_username};
use crate::types::ProfileUpdate;

use super::access::{load_profile, profile_response, reject_self_follow, require_profile_owner};

pub async fn list_profiles(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profiles = store
        .list_profiles(params.cursor.unwrap_or(0), DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list profiles")?;

    let (profiles, next_cursor, has_more) =
        paginate(profiles, DEFAULT_PAGE_SIZE as usize, |p| p.id.to_string());

    let profiles = profiles
        .into_iter()
        .map(|p| profile_response(store, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(profiles, next_cursor, has_more)))
}

/// Staff-only: creates an identity and, with it, its profile.
pub async fn create_profile(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProfileRequest>,
) -> impl IntoResponse {
    let (_, profile) = create_account(
        state.store.as_ref(),
        &req.username,
        &req.email,
        &req.password,
        req.is_staff,
    )?;

    let response = profile_response(state.store.as_ref(), profile)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

pub async fn get_profile(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(profile_response(store, profile)?)))
}

pub async fn update_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, id)?;
    require_profile_owner(&auth.identity, &profile)?;

    if let Some(following) = &req.following {
        reject_self_follow(profile.id, following)?;
    }
    if let Some(followers) = &req.followers {
        reject_self_follow(profile.id, followers)?;
    }

    if let Some(username) = &req.username {
        validate_username(username)?;
    }
    if let Some(email) = &req.email {
        validate_email(email)?;
    }

    let update = ProfileUpdate {
        username: req.username,
        email: req.email,
        following: req.following,
        followers: req.followers,
    };
    store
        .update_profile(profile.id, &update)
        .api_err("Failed to update profile")?;

    let profile = load_profile(store, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(profile_response(store, profile)?)))
}

/// Deletes the owning identity; the profile and its friendship and lesson
/// rows go with it.
pub async fn delete_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, id)?;
    require_profile_owner(&auth.identity, &profile)?;

    store
        .delete_identity(profile.user.id)
        .api_err("Failed to delete profile")?;

    tracing::info!("Deleted profile {} (user {})", profile.id, profile.user.username);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_friends(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, id)?;

    let friends: Vec<FriendResponse> = store
        .list_following(profile.id)
        .api_err("Failed to list friends")?
        .into_iter()
        .map(FriendResponse::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(friends)))
}

pub async fn list_friends_lessons(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profile = load_profile(store, id)?;

    let lessons: Vec<LessonEntry> = store
        .list_friends_lessons(profile.id)
        .api_err("Failed to list friends' lessons")?
        .into_iter()
        .map(LessonEntry::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(lessons)))
}

pub async fn list_non_staff_profiles(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let profiles: Vec<ProfileResponse> = store
        .list_non_staff_profiles()
        .api_err("Failed to list non-staff profiles")?
        .into_iter()
        .map(|p| profile_response(store, p))
        .collect::<Result<_, _>>()?;

    Ok::<_, ApiError>(Json(ApiResponse::success(profiles)))
}
