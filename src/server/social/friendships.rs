use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{FriendshipRequest, ListParams};
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};

use super::access::reject_self_follow;

pub async fn list_friendships(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let friendships = state
        .store
        .list_friendships(params.cursor.unwrap_or(0), DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list friendships")?;

    let (friendships, next_cursor, has_more) =
        paginate(friendships, DEFAULT_PAGE_SIZE as usize, |f| f.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        friendships,
        next_cursor,
        has_more,
    )))
}

/// Records that `from_profile` started following `to_profile`. Both sides'
/// derived sets reflect the new edge as soon as this returns.
pub async fn create_friendship(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<FriendshipRequest>,
) -> impl IntoResponse {
    reject_self_follow(req.from_profile, &[req.to_profile])?;

    let friendship = state
        .store
        .create_friendship(req.from_profile, req.to_profile)
        .api_err("Failed to create friendship")?;

    tracing::debug!(
        "Profile {} now follows {}",
        friendship.from_profile,
        friendship.to_profile
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(friendship))))
}

pub async fn get_friendship(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let friendship = state
        .store
        .get_friendship(id)
        .api_err("Failed to get friendship")?
        .or_not_found("Friendship not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(friendship)))
}

pub async fn update_friendship(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<FriendshipRequest>,
) -> impl IntoResponse {
    let mut friendship = state
        .store
        .get_friendship(id)
        .api_err("Failed to get friendship")?
        .or_not_found("Friendship not found")?;

    reject_self_follow(req.from_profile, &[req.to_profile])?;
    friendship.from_profile = req.from_profile;
    friendship.to_profile = req.to_profile;

    state
        .store
        .update_friendship(&friendship)
        .api_err("Failed to update friendship")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(friendship)))
}

pub async fn delete_friendship(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_friendship(id)
        .api_err("Failed to delete friendship")?;

    if !deleted {
        return Err(ApiError::not_found("Friendship not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
