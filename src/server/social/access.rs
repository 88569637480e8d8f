use crate::server::dto::ProfileResponse;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{Identity, Profile};

pub fn load_profile(store: &dyn Store, id: i64) -> Result<Profile, ApiError> {
    store
        .get_profile(id)
        .api_err("Failed to get profile")?
        .or_not_found("Profile not found")
}

/// Staff may edit any profile; everyone else only their own.
pub fn require_profile_owner(identity: &Identity, profile: &Profile) -> Result<(), ApiError> {
    if identity.is_staff || profile.user.id == identity.id {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to modify this profile",
        ))
    }
}

/// Rejects follow-set edits that would put a profile in its own sets.
pub fn reject_self_follow(profile_id: i64, others: &[i64]) -> Result<(), ApiError> {
    if others.contains(&profile_id) {
        return Err(ApiError::bad_request("A profile cannot follow itself"));
    }
    Ok(())
}

/// Expands a profile with its derived follower and following id sets.
pub fn profile_response(store: &dyn Store, profile: Profile) -> Result<ProfileResponse, ApiError> {
    let followers = store
        .list_followers(profile.id)
        .api_err("Failed to list followers")?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let following = store
        .list_following(profile.id)
        .api_err("Failed to list following")?
        .into_iter()
        .map(|p| p.id)
        .collect();

    Ok(ProfileResponse {
        id: profile.id,
        user: profile.user,
        followers,
        following,
    })
}
