use serde::{Deserialize, Serialize};

use crate::types::{IdentitySummary, Lesson, Profile};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub cursor: Option<i64>,
}

// Lessons

#[derive(Debug, Deserialize)]
pub struct LessonRequest {
    pub name: String,
    pub topic: String,
}

/// A lesson reduced to the `{lesson: ...}` shape used by the lesson-history
/// queries.
#[derive(Debug, Serialize)]
pub struct LessonEntry {
    pub lesson: Lesson,
}

impl From<Lesson> for LessonEntry {
    fn from(lesson: Lesson) -> Self {
        Self { lesson }
    }
}

// Profiles

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub user: IdentitySummary,
    pub followers: Vec<i64>,
    pub following: Vec<i64>,
}

/// A followed profile reduced to its id and owning user.
#[derive(Debug, Serialize)]
pub struct FriendResponse {
    pub id: i64,
    pub user: IdentitySummary,
}

impl From<Profile> for FriendResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            user: profile.user,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// Partial profile update. `following`/`followers`, when present, replace the
/// whole set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub following: Option<Vec<i64>>,
    #[serde(default)]
    pub followers: Option<Vec<i64>>,
}

// Friendships

#[derive(Debug, Deserialize)]
pub struct FriendshipRequest {
    pub from_profile: i64,
    pub to_profile: i64,
}

// Taken lessons

#[derive(Debug, Deserialize)]
pub struct CreateTakenLessonRequest {
    pub profile: i64,
    pub lesson: i64,
    #[serde(default)]
    pub times_taken: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTakenLessonRequest {
    #[serde(default)]
    pub profile: Option<i64>,
    #[serde(default)]
    pub lesson: Option<i64>,
    #[serde(default)]
    pub times_taken: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecordLessonRequest {
    pub profile: i64,
    pub lesson: i64,
}

// Accounts

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ObtainTokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
}
