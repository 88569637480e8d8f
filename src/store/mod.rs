mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Follow relationships live only in the friendship log: `list_following` and
/// `list_followers` are projections of the current friendship rows.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Identity operations. Creating an identity creates its profile in the
    // same transaction.
    fn create_identity(&self, identity: &NewIdentity) -> Result<(Identity, Profile)>;
    fn get_identity(&self, id: i64) -> Result<Option<Identity>>;
    fn get_identity_by_username(&self, username: &str) -> Result<Option<Identity>>;
    fn get_identity_by_email(&self, email: &str) -> Result<Option<Identity>>;
    fn delete_identity(&self, id: i64) -> Result<bool>;

    // Profile operations
    fn get_profile(&self, id: i64) -> Result<Option<Profile>>;
    fn get_profile_by_identity(&self, identity_id: i64) -> Result<Option<Profile>>;
    fn list_profiles(&self, cursor: i64, limit: i32) -> Result<Vec<Profile>>;
    fn list_non_staff_profiles(&self) -> Result<Vec<Profile>>;
    fn list_following(&self, profile_id: i64) -> Result<Vec<Profile>>;
    fn list_followers(&self, profile_id: i64) -> Result<Vec<Profile>>;
    /// Applies identity field changes and follow set replacements together;
    /// any failure leaves the profile as it was.
    fn update_profile(&self, profile_id: i64, update: &ProfileUpdate) -> Result<()>;

    // Lesson operations
    fn create_lesson(&self, name: &str, topic: &str) -> Result<Lesson>;
    fn get_lesson(&self, id: i64) -> Result<Option<Lesson>>;
    fn list_lessons(&self, cursor: i64, limit: i32) -> Result<Vec<Lesson>>;
    fn update_lesson(&self, lesson: &Lesson) -> Result<()>;
    fn delete_lesson(&self, id: i64) -> Result<bool>;

    // Friendship log operations
    fn create_friendship(&self, from_profile: i64, to_profile: i64) -> Result<Friendship>;
    fn get_friendship(&self, id: i64) -> Result<Option<Friendship>>;
    fn list_friendships(&self, cursor: i64, limit: i32) -> Result<Vec<Friendship>>;
    fn update_friendship(&self, friendship: &Friendship) -> Result<()>;
    fn delete_friendship(&self, id: i64) -> Result<bool>;

    // Taken lesson operations
    fn create_taken_lesson(
        &self,
        profile_id: i64,
        lesson_id: i64,
        times_taken: u32,
    ) -> Result<TakenLesson>;
    fn get_taken_lesson(&self, id: i64) -> Result<Option<TakenLesson>>;
    fn list_taken_lessons(&self, cursor: i64, limit: i32) -> Result<Vec<TakenLesson>>;
    fn update_taken_lesson(&self, taken: &TakenLesson) -> Result<()>;
    fn delete_taken_lesson(&self, id: i64) -> Result<bool>;
    fn record_lesson_taken(&self, profile_id: i64, lesson_id: i64) -> Result<TakenLesson>;
    fn list_profile_lessons(&self, profile_id: i64) -> Result<Vec<Lesson>>;
    fn list_friends_lessons(&self, profile_id: i64) -> Result<Vec<Lesson>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn revoke_token(&self, id: &str) -> Result<bool>;
    fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
}
