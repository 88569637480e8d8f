mod access;
mod friendships;
mod lessons;
mod profiles;
mod taken_lessons;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn social_router() -> Router<Arc<AppState>> {
    Router::new()
        // Lessons
        .route(
            "/lessons/",
            get(lessons::list_lessons).post(lessons::create_lesson),
        )
        .route(
            "/lessons/{id}/",
            get(lessons::get_lesson)
                .put(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        // Profiles
        .route(
            "/usersProfile/",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/usersProfile/non-staff-users/",
            get(profiles::list_non_staff_profiles),
        )
        .route(
            "/usersProfile/{id}/",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route("/usersProfile/{id}/friends/", get(profiles::list_friends))
        .route(
            "/usersProfile/{id}/friends_lessons/",
            get(profiles::list_friends_lessons),
        )
        // Taken lessons
        .route(
            "/takenLessons/",
            get(taken_lessons::list_taken_lessons).post(taken_lessons::create_taken_lesson),
        )
        .route(
            "/takenLessons/record/",
            post(taken_lessons::record_lesson_taken),
        )
        .route(
            "/takenLessons/{id}/",
            get(taken_lessons::get_taken_lesson)
                .put(taken_lessons::update_taken_lesson)
                .delete(taken_lessons::delete_taken_lesson),
        )
        // The segment names the profile here; it shares the `{id}` slot with
        // the detail route above.
        .route(
            "/takenLessons/{id}/user_lessons/",
            get(taken_lessons::list_profile_lessons),
        )
        // Friendship log
        .route(
            "/friendships/",
            get(friendships::list_friendships).post(friendships::create_friendship),
        )
        .route(
            "/friendships/{id}/",
            get(friendships::get_friendship)
                .put(friendships::update_friendship)
                .delete(friendships::delete_friendship),
        )
}
