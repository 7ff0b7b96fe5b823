pub mod auth;
pub mod error;
pub mod flash;
pub mod home;
pub mod messages;
pub mod session;
pub mod state;
pub mod templates;
pub mod users;

use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// The whole site: pages, form posts and `/static` assets.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(home::homepage))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::edit_profile_form).post(users::edit_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route("/users/add_like/{message_id}", post(messages::toggle_like))
        .route("/users/{id}", get(users::show_user))
        .route("/users/{id}/following", get(users::show_following))
        .route("/users/{id}/followers", get(users::show_followers))
        .route("/users/{id}/likes", get(users::show_likes))
        .route("/messages/new", get(messages::new_message_form).post(messages::add_message))
        .route("/messages/{id}", get(messages::show_message))
        .route("/messages/{id}/delete", post(messages::delete_message))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .fallback(home::not_found)
        // Pages depend on the session; never let a browser or proxy cache them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate, public, max-age=0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
