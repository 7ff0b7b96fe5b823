use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ApiError;
use crate::session::CurrentUser;
use crate::state::{AppState, with_db};
use crate::templates;
use crate::users::{liked_ids, load_profile};

/// Messages shown on the homepage timeline.
pub const TIMELINE_LIMIT: u32 = 100;

/// GET /: landing page for visitors, timeline for logged-in users.
pub async fn homepage(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(user_id) = current.user().map(|u| u.id) else {
        return Ok(templates::render(jar, &current, "Warbler", &templates::home_anon()).into_response());
    };

    let (view, messages, liked) = with_db(&state, move |db| {
        let Some(view) = load_profile(db, user_id, None)? else {
            return Ok(None);
        };
        let messages = db.timeline(user_id, TIMELINE_LIMIT)?;
        Ok(Some((view, messages, liked_ids(db, Some(user_id))?)))
    })
    .await?
    .ok_or_else(|| current.unauthorized())?;

    let body = templates::home(&view, &messages, &liked);
    Ok(templates::render(jar, &current, "Warbler", &body).into_response())
}

pub async fn not_found(current: CurrentUser, jar: CookieJar) -> impl IntoResponse {
    let (jar, page) = templates::render(jar, &current, "Not found", &templates::not_found());
    (StatusCode::NOT_FOUND, jar, page)
}
