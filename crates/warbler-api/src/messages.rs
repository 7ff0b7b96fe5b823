use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use warbler_types::forms::MessageForm;

use crate::error::ApiError;
use crate::session::CurrentUser;
use crate::state::{AppState, with_db};
use crate::templates;

/// GET /messages/new
pub async fn new_message_form(current: CurrentUser, jar: CookieJar) -> Result<Response, ApiError> {
    current.require()?;
    let body = templates::new_message(&MessageForm::default(), &[]);
    Ok(templates::render(jar, &current, "New message", &body).into_response())
}

/// POST /messages/new
pub async fn add_message(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let errors = form.validate();
    if !errors.is_empty() {
        let body = templates::new_message(&form, &errors);
        return Ok(templates::render(jar, &current, "New message", &body).into_response());
    }

    let text = form.text;
    let message = with_db(&state, move |db| db.create_message(user_id, &text)).await?;
    debug!(message_id = message.id, user_id, "message posted");

    Ok((jar, Redirect::to(&format!("/users/{user_id}"))).into_response())
}

pub async fn show_message(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(message_id): Path<i64>,
) -> Result<Response, ApiError> {
    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    let body = templates::message_show(&message, current.user());
    Ok(templates::render(jar, &current, "Message", &body).into_response())
}

/// POST /messages/{id}/delete: only the author may delete.
pub async fn delete_message(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(message_id): Path<i64>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(ApiError::NotFound)?;
    if message.user_id != user_id {
        warn!(message_id, user_id, "delete attempt on someone else's message");
        return Err(current.unauthorized());
    }

    with_db(&state, move |db| db.delete_message(message_id)).await?;

    Ok((jar, Redirect::to(&format!("/users/{user_id}"))).into_response())
}

/// POST /users/add_like/{message_id}: like or unlike someone else's message.
pub async fn toggle_like(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(message_id): Path<i64>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(ApiError::NotFound)?;
    if message.user_id == user_id {
        return Err(ApiError::Forbidden);
    }

    let liked = with_db(&state, move |db| db.toggle_like(user_id, message_id)).await?;
    debug!(message_id, user_id, liked, "like toggled");

    Ok((jar, Redirect::to("/")).into_response())
}
