use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;
use warbler_db::DbError;

use crate::{flash, templates};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No logged-in user, or the user may not touch this resource.
    /// Carries the request cookies so pending flashes survive the redirect.
    #[error("access unauthorized")]
    Unauthorized(CookieJar),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(jar) => {
                let jar = flash::push(jar, "danger", "Access unauthorized.");
                (jar, Redirect::to("/")).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(templates::layout("Not found", None, &[], &templates::not_found())),
            )
                .into_response(),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                Html(templates::layout("Forbidden", None, &[], &templates::forbidden())),
            )
                .into_response(),
            ApiError::Db(e) => {
                error!("database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Internal(msg) => {
                error!("internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
