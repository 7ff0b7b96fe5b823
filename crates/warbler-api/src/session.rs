use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use warbler_db::UserRow;
use warbler_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, with_db};

/// Cookie holding the logged-in user's signed session token.
pub const CURR_USER_KEY: &str = "curr_user";

const SESSION_DAYS: i64 = 30;

pub fn issue_token(secret: &str, user_id: i64) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign session: {e}")))
}

/// User id from a session token; `None` if forged or expired.
pub fn decode_token(secret: &str, token: &str) -> Option<i64> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .ok()
}

pub fn do_login(jar: CookieJar, secret: &str, user_id: i64) -> Result<CookieJar, ApiError> {
    let token = issue_token(secret, user_id)?;
    let cookie = Cookie::build((CURR_USER_KEY, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    debug!(user_id, "logged in");
    Ok(jar.add(cookie))
}

pub fn do_logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(CURR_USER_KEY).path("/"))
}

/// The user named by the session cookie, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    user: Option<UserRow>,
    /// Request cookies, so a rejection keeps any pending flashes.
    jar: CookieJar,
}

impl CurrentUser {
    pub fn user(&self) -> Option<&UserRow> {
        self.user.as_ref()
    }

    pub fn require(&self) -> Result<&UserRow, ApiError> {
        self.user.as_ref().ok_or_else(|| self.unauthorized())
    }

    pub fn unauthorized(&self) -> ApiError {
        ApiError::Unauthorized(self.jar.clone())
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user_id = jar
            .get(CURR_USER_KEY)
            .and_then(|c| decode_token(&state.secret_key, c.value()));
        let Some(user_id) = user_id else {
            return Ok(CurrentUser { user: None, jar });
        };

        // A deleted account leaves a valid token behind.
        let user = with_db(state, move |db| db.get_user(user_id)).await?;
        Ok(CurrentUser { user, jar })
    }
}
