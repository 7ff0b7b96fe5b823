use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;
use warbler_types::forms::{LoginForm, SignupForm};

use crate::error::ApiError;
use crate::session::{CurrentUser, do_login, do_logout};
use crate::state::{AppState, with_db};
use crate::{flash, templates};

pub async fn signup_form(current: CurrentUser, jar: CookieJar) -> impl IntoResponse {
    let body = templates::signup_form(&SignupForm::default(), &[]);
    templates::render(jar, &current, "Sign up", &body)
}

/// Create the account and log it in. A taken username or email re-renders
/// the form.
pub async fn signup(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    let errors = form.validate();
    if !errors.is_empty() {
        let body = templates::signup_form(&form, &errors);
        return Ok(templates::render(jar, &current, "Sign up", &body).into_response());
    }

    let f = form.clone();
    let result = with_db(&state, move |db| {
        db.signup(
            Some(f.username.trim()),
            Some(f.email.trim()),
            Some(&f.password),
            Some(f.image_url.trim()),
        )
    })
    .await;

    let user = match result {
        Ok(user) => user,
        Err(ApiError::Db(e)) if e.is_integrity() => {
            let jar = flash::push(jar, "danger", "Username already taken");
            let body = templates::signup_form(&form, &[]);
            return Ok(templates::render(jar, &current, "Sign up", &body).into_response());
        }
        Err(e) => return Err(e),
    };

    info!(user_id = user.id, "new account");
    let jar = do_login(jar, &state.secret_key, user.id)?;
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn login_form(current: CurrentUser, jar: CookieJar) -> impl IntoResponse {
    let body = templates::login_form(&LoginForm::default(), &[]);
    templates::render(jar, &current, "Log in", &body)
}

pub async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let errors = form.validate();
    if !errors.is_empty() {
        let body = templates::login_form(&form, &errors);
        return Ok(templates::render(jar, &current, "Log in", &body).into_response());
    }

    let (username, password) = (form.username.trim().to_string(), form.password.clone());
    let user = with_db(&state, move |db| db.authenticate(&username, &password)).await?;

    match user {
        Some(user) => {
            let jar = do_login(jar, &state.secret_key, user.id)?;
            let jar = flash::push(jar, "success", format!("Hello, {}!", user.username));
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            let jar = flash::push(jar, "danger", "Invalid credentials.");
            let body = templates::login_form(&form, &[]);
            Ok(templates::render(jar, &current, "Log in", &body).into_response())
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = flash::push(do_logout(jar), "success", "You have successfully logged out.");
    (jar, Redirect::to("/login"))
}
