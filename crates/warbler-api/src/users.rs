use std::collections::HashSet;

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;
use warbler_db::Database;
use warbler_db::models::ProfileUpdate;
use warbler_types::api::SearchQuery;
use warbler_types::forms::ProfileForm;

use crate::error::ApiError;
use crate::flash;
use crate::session::{CurrentUser, do_logout};
use crate::state::{AppState, with_db};
use crate::templates::{self, ProfileStats, ProfileView};

/// Messages shown on a profile page.
pub const PROFILE_MESSAGE_LIMIT: u32 = 100;

pub(crate) fn load_profile(
    db: &Database,
    user_id: i64,
    viewer_id: Option<i64>,
) -> warbler_db::Result<Option<ProfileView>> {
    let Some(user) = db.get_user(user_id)? else {
        return Ok(None);
    };
    let stats = ProfileStats {
        messages: db.count_messages(user_id)?,
        following: db.following(user_id)?.len(),
        followers: db.followers(user_id)?.len(),
        likes: db.likes_for_user(user_id)?.len(),
    };
    let followed_by_viewer = match viewer_id {
        Some(v) if v != user_id => db.is_following(v, user_id)?,
        _ => false,
    };
    Ok(Some(ProfileView {
        user,
        stats,
        followed_by_viewer,
    }))
}

pub(crate) fn following_ids(db: &Database, viewer_id: Option<i64>) -> warbler_db::Result<HashSet<i64>> {
    match viewer_id {
        Some(id) => Ok(db.following(id)?.into_iter().map(|u| u.id).collect()),
        None => Ok(HashSet::new()),
    }
}

pub(crate) fn liked_ids(db: &Database, viewer_id: Option<i64>) -> warbler_db::Result<HashSet<i64>> {
    match viewer_id {
        Some(id) => Ok(db.liked_message_ids(id)?.into_iter().collect()),
        None => Ok(HashSet::new()),
    }
}

/// GET /users?q=: all users, or those whose username contains `q`.
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = query.q.filter(|q| !q.trim().is_empty());
    let viewer_id = current.user().map(|u| u.id);

    let s = search.clone();
    let (users, following) = with_db(&state, move |db| {
        let users = match &s {
            Some(q) => db.search_users(q.trim())?,
            None => db.list_users()?,
        };
        Ok((users, following_ids(db, viewer_id)?))
    })
    .await?;

    let body = templates::users_index(&users, search.as_deref(), current.user(), &following);
    Ok(templates::render(jar, &current, "Users", &body).into_response())
}

pub async fn show_user(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    let viewer_id = current.user().map(|u| u.id);

    let (view, messages, liked) = with_db(&state, move |db| {
        let Some(view) = load_profile(db, user_id, viewer_id)? else {
            return Ok(None);
        };
        let messages = db.messages_for_user(user_id, PROFILE_MESSAGE_LIMIT)?;
        Ok(Some((view, messages, liked_ids(db, viewer_id)?)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let body = templates::user_show(&view, current.user(), &messages, &liked);
    let title = format!("@{}", view.user.username);
    Ok(templates::render(jar, &current, &title, &body).into_response())
}

/// GET /users/{id}/following
pub async fn show_following(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    let viewer = current.require()?.clone();
    let viewer_id = viewer.id;

    let (view, users, following) = with_db(&state, move |db| {
        let Some(view) = load_profile(db, user_id, Some(viewer_id))? else {
            return Ok(None);
        };
        let users = db.following(user_id)?;
        Ok(Some((view, users, following_ids(db, Some(viewer_id))?)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let body = templates::user_list_page(&view, &viewer, &users, &following);
    let title = format!("People @{} follows", view.user.username);
    Ok(templates::render(jar, &current, &title, &body).into_response())
}

/// GET /users/{id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    let viewer = current.require()?.clone();
    let viewer_id = viewer.id;

    let (view, users, following) = with_db(&state, move |db| {
        let Some(view) = load_profile(db, user_id, Some(viewer_id))? else {
            return Ok(None);
        };
        let users = db.followers(user_id)?;
        Ok(Some((view, users, following_ids(db, Some(viewer_id))?)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let body = templates::user_list_page(&view, &viewer, &users, &following);
    let title = format!("@{}'s followers", view.user.username);
    Ok(templates::render(jar, &current, &title, &body).into_response())
}

/// GET /users/{id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    let viewer = current.require()?.clone();
    let viewer_id = viewer.id;

    let (view, messages, liked) = with_db(&state, move |db| {
        let Some(view) = load_profile(db, user_id, Some(viewer_id))? else {
            return Ok(None);
        };
        let messages = db.liked_messages(user_id)?;
        Ok(Some((view, messages, liked_ids(db, Some(viewer_id))?)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let body = templates::likes_page(&view, &viewer, &messages, &liked);
    let title = format!("@{}'s likes", view.user.username);
    Ok(templates::render(jar, &current, &title, &body).into_response())
}

/// POST /users/follow/{id}: follow; already following is a no-op.
pub async fn follow(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(followed_id): Path<i64>,
) -> Result<Response, ApiError> {
    let me = current.require()?.id;
    let back = Redirect::to(&format!("/users/{me}/following"));

    if followed_id == me {
        let jar = flash::push(jar, "danger", "You can't follow yourself.");
        return Ok((jar, back).into_response());
    }

    let found = with_db(&state, move |db| {
        if db.get_user(followed_id)?.is_none() {
            return Ok(false);
        }
        match db.follow(me, followed_id) {
            Ok(()) => Ok(true),
            // Already following.
            Err(e) if e.is_integrity() => Ok(true),
            Err(e) => Err(e),
        }
    })
    .await?;
    if !found {
        return Err(ApiError::NotFound);
    }

    Ok((jar, back).into_response())
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Path(followed_id): Path<i64>,
) -> Result<Response, ApiError> {
    let me = current.require()?.id;

    with_db(&state, move |db| db.unfollow(me, followed_id)).await?;

    Ok((jar, Redirect::to(&format!("/users/{me}/following"))).into_response())
}

/// GET /users/profile
pub async fn edit_profile_form(current: CurrentUser, jar: CookieJar) -> Result<Response, ApiError> {
    let user = current.require()?;
    let form = ProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: user.image_url.clone(),
        header_image_url: user.header_image_url.clone(),
        bio: user.bio.clone().unwrap_or_default(),
        location: user.location.clone().unwrap_or_default(),
        password: String::new(),
    };
    let body = templates::edit_profile(&form, &[]);
    Ok(templates::render(jar, &current, "Edit profile", &body).into_response())
}

/// POST /users/profile: apply the edit once the current password checks out.
pub async fn edit_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    let user = current.require()?.clone();

    let errors = form.validate();
    if !errors.is_empty() {
        let body = templates::edit_profile(&form, &errors);
        return Ok(templates::render(jar, &current, "Edit profile", &body).into_response());
    }

    let (username, password) = (user.username.clone(), form.password.clone());
    let confirmed = with_db(&state, move |db| db.authenticate(&username, &password)).await?;
    if confirmed.is_none() {
        let jar = flash::push(jar, "danger", "Wrong password, please try again.");
        return Ok((jar, Redirect::to("/")).into_response());
    }

    let update = ProfileUpdate {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        image_url: Some(form.image_url.clone()),
        header_image_url: Some(form.header_image_url.clone()),
        bio: Some(form.bio.clone()),
        location: Some(form.location.clone()),
    };
    let user_id = user.id;
    match with_db(&state, move |db| db.update_profile(user_id, &update)).await {
        Ok(_) => Ok((jar, Redirect::to(&format!("/users/{user_id}"))).into_response()),
        Err(ApiError::Db(e)) if e.is_integrity() => {
            let jar = flash::push(jar, "danger", "Username or email already taken.");
            let body = templates::edit_profile(&form, &[]);
            Ok(templates::render(jar, &current, "Edit profile", &body).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /users/delete: log out and remove the account.
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;
    let jar = do_logout(jar);

    with_db(&state, move |db| db.delete_user(user_id)).await?;
    info!(user_id, "account deleted");

    Ok((jar, Redirect::to("/signup")).into_response())
}
