//! HTML rendering. Every piece of user text goes through `text`/`attr`.

use std::collections::HashSet;

use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use warbler_db::{MessageRow, UserRow};
use warbler_types::api::Flash;
use warbler_types::forms::{LoginForm, MessageForm, ProfileForm, SignupForm};

use crate::flash;
use crate::session::CurrentUser;

/// Counters shown on profile headers.
#[derive(Debug, Clone, Default)]
pub struct ProfileStats {
    pub messages: i64,
    pub following: usize,
    pub followers: usize,
    pub likes: usize,
}

/// A profile as seen by the current viewer.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: UserRow,
    pub stats: ProfileStats,
    /// Whether the viewer follows `user`.
    pub followed_by_viewer: bool,
}

/// Wrap `body` in the layout, draining pending flashes into it.
pub fn render(jar: CookieJar, current: &CurrentUser, title: &str, body: &str) -> (CookieJar, Html<String>) {
    let (jar, flashes) = flash::take(jar);
    (jar, Html(layout(title, current.user(), &flashes, body)))
}

pub fn layout(title: &str, user: Option<&UserRow>, flashes: &[Flash], body: &str) -> String {
    let nav = match user {
        Some(u) => format!(
            r#"<li><a href="/users/{id}"><img src="{img}" alt="{name}" class="nav-avatar"></a></li>
        <li><a href="/messages/new">New Message</a></li>
        <li><a href="/logout">Log out</a></li>"#,
            id = u.id,
            img = attr(&u.image_url),
            name = attr(&u.username),
        ),
        None => r#"<li><a href="/signup">Sign up</a></li>
        <li><a href="/login">Log in</a></li>"#
            .to_string(),
    };

    let alerts: String = flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="alert alert-{}">{}</div>"#,
                attr(&f.category),
                text(&f.message)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/stylesheets/style.css">
</head>
<body>
  <nav class="navbar">
    <a href="/" class="navbar-brand">Warbler</a>
    <form action="/users" class="navbar-search">
      <input name="q" placeholder="Search Warbler">
    </form>
    <ul class="nav">
        {nav}
    </ul>
  </nav>
  <div class="container">
    {alerts}
    {body}
  </div>
</body>
</html>
"#,
        title = text(title),
    )
}

pub fn home_anon() -> String {
    r#"<div class="home-hero">
  <h1>What's Happening?</h1>
  <h4>New to Warbler?</h4>
  <a href="/signup" class="btn btn-primary">Sign up now</a>
</div>"#
        .to_string()
}

pub fn home(view: &ProfileView, messages: &[MessageRow], liked: &HashSet<i64>) -> String {
    let u = &view.user;
    format!(
        r#"<div class="row">
  <aside class="user-card">
    <a href="/users/{id}"><img src="{img}" alt="{name}" class="card-avatar"></a>
    <p><a href="/users/{id}">@{name_text}</a></p>
    <ul class="user-stats">
      <li><a href="/users/{id}">Messages <span>{messages_count}</span></a></li>
      <li><a href="/users/{id}/following">Following <span>{following}</span></a></li>
      <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
    </ul>
  </aside>
  <div class="timeline">
    {list}
  </div>
</div>"#,
        id = u.id,
        img = attr(&u.image_url),
        name = attr(&u.username),
        name_text = text(&u.username),
        messages_count = view.stats.messages,
        following = view.stats.following,
        followers = view.stats.followers,
        list = message_list(messages, liked, Some(u.id)),
    )
}

pub fn signup_form(form: &SignupForm, errors: &[String]) -> String {
    format!(
        r#"<h2 class="join-message">Join Warbler today.</h2>
{errors}
<form method="POST" action="/signup" class="auth-form">
  <input name="username" placeholder="Username" value="{username}">
  <input name="email" type="email" placeholder="E-mail" value="{email}">
  <input name="password" type="password" placeholder="Password">
  <input name="image_url" placeholder="(Optional) Image URL" value="{image_url}">
  <button class="btn btn-primary">Sign me up!</button>
</form>"#,
        errors = error_list(errors),
        username = attr(&form.username),
        email = attr(&form.email),
        image_url = attr(&form.image_url),
    )
}

pub fn login_form(form: &LoginForm, errors: &[String]) -> String {
    format!(
        r#"<h2 class="join-message">Welcome back.</h2>
{errors}
<form method="POST" action="/login" class="auth-form">
  <input name="username" placeholder="Username" value="{username}">
  <input name="password" type="password" placeholder="Password">
  <button class="btn btn-primary">Log in</button>
</form>"#,
        errors = error_list(errors),
        username = attr(&form.username),
    )
}

pub fn users_index(users: &[UserRow], query: Option<&str>, viewer: Option<&UserRow>, following: &HashSet<i64>) -> String {
    if users.is_empty() {
        return match query {
            Some(q) => format!(r#"<h3>Sorry, no users found matching "{}".</h3>"#, text(q)),
            None => "<h3>Sorry, no users found.</h3>".to_string(),
        };
    }
    format!(r#"<div class="user-grid">{}</div>"#, user_cards(users, viewer, following))
}

pub fn user_show(view: &ProfileView, viewer: Option<&UserRow>, messages: &[MessageRow], liked: &HashSet<i64>) -> String {
    format!(
        "{}\n<div class=\"timeline\">{}</div>",
        profile_header(view, viewer),
        message_list(messages, liked, viewer.map(|v| v.id)),
    )
}

pub fn user_list_page(view: &ProfileView, viewer: &UserRow, users: &[UserRow], following: &HashSet<i64>) -> String {
    format!(
        "{}\n<div class=\"user-grid\">{}</div>",
        profile_header(view, Some(viewer)),
        user_cards(users, Some(viewer), following),
    )
}

pub fn likes_page(view: &ProfileView, viewer: &UserRow, messages: &[MessageRow], liked: &HashSet<i64>) -> String {
    user_show(view, Some(viewer), messages, liked)
}

pub fn edit_profile(form: &ProfileForm, errors: &[String]) -> String {
    format!(
        r#"<h2 class="join-message">Edit Your Profile.</h2>
{errors}
<form method="POST" action="/users/profile" class="auth-form">
  <input name="username" placeholder="Username" value="{username}">
  <input name="email" type="email" placeholder="E-mail" value="{email}">
  <input name="image_url" placeholder="(Optional) Image URL" value="{image_url}">
  <input name="header_image_url" placeholder="(Optional) Header Image URL" value="{header_image_url}">
  <textarea name="bio" placeholder="(Optional) Tell us about yourself">{bio}</textarea>
  <input name="location" placeholder="(Optional) Location" value="{location}">
  <p>To confirm changes, enter your password:</p>
  <input name="password" type="password" placeholder="Password">
  <div class="edit-btn-area">
    <button class="btn btn-success">Edit this user!</button>
  </div>
</form>"#,
        errors = error_list(errors),
        username = attr(&form.username),
        email = attr(&form.email),
        image_url = attr(&form.image_url),
        header_image_url = attr(&form.header_image_url),
        bio = text(&form.bio),
        location = attr(&form.location),
    )
}

pub fn new_message(form: &MessageForm, errors: &[String]) -> String {
    format!(
        r#"{errors}
<form method="POST" action="/messages/new" class="message-form">
  <textarea name="text" placeholder="What's happening?" maxlength="140">{body}</textarea>
  <button class="btn btn-success">Add my message!</button>
</form>"#,
        errors = error_list(errors),
        body = text(&form.text),
    )
}

pub fn message_show(message: &MessageRow, viewer: Option<&UserRow>) -> String {
    let delete = match viewer {
        Some(v) if v.id == message.user_id => format!(
            r#"<form method="POST" action="/messages/{}/delete">
      <button class="btn btn-outline-danger">Delete</button>
    </form>"#,
            message.id
        ),
        _ => String::new(),
    };
    format!(
        r#"<div class="message-area">
  <div class="message-heading">
    <a href="/users/{user_id}"><img src="{img}" alt="" class="timeline-image"></a>
    <a href="/users/{user_id}">@{username}</a>
    {delete}
  </div>
  <p class="single-message">{body}</p>
  <span class="text-muted">{timestamp}</span>
</div>"#,
        user_id = message.user_id,
        img = attr(&message.user_image_url),
        username = text(&message.username),
        body = text(&message.text),
        timestamp = message.timestamp.format("%d %B %Y"),
    )
}

pub fn not_found() -> String {
    r#"<div class="not-found">
  <h1>404</h1>
  <p>Sorry, that page doesn't exist.</p>
  <a href="/">Take me home</a>
</div>"#
        .to_string()
}

pub fn forbidden() -> String {
    r#"<div class="not-found">
  <h1>403</h1>
  <p>You can't do that.</p>
</div>"#
        .to_string()
}

fn profile_header(view: &ProfileView, viewer: Option<&UserRow>) -> String {
    let u = &view.user;
    let actions = match viewer {
        Some(v) if v.id == u.id => r#"<a href="/users/profile" class="btn btn-outline-secondary">Edit Profile</a>
      <form method="POST" action="/users/delete" class="inline">
        <button class="btn btn-outline-danger">Delete Profile</button>
      </form>"#
            .to_string(),
        Some(_) => follow_button(u.id, view.followed_by_viewer),
        None => String::new(),
    };

    format!(
        r#"<div class="profile-header" style="background-image: url('{header}')"></div>
<div class="profile-bar">
  <img src="{img}" alt="{name}" class="profile-avatar">
  <ul class="user-stats">
    <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
    <li><a href="/users/{id}/following">Following <span>{following}</span></a></li>
    <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
    <li><a href="/users/{id}/likes">Likes <span>{likes}</span></a></li>
  </ul>
  <div class="profile-actions">
      {actions}
  </div>
</div>
<div class="profile-info">
  <h4 class="profile-username">@{name_text}</h4>
  <p class="user-bio">{bio}</p>
  <p class="user-location">{location}</p>
</div>"#,
        header = attr(&u.header_image_url),
        img = attr(&u.image_url),
        name = attr(&u.username),
        id = u.id,
        messages = view.stats.messages,
        following = view.stats.following,
        followers = view.stats.followers,
        likes = view.stats.likes,
        name_text = text(&u.username),
        bio = text(u.bio.as_deref().unwrap_or_default()),
        location = text(u.location.as_deref().unwrap_or_default()),
    )
}

fn follow_button(user_id: i64, following: bool) -> String {
    if following {
        format!(
            r#"<form method="POST" action="/users/stop-following/{user_id}" class="inline">
        <button class="btn btn-primary">Unfollow</button>
      </form>"#
        )
    } else {
        format!(
            r#"<form method="POST" action="/users/follow/{user_id}" class="inline">
        <button class="btn btn-outline-primary">Follow</button>
      </form>"#
        )
    }
}

fn user_cards(users: &[UserRow], viewer: Option<&UserRow>, following: &HashSet<i64>) -> String {
    users
        .iter()
        .map(|u| {
            let button = match viewer {
                Some(v) if v.id != u.id => follow_button(u.id, following.contains(&u.id)),
                _ => String::new(),
            };
            format!(
                r#"<div class="card user-card">
  <a href="/users/{id}"><img src="{img}" alt="Image for {name}" class="card-avatar"></a>
  <a href="/users/{id}" class="card-username">@{name_text}</a>
  {button}
  <p class="card-bio">{bio}</p>
</div>"#,
                id = u.id,
                img = attr(&u.image_url),
                name = attr(&u.username),
                name_text = text(&u.username),
                bio = text(u.bio.as_deref().unwrap_or_default()),
            )
        })
        .collect()
}

fn message_list(messages: &[MessageRow], liked: &HashSet<i64>, viewer_id: Option<i64>) -> String {
    if messages.is_empty() {
        return r#"<p class="empty-timeline">No messages yet.</p>"#.to_string();
    }

    let items: String = messages
        .iter()
        .map(|m| {
            let like = match viewer_id {
                Some(v) if v != m.user_id => {
                    let (class, star) = if liked.contains(&m.id) {
                        ("btn-primary", "&#9733;")
                    } else {
                        ("btn-secondary", "&#9734;")
                    };
                    format!(
                        r#"<form method="POST" action="/users/add_like/{id}" class="messages-like">
        <button class="btn btn-sm {class}">{star}</button>
      </form>"#,
                        id = m.id
                    )
                }
                _ => String::new(),
            };
            format!(
                r#"<li class="list-group-item">
    <a href="/messages/{id}" class="message-link"></a>
    <a href="/users/{user_id}"><img src="{img}" alt="" class="timeline-image"></a>
    <div class="message-area">
      <a href="/users/{user_id}">@{username}</a>
      <span class="text-muted">{timestamp}</span>
      <p>{body}</p>
    </div>
    {like}
  </li>"#,
                id = m.id,
                user_id = m.user_id,
                img = attr(&m.user_image_url),
                username = text(&m.username),
                timestamp = m.timestamp.format("%d %B %Y"),
                body = text(&m.text),
            )
        })
        .collect();

    format!(r#"<ul class="list-group" id="messages">{items}</ul>"#)
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", text(e)))
        .collect();
    format!(r#"<ul class="form-errors">{items}</ul>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_escapes_flash_text() {
        let html = layout(
            "t",
            None,
            &[Flash { category: "danger".into(), message: "<script>".into() }],
            "",
        );
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="/signup""#));
    }
}
