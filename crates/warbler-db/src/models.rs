//! Database row types. These map directly to SQLite rows.

use std::fmt;

use chrono::{DateTime, Utc};

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.svg";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.svg";

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

impl fmt::Display for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    /// Author's username, joined in by the listing queries.
    pub username: String,
    pub user_image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

/// Profile fields a user may edit.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}
