use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, ProfileUpdate, UserRow};
use crate::{Database, DbError, OptionalExt, Result};

pub(crate) const USER_COLUMNS: &str =
    "id, email, username, image_url, header_image_url, bio, location, password";

impl Database {
    /// Hash the password and insert a new user.
    ///
    /// A missing password is rejected before anything is written. A missing
    /// or blank username or email, or one that is already taken, is rejected
    /// by the table constraints and comes back as [`DbError::Integrity`].
    pub fn signup(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<UserRow> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(DbError::MissingPassword)?;
        let password_hash = hash_password(password)?;
        let image_url = non_empty(image_url).unwrap_or(DEFAULT_IMAGE_URL);
        let (username, email) = (non_empty(username), non_empty(email));

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, image_url],
            )?;
            let id = conn.last_insert_rowid();
            debug!(user_id = id, "user signed up");
            fetch_user(conn, id)
        })
    }

    /// Returns the user when the credentials match, `None` otherwise.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };
        Ok(verify_password(password, &user.password).then_some(user))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                [username],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users whose username contains `query`, matched literally.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ESCAPE '\\' ORDER BY username"
            ))?;
            let rows = stmt
                .query_map([pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<UserRow> {
        let image_url = non_empty(update.image_url.as_deref()).unwrap_or(DEFAULT_IMAGE_URL);
        let header_image_url =
            non_empty(update.header_image_url.as_deref()).unwrap_or(DEFAULT_HEADER_IMAGE_URL);

        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4,
                     bio = ?5, location = ?6
                 WHERE id = ?7",
                params![
                    update.username,
                    update.email,
                    image_url,
                    header_image_url,
                    non_empty(update.bio.as_deref()),
                    non_empty(update.location.as_deref()),
                    id
                ],
            )?;
            fetch_user(conn, id)
        })
    }

    /// Deletes the user; messages, follows and likes go with it.
    /// Returns false when no such user existed.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn fetch_user(conn: &Connection, id: i64) -> Result<UserRow> {
    let user = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        user_from_row,
    )?;
    Ok(user)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_two_users() -> (Database, UserRow, UserRow) {
        let db = Database::open_in_memory().unwrap();
        let u1 = db
            .signup(Some("test1"), Some("test1@test.com"), Some("password"), None)
            .unwrap();
        let u2 = db
            .signup(Some("test2"), Some("test2@test.com"), Some("password"), None)
            .unwrap();
        (db, u1, u2)
    }

    #[test]
    fn new_user_has_no_messages_or_followers() {
        let db = Database::open_in_memory().unwrap();
        let u = db
            .signup(Some("testuser"), Some("test@test.com"), Some("HASHED_PASSWORD"), None)
            .unwrap();

        assert!(db.messages_for_user(u.id, 100).unwrap().is_empty());
        assert!(db.followers(u.id).unwrap().is_empty());
        assert!(db.following(u.id).unwrap().is_empty());
    }

    #[test]
    fn display_shows_id_username_and_email() {
        let (_db, u1, _) = db_with_two_users();
        assert_eq!(u1.to_string(), format!("<User #{}: test1, test1@test.com>", u1.id));
    }

    #[test]
    fn signup_hashes_password() {
        let (db, _, _) = db_with_two_users();
        let user = db
            .signup(Some("testtest"), Some("testtest@test.com"), Some("password"), None)
            .unwrap();

        let fetched = db.get_user(user.id).unwrap().expect("user persisted");
        assert_eq!(fetched.username, "testtest");
        assert_eq!(fetched.email, "testtest@test.com");
        assert_ne!(fetched.password, "password");
        assert!(fetched.password.starts_with("$argon2id$"));
        assert_eq!(fetched.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(fetched.header_image_url, DEFAULT_HEADER_IMAGE_URL);
    }

    #[test]
    fn signup_without_username_is_integrity_error() {
        let (db, _, _) = db_with_two_users();
        let err = db
            .signup(None, Some("test3@test.com"), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");
    }

    #[test]
    fn signup_without_email_is_integrity_error() {
        let (db, _, _) = db_with_two_users();
        let err = db
            .signup(Some("testuser3"), None, Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");
    }

    #[test]
    fn signup_with_blank_username_or_email_is_integrity_error() {
        let (db, _, _) = db_with_two_users();
        let err = db
            .signup(Some(""), Some(""), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");

        let err = db
            .signup(Some("   "), Some("x@y.z"), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");

        let err = db
            .signup(Some("testuser3"), Some("  "), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");
        assert_eq!(db.list_users().unwrap().len(), 2);
    }

    #[test]
    fn signup_trims_username_and_email() {
        let (db, _, _) = db_with_two_users();
        let user = db
            .signup(Some(" spaced "), Some(" spaced@test.com "), Some("password"), None)
            .unwrap();
        assert_eq!(user.username, "spaced");
        assert_eq!(user.email, "spaced@test.com");
    }

    #[test]
    fn update_profile_rejects_blank_username() {
        let (db, u1, _) = db_with_two_users();
        let blank = ProfileUpdate {
            username: "  ".into(),
            email: "test1@test.com".into(),
            ..Default::default()
        };
        assert!(db.update_profile(u1.id, &blank).unwrap_err().is_integrity());
        assert_eq!(db.get_user(u1.id).unwrap().unwrap().username, "test1");
    }

    #[test]
    fn signup_without_password_is_rejected_before_insert() {
        let (db, _, _) = db_with_two_users();
        let err = db
            .signup(Some("testuser3"), Some("test3@test.com"), None, None)
            .unwrap_err();
        assert!(matches!(err, DbError::MissingPassword));

        let err = db
            .signup(Some("testuser3"), Some("test3@test.com"), Some(""), None)
            .unwrap_err();
        assert!(matches!(err, DbError::MissingPassword));
        assert!(db.get_user_by_username("testuser3").unwrap().is_none());
    }

    #[test]
    fn signup_with_taken_username_or_email_is_integrity_error() {
        let (db, _, _) = db_with_two_users();
        let err = db
            .signup(Some("test1"), Some("other@test.com"), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity());

        let err = db
            .signup(Some("other"), Some("test1@test.com"), Some("password"), None)
            .unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn authenticate_with_valid_credentials() {
        let (db, u1, _) = db_with_two_users();
        let user = db.authenticate("test1", "password").unwrap();
        assert_eq!(user.map(|u| u.id), Some(u1.id));
    }

    #[test]
    fn authenticate_with_unknown_username() {
        let (db, _, _) = db_with_two_users();
        assert!(db.authenticate("nonusername", "password").unwrap().is_none());
    }

    #[test]
    fn authenticate_with_wrong_password() {
        let (db, _, _) = db_with_two_users();
        assert!(db.authenticate("test1", "badpassword").unwrap().is_none());
    }

    #[test]
    fn search_matches_substring_literally() {
        let (db, _, _) = db_with_two_users();
        db.signup(Some("under_score"), Some("u@test.com"), Some("password"), None)
            .unwrap();

        let names: Vec<_> = db
            .search_users("test")
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["test1", "test2"]);

        let names: Vec<_> = db
            .search_users("_")
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["under_score"]);
    }

    #[test]
    fn update_profile_resets_blank_images_and_checks_uniqueness() {
        let (db, u1, _) = db_with_two_users();
        let updated = db
            .update_profile(
                u1.id,
                &ProfileUpdate {
                    username: "renamed".into(),
                    email: "renamed@test.com".into(),
                    image_url: Some("".into()),
                    header_image_url: None,
                    bio: Some("hello".into()),
                    location: Some("  ".into()),
                },
            )
            .unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.location, None);

        let clash = ProfileUpdate {
            username: "test2".into(),
            email: "renamed@test.com".into(),
            ..Default::default()
        };
        assert!(db.update_profile(u1.id, &clash).unwrap_err().is_integrity());
    }

    #[test]
    fn delete_user_cascades() {
        let (db, u1, u2) = db_with_two_users();
        let m1 = db.create_message(u1.id, "mine").unwrap();
        let m2 = db.create_message(u2.id, "theirs").unwrap();
        db.follow(u1.id, u2.id).unwrap();
        db.follow(u2.id, u1.id).unwrap();
        db.like(u2.id, m1.id).unwrap();
        db.like(u1.id, m2.id).unwrap();

        assert!(db.delete_user(u1.id).unwrap());
        assert!(db.get_user(u1.id).unwrap().is_none());
        assert!(db.get_message(m1.id).unwrap().is_none());
        assert!(db.followers(u2.id).unwrap().is_empty());
        assert!(db.following(u2.id).unwrap().is_empty());
        assert!(db.likes_for_user(u2.id).unwrap().is_empty());
        assert!(!db.delete_user(u1.id).unwrap());
    }
}
