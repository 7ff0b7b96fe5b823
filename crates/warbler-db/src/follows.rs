use rusqlite::params;

use crate::models::UserRow;
use crate::users::{USER_COLUMNS, user_from_row};
use crate::{Database, Result};

impl Database {
    /// `follower_id` starts following `followed_id`.
    /// Following twice is an integrity error.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
                params![followed_id, follower_id],
            )?;
            Ok(())
        })
    }

    /// Returns whether an edge was removed.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                params![followed_id, follower_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM follows
                    WHERE user_being_followed_id = ?1 AND user_following_id = ?2
                 )",
                params![followed_id, follower_id],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, user_id)
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE id IN (SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1)
                 ORDER BY username"
            ))?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE id IN (SELECT user_following_id FROM follows WHERE user_being_followed_id = ?1)
                 ORDER BY username"
            ))?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
