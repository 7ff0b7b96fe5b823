use chrono::Utc;
use rusqlite::{Row, params};

use crate::models::MessageRow;
use crate::{Database, OptionalExt, Result};

// JOIN users to fetch the author in the same query
pub(crate) const MESSAGE_SELECT: &str =
    "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON u.id = m.user_id";

impl Database {
    pub fn create_message(&self, user_id: i64, text: &str) -> Result<MessageRow> {
        let now = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                params![text, now, user_id],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
                [id],
                message_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
                [id],
                message_from_row,
            )
            .optional()
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// The user's own messages, newest first.
    pub fn messages_for_user(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Messages by the user and everyone they follow, newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                    OR m.user_id IN (
                        SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                    )
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_messages(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        user_image_url: row.get(5)?,
    })
}
