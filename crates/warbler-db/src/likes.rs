use rusqlite::{OptionalExtension as _, params};

use crate::messages::{MESSAGE_SELECT, message_from_row};
use crate::models::{LikeRow, MessageRow};
use crate::{Database, Result};

impl Database {
    /// Liking the same message twice is an integrity error.
    pub fn like(&self, user_id: i64, message_id: i64) -> Result<LikeRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                params![user_id, message_id],
            )?;
            Ok(LikeRow {
                id: conn.last_insert_rowid(),
                user_id,
                message_id,
            })
        })
    }

    pub fn unlike(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Toggle a like: removes if exists, inserts if not.
    /// Returns true when the message is now liked.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    params![user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [id])?;
                Ok(false)
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                    params![user_id, message_id],
                )?;
                Ok(true)
            }
        })
    }

    pub fn likes_for_user(&self, user_id: i64) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, user_id, message_id FROM likes WHERE user_id = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(LikeRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        message_id: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn liked_message_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .likes_for_user(user_id)?
            .into_iter()
            .map(|l| l.message_id)
            .collect())
    }

    /// Messages the user liked, newest first.
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
