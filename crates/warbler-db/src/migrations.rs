use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY,
            email               TEXT NOT NULL UNIQUE CHECK (length(trim(email)) > 0),
            username            TEXT NOT NULL UNIQUE CHECK (length(trim(username)) > 0),
            image_url           TEXT NOT NULL DEFAULT '/static/images/default-pic.svg',
            header_image_url    TEXT NOT NULL DEFAULT '/static/images/warbler-hero.svg',
            bio                 TEXT,
            location            TEXT,
            password            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY,
            text        TEXT NOT NULL CHECK (length(text) BETWEEN 1 AND 140),
            timestamp   TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user
            ON messages(user_id, timestamp);

        CREATE TABLE IF NOT EXISTS follows (
            user_being_followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            user_following_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (user_being_followed_id, user_following_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_follower
            ON follows(user_following_id);

        CREATE TABLE IF NOT EXISTS likes (
            id          INTEGER PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            UNIQUE(user_id, message_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
