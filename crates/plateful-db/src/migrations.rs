use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            role            TEXT NOT NULL DEFAULT 'user',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT NOT NULL REFERENCES users(id),
            description     TEXT NOT NULL,
            category        TEXT NOT NULL DEFAULT 'other',
            quantity        TEXT NOT NULL DEFAULT '',
            dietary_tags    TEXT NOT NULL DEFAULT '',
            location        TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'active',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            expires_at      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_posts_owner
            ON posts(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS claims (
            id              TEXT PRIMARY KEY,
            post_id         TEXT NOT NULL REFERENCES posts(id),
            claimer_id      TEXT NOT NULL REFERENCES users(id),
            message         TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            decided_at      TEXT,
            UNIQUE(post_id, claimer_id)
        );

        CREATE INDEX IF NOT EXISTS idx_claims_post
            ON claims(post_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
