//! Table bootstrap for the SQLite-backed store.
//!
//! Grounded in `wkmp-common`'s `db::init` module: sequential
//! `CREATE TABLE IF NOT EXISTS` statements executed against the pool rather
//! than a sqlx migration directory, since the schema is small and owned
//! entirely by this crate.

use sqlx::SqlitePool;

use crate::error::Result;

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id              TEXT PRIMARY KEY,
            source_path     TEXT NOT NULL UNIQUE,
            kind            TEXT NOT NULL,
            byte_size       INTEGER NOT NULL,
            duration_ms     INTEGER,
            source_language TEXT,
            created_at      TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stage_status (
            file_id             TEXT NOT NULL,
            stage               TEXT NOT NULL,
            status              TEXT NOT NULL,
            last_started_at     TEXT,
            last_completed_at   TEXT,
            attempt_count       INTEGER NOT NULL DEFAULT 0,
            last_error_kind     TEXT,
            last_error_detail   TEXT,
            lease_owner         TEXT,
            lease_acquired_at   TEXT,
            lease_deadline      TEXT,
            PRIMARY KEY (file_id, stage),
            FOREIGN KEY (file_id) REFERENCES files(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS segments (
            file_id         TEXT NOT NULL,
            ordinal         INTEGER NOT NULL,
            start_ms        INTEGER NOT NULL,
            end_ms          INTEGER NOT NULL,
            source_text     TEXT NOT NULL,
            source_language TEXT,
            non_verbal      INTEGER NOT NULL DEFAULT 0,
            overlapping     INTEGER NOT NULL DEFAULT 0,
            translations    TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (file_id, ordinal),
            FOREIGN KEY (file_id) REFERENCES files(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            file_id     TEXT NOT NULL,
            stage       TEXT NOT NULL,
            kind        TEXT NOT NULL,
            path        TEXT NOT NULL,
            sha256      TEXT NOT NULL,
            byte_size   INTEGER NOT NULL,
            PRIMARY KEY (file_id, stage, kind),
            FOREIGN KEY (file_id) REFERENCES files(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stage_status_status ON stage_status (stage, status)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_stage_status_lease_deadline ON stage_status (lease_deadline)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
