//! Database Migrations
//!
//! Handles schema creation and versioned migrations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

/// Current database schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create migrations table if it doesn't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    if current_version < SCHEMA_VERSION {
        info!(
            "Running database migrations from v{} to v{}",
            current_version, SCHEMA_VERSION
        );

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Run a specific migration version
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let (name, sql) = match version {
        1 => ("pipeline_core", MIGRATION_V1),
        2 => ("voice_cache", MIGRATION_V2),
        _ => {
            warn!("Unknown migration version: {}", version);
            return Ok(());
        }
    };

    info!("Applying migration v{}: {}", version, name);

    for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim()).execute(pool).await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Migration v1: content items and provider credentials
const MIGRATION_V1: &str = r#"
-- Content items, stage-written only by the external production jobs
CREATE TABLE IF NOT EXISTS content_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'generating_script',
    progress INTEGER,
    video_source TEXT NOT NULL DEFAULT 'still_images',
    script_text TEXT,
    audio_url TEXT,
    image_urls TEXT NOT NULL DEFAULT '[]',
    footage_refs TEXT NOT NULL DEFAULT '[]',
    video_url TEXT,
    has_captions INTEGER NOT NULL DEFAULT 0,
    scheduled_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_content_items_channel ON content_items(channel_id);
CREATE INDEX IF NOT EXISTS idx_content_items_status ON content_items(status);

-- One API key per provider: uniqueness is a schema guarantee, not a
-- first-row-wins accident
CREATE TABLE IF NOT EXISTS provider_credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider TEXT NOT NULL UNIQUE,
    api_key TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Migration v2: normalized voice cache
const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS voice_cache (
    provider TEXT NOT NULL,
    voice_id TEXT NOT NULL,
    name TEXT NOT NULL,
    language TEXT,
    category TEXT,
    preview_url TEXT,
    description TEXT,
    extra TEXT NOT NULL DEFAULT '{}',
    cached_at TEXT NOT NULL,
    PRIMARY KEY (provider, voice_id)
);
"#;
