use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create repositories table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS repositories (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            UNIQUE(owner, name)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create files table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            repository_id TEXT NOT NULL,
            path TEXT NOT NULL,
            file_type TEXT NOT NULL DEFAULT '',
            size_bytes INTEGER NOT NULL,
            content TEXT NOT NULL,
            preview_cache TEXT,
            preview_lines INTEGER,
            analysis TEXT,
            analyzed_at INTEGER,
            UNIQUE(repository_id, path),
            FOREIGN KEY (repository_id) REFERENCES repositories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create searches table (append-only)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS searches (
            id TEXT PRIMARY KEY,
            repository_id TEXT NOT NULL,
            query TEXT NOT NULL,
            result_text TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (repository_id) REFERENCES repositories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_repository_id ON files(repository_id)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_searches_repository_id ON searches(repository_id, created_at)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
