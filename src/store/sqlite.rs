//! SQLite-backed [`Store`] implementation.
//!
//! Every method is one or two statements against the `repositories`,
//! `files` and `searches` tables created by [`crate::migrate`]. Deleting a
//! repository relies on `ON DELETE CASCADE`, which needs the pool to be
//! opened through [`crate::db::connect`] (foreign keys on).

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{FileRecord, NewFile, NewRepository, RepositoryRef, SearchRecord};

use super::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const REPOSITORY_COLUMNS: &str = "id, owner, name, url, description, language, created_at";
const FILE_COLUMNS: &str = "id, repository_id, path, file_type, size_bytes, content, \
                            preview_cache, preview_lines, analysis, analyzed_at";

fn repository_from_row(row: &SqliteRow) -> RepositoryRef {
    RepositoryRef {
        id: row.get("id"),
        owner: row.get("owner"),
        name: row.get("name"),
        url: row.get("url"),
        description: row.get("description"),
        language: row.get("language"),
        created_at: row.get("created_at"),
    }
}

fn file_from_row(row: &SqliteRow) -> FileRecord {
    FileRecord {
        id: row.get("id"),
        repository_id: row.get("repository_id"),
        path: row.get("path"),
        file_type: row.get("file_type"),
        size_bytes: row.get("size_bytes"),
        content: row.get("content"),
        preview_cache: row.get("preview_cache"),
        preview_lines: row.get("preview_lines"),
        analysis: row.get("analysis"),
        analyzed_at: row.get("analyzed_at"),
    }
}

fn search_from_row(row: &SqliteRow) -> SearchRecord {
    SearchRecord {
        id: row.get("id"),
        repository_id: row.get("repository_id"),
        query: row.get("query"),
        result_text: row.get("result_text"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_repository(&self, owner: &str, name: &str) -> Result<Option<RepositoryRef>> {
        let row = sqlx::query(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE owner = ? AND name = ?"
        ))
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(repository_from_row))
    }

    async fn get_repository(&self, id: &str) -> Result<Option<RepositoryRef>> {
        let row = sqlx::query(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(repository_from_row))
    }

    async fn create_repository(&self, repo: &NewRepository) -> Result<RepositoryRef> {
        let record = RepositoryRef {
            id: Uuid::new_v4().to_string(),
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            url: repo.url.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            created_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query(
            r#"
            INSERT INTO repositories (id, owner, name, url, description, language, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner)
        .bind(&record.name)
        .bind(&record.url)
        .bind(&record.description)
        .bind(&record.language)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories ORDER BY owner ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(repository_from_row).collect())
    }

    async fn delete_repository(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM repositories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_files(&self, repository_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM files WHERE repository_id = ?")
            .bind(repository_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_file(&self, file: &NewFile) -> Result<FileRecord> {
        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            repository_id: file.repository_id.clone(),
            path: file.path.clone(),
            file_type: file.file_type.clone(),
            size_bytes: file.content.len() as i64,
            content: file.content.clone(),
            preview_cache: None,
            preview_lines: None,
            analysis: None,
            analyzed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO files (id, repository_id, path, file_type, size_bytes, content)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.repository_id)
        .bind(&record.path)
        .bind(&record.file_type)
        .bind(record.size_bytes)
        .bind(&record.content)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(file_from_row))
    }

    async fn list_files(&self, repository_id: &str) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE repository_id = ? ORDER BY path ASC"
        ))
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(file_from_row).collect())
    }

    async fn count_files(&self, repository_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE repository_id = ?")
            .bind(repository_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn set_preview_cache(&self, file_id: &str, preview: &str, lines: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE files SET preview_cache = ?, preview_lines = ? WHERE id = ?")
                .bind(preview)
                .bind(lines)
                .bind(file_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            bail!("unknown file {}", file_id);
        }
        Ok(())
    }

    async fn set_analysis(&self, file_id: &str, analysis: &str, analyzed_at: i64) -> Result<()> {
        let result = sqlx::query("UPDATE files SET analysis = ?, analyzed_at = ? WHERE id = ?")
            .bind(analysis)
            .bind(analyzed_at)
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("unknown file {}", file_id);
        }
        Ok(())
    }

    async fn append_search(
        &self,
        repository_id: &str,
        query: &str,
        result_text: &str,
    ) -> Result<SearchRecord> {
        let record = SearchRecord {
            id: Uuid::new_v4().to_string(),
            repository_id: repository_id.to_string(),
            query: query.to_string(),
            result_text: result_text.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query(
            r#"
            INSERT INTO searches (id, repository_id, query, result_text, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.repository_id)
        .bind(&record.query)
        .bind(&record.result_text)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_searches(&self, repository_id: &str) -> Result<Vec<SearchRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, repository_id, query, result_text, created_at
            FROM searches
            WHERE repository_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(search_from_row).collect())
    }
}
