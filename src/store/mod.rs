//! Storage abstraction for repositories, files and the search log.
//!
//! The [`Store`] trait is CRUD-by-identity plus filtering by repository.
//! Two backends implement it:
//!
//! - [`SqliteStore`] : `sqlx` over the schema created by [`crate::migrate`].
//! - [`InMemoryStore`] : `RwLock`-guarded maps, used by tests.
//!
//! Implementations must be `Send + Sync`; the service shares one store
//! between concurrent requests behind an `Arc`.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{FileRecord, NewFile, NewRepository, RepositoryRef, SearchRecord};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_repository`](Store::find_repository) | Look up by `(owner, name)` |
/// | [`create_repository`](Store::create_repository) | Insert a new repository |
/// | [`delete_repository`](Store::delete_repository) | Remove a repository, its files and searches |
/// | [`purge_files`](Store::purge_files) | Drop every file of a repository before re-ingestion |
/// | [`insert_file`](Store::insert_file) | Insert one file; paths are unique per repository |
/// | [`list_files`](Store::list_files) | All files of a repository in path order |
/// | [`set_preview_cache`](Store::set_preview_cache) | Cache a rendered preview with its line limit |
/// | [`set_analysis`](Store::set_analysis) | Record analysis text and time |
/// | [`append_search`](Store::append_search) | Append to the search log |
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_repository(&self, owner: &str, name: &str) -> Result<Option<RepositoryRef>>;

    async fn get_repository(&self, id: &str) -> Result<Option<RepositoryRef>>;

    /// Fails if `(owner, name)` already exists.
    async fn create_repository(&self, repo: &NewRepository) -> Result<RepositoryRef>;

    /// All repositories ordered by `(owner, name)`.
    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>>;

    /// Returns `false` when no repository had this id.
    async fn delete_repository(&self, id: &str) -> Result<bool>;

    /// Returns the number of files removed.
    async fn purge_files(&self, repository_id: &str) -> Result<u64>;

    /// `size_bytes` is taken from the UTF-8 length of `content`.
    async fn insert_file(&self, file: &NewFile) -> Result<FileRecord>;

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>>;

    async fn list_files(&self, repository_id: &str) -> Result<Vec<FileRecord>>;

    async fn count_files(&self, repository_id: &str) -> Result<u64>;

    async fn set_preview_cache(&self, file_id: &str, preview: &str, lines: i64) -> Result<()>;

    async fn set_analysis(&self, file_id: &str, analysis: &str, analyzed_at: i64) -> Result<()>;

    async fn append_search(
        &self,
        repository_id: &str,
        query: &str,
        result_text: &str,
    ) -> Result<SearchRecord>;

    /// Search log of a repository, oldest first.
    async fn list_searches(&self, repository_id: &str) -> Result<Vec<SearchRecord>>;
}
