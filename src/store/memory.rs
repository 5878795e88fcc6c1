//! In-memory [`Store`] implementation for tests.
//!
//! Repositories and files live in `HashMap`s keyed by id and searches in an
//! append-only `Vec`, each behind a `std::sync::RwLock`. Uniqueness rules
//! match the SQLite schema.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{FileRecord, NewFile, NewRepository, RepositoryRef, SearchRecord};

use super::Store;

pub struct InMemoryStore {
    repositories: RwLock<HashMap<String, RepositoryRef>>,
    files: RwLock<HashMap<String, FileRecord>>,
    searches: RwLock<Vec<SearchRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            repositories: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            searches: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_repository(&self, owner: &str, name: &str) -> Result<Option<RepositoryRef>> {
        let repos = self.repositories.read().map_err(poisoned)?;
        Ok(repos
            .values()
            .find(|r| r.owner == owner && r.name == name)
            .cloned())
    }

    async fn get_repository(&self, id: &str) -> Result<Option<RepositoryRef>> {
        let repos = self.repositories.read().map_err(poisoned)?;
        Ok(repos.get(id).cloned())
    }

    async fn create_repository(&self, repo: &NewRepository) -> Result<RepositoryRef> {
        let mut repos = self.repositories.write().map_err(poisoned)?;
        if repos
            .values()
            .any(|r| r.owner == repo.owner && r.name == repo.name)
        {
            bail!("repository {}/{} already exists", repo.owner, repo.name);
        }
        let record = RepositoryRef {
            id: Uuid::new_v4().to_string(),
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            url: repo.url.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            created_at: chrono::Utc::now().timestamp(),
        };
        repos.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>> {
        let repos = self.repositories.read().map_err(poisoned)?;
        let mut all: Vec<RepositoryRef> = repos.values().cloned().collect();
        all.sort_by(|a, b| (&a.owner, &a.name).cmp(&(&b.owner, &b.name)));
        Ok(all)
    }

    async fn delete_repository(&self, id: &str) -> Result<bool> {
        let removed = self
            .repositories
            .write()
            .map_err(poisoned)?
            .remove(id)
            .is_some();
        if removed {
            self.files
                .write()
                .map_err(poisoned)?
                .retain(|_, f| f.repository_id != id);
            self.searches
                .write()
                .map_err(poisoned)?
                .retain(|s| s.repository_id != id);
        }
        Ok(removed)
    }

    async fn purge_files(&self, repository_id: &str) -> Result<u64> {
        let mut files = self.files.write().map_err(poisoned)?;
        let before = files.len();
        files.retain(|_, f| f.repository_id != repository_id);
        Ok((before - files.len()) as u64)
    }

    async fn insert_file(&self, file: &NewFile) -> Result<FileRecord> {
        if !self
            .repositories
            .read()
            .map_err(poisoned)?
            .contains_key(&file.repository_id)
        {
            bail!("unknown repository {}", file.repository_id);
        }

        let mut files = self.files.write().map_err(poisoned)?;
        if files
            .values()
            .any(|f| f.repository_id == file.repository_id && f.path == file.path)
        {
            bail!("duplicate path {} in repository", file.path);
        }
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
        files.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.get(id).cloned())
    }

    async fn list_files(&self, repository_id: &str) -> Result<Vec<FileRecord>> {
        let files = self.files.read().map_err(poisoned)?;
        let mut matching: Vec<FileRecord> = files
            .values()
            .filter(|f| f.repository_id == repository_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(matching)
    }

    async fn count_files(&self, repository_id: &str) -> Result<u64> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files
            .values()
            .filter(|f| f.repository_id == repository_id)
            .count() as u64)
    }

    async fn set_preview_cache(&self, file_id: &str, preview: &str, lines: i64) -> Result<()> {
        let mut files = self.files.write().map_err(poisoned)?;
        let file = files
            .get_mut(file_id)
            .ok_or_else(|| anyhow!("unknown file {}", file_id))?;
        file.preview_cache = Some(preview.to_string());
        file.preview_lines = Some(lines);
        Ok(())
    }

    async fn set_analysis(&self, file_id: &str, analysis: &str, analyzed_at: i64) -> Result<()> {
        let mut files = self.files.write().map_err(poisoned)?;
        let file = files
            .get_mut(file_id)
            .ok_or_else(|| anyhow!("unknown file {}", file_id))?;
        file.analysis = Some(analysis.to_string());
        file.analyzed_at = Some(analyzed_at);
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
        self.searches
            .write()
            .map_err(poisoned)?
            .push(record.clone());
        Ok(record)
    }

    async fn list_searches(&self, repository_id: &str) -> Result<Vec<SearchRecord>> {
        let searches = self.searches.read().map_err(poisoned)?;
        Ok(searches
            .iter()
            .filter(|s| s.repository_id == repository_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_repo(owner: &str, name: &str) -> NewRepository {
        NewRepository {
            owner: owner.to_string(),
            name: name.to_string(),
            url: format!("https://github.com/{owner}/{name}"),
            description: String::new(),
            language: String::new(),
        }
    }

    fn new_file(repository_id: &str, path: &str, content: &str) -> NewFile {
        NewFile {
            repository_id: repository_id.to_string(),
            path: path.to_string(),
            file_type: crate::classify::file_type(path).to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_repository_identity_is_owner_and_name() {
        let store = InMemoryStore::new();
        let repo = store.create_repository(&new_repo("acme", "widgets")).await.unwrap();
        assert!(store.create_repository(&new_repo("acme", "widgets")).await.is_err());

        let found = store.find_repository("acme", "widgets").await.unwrap().unwrap();
        assert_eq!(found.id, repo.id);
        assert!(store.find_repository("acme", "gadgets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_files_unique_per_repository_and_listed_by_path() {
        let store = InMemoryStore::new();
        let repo = store.create_repository(&new_repo("a", "b")).await.unwrap();
        store.insert_file(&new_file(&repo.id, "src/z.rs", "z")).await.unwrap();
        store.insert_file(&new_file(&repo.id, "README.md", "héllo")).await.unwrap();
        assert!(store.insert_file(&new_file(&repo.id, "src/z.rs", "again")).await.is_err());

        let files = store.list_files(&repo.id).await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/z.rs"]);
        assert_eq!(files[0].size_bytes, 6);
        assert_eq!(store.count_files(&repo.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_requires_repository() {
        let store = InMemoryStore::new();
        assert!(store.insert_file(&new_file("missing", "a.py", "x")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = InMemoryStore::new();
        let repo = store.create_repository(&new_repo("a", "b")).await.unwrap();
        let file = store.insert_file(&new_file(&repo.id, "a.py", "x")).await.unwrap();
        store.append_search(&repo.id, "q", "r").await.unwrap();

        assert!(store.delete_repository(&repo.id).await.unwrap());
        assert!(store.get_file(&file.id).await.unwrap().is_none());
        assert!(store.list_searches(&repo.id).await.unwrap().is_empty());
        assert!(!store.delete_repository(&repo.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mutable_fields() {
        let store = InMemoryStore::new();
        let repo = store.create_repository(&new_repo("a", "b")).await.unwrap();
        let file = store.insert_file(&new_file(&repo.id, "a.py", "x")).await.unwrap();

        store.set_preview_cache(&file.id, "   1 | x", 20).await.unwrap();
        store.set_analysis(&file.id, "fine", 1_700_000_000).await.unwrap();

        let stored = store.get_file(&file.id).await.unwrap().unwrap();
        assert_eq!(stored.preview_cache.as_deref(), Some("   1 | x"));
        assert_eq!(stored.preview_lines, Some(20));
        assert!(stored.is_analyzed());
        assert_eq!(stored.content, "x");

        assert!(store.set_analysis("nope", "x", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_only_touches_one_repository() {
        let store = InMemoryStore::new();
        let a = store.create_repository(&new_repo("o", "a")).await.unwrap();
        let b = store.create_repository(&new_repo("o", "b")).await.unwrap();
        store.insert_file(&new_file(&a.id, "x.py", "1")).await.unwrap();
        store.insert_file(&new_file(&a.id, "y.py", "2")).await.unwrap();
        store.insert_file(&new_file(&b.id, "x.py", "3")).await.unwrap();

        assert_eq!(store.purge_files(&a.id).await.unwrap(), 2);
        assert_eq!(store.count_files(&a.id).await.unwrap(), 0);
        assert_eq!(store.count_files(&b.id).await.unwrap(), 1);
    }
}
