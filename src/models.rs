//! Core data records that flow through ingestion, analysis and search.
//!
//! A [`RepositoryRef`] owns a set of [`FileRecord`]s and an append-only log
//! of [`SearchRecord`]s. Relationship scores are derived on demand and are
//! never persisted.

use serde::Serialize;

/// A repository known to the store. Identity is `(owner, name)`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepositoryRef {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub created_at: i64,
}

/// Fields needed to create a [`RepositoryRef`].
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub owner: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
}

/// One ingested text file.
///
/// `content` never changes after creation. Only the preview cache and the
/// analysis fields are written afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: String,
    pub repository_id: String,
    pub path: String,
    /// Extension of the bare filename, or empty.
    pub file_type: String,
    pub size_bytes: i64,
    pub content: String,
    pub preview_cache: Option<String>,
    /// Line limit the cached preview was rendered with.
    pub preview_lines: Option<i64>,
    pub analysis: Option<String>,
    pub analyzed_at: Option<i64>,
}

impl FileRecord {
    pub fn is_analyzed(&self) -> bool {
        self.analysis.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn total_lines(&self) -> usize {
        self.content.lines().count()
    }
}

/// Fields needed to create a [`FileRecord`].
#[derive(Debug, Clone)]
pub struct NewFile {
    pub repository_id: String,
    pub path: String,
    pub file_type: String,
    pub content: String,
}

/// One entry in the append-only search log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRecord {
    pub id: String,
    pub repository_id: String,
    pub query: String,
    pub result_text: String,
    pub created_at: i64,
}

/// A ranked neighbour of some target file. Derived, not persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelationshipScore {
    pub file_path: String,
    pub relationship_score: u32,
    pub file_type: String,
}

pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
