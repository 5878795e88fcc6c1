//! Request-level operations.
//!
//! [`Service`] ties the pipeline together: URL parsing, tree and content
//! fetching, storage, previews, the analysis cascade and relationship
//! scoring. The HTTP server and the CLI are thin wrappers around it.
//!
//! Every operation returns a plain serializable result or a
//! [`crate::Error`]. Upstream outages never surface as errors; they show up
//! as empty metadata, skipped files or heuristic output.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::classify::{file_type, is_text_file};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::github::{FileContent, GitHubClient, RepoInfo, TreeEntry};
use crate::llm::OllamaClient;
use crate::models::{format_ts_iso, NewFile, NewRepository, RelationshipScore, RepositoryRef};
use crate::relations;
use crate::repo_url::{parse_repo_url, RepoSlug};
use crate::store::{SqliteStore, Store};
use crate::{db, migrate};

/// Repository as shown in listings and ingestion reports.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySummary {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub created_at: String,
    pub file_count: u64,
}

impl RepositorySummary {
    fn new(repo: RepositoryRef, file_count: u64) -> Self {
        Self {
            id: repo.id,
            owner: repo.owner,
            name: repo.name,
            url: repo.url,
            description: repo.description,
            language: repo.language,
            created_at: format_ts_iso(repo.created_at),
            file_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestedFile {
    pub id: String,
    pub path: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub analyzed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The contents request failed or returned no payload.
    Unavailable,
    /// The decoded text was empty or whitespace only.
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub repository: RepositorySummary,
    /// Metadata as reported by the hosting API on this run.
    pub remote: RepoInfo,
    pub files: Vec<IngestedFile>,
    pub total_files: usize,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilePreview {
    pub file_id: String,
    pub file_path: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub preview: String,
    pub total_lines: usize,
    pub analyzed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub file_id: String,
    pub file_path: String,
    pub analysis: String,
    /// `None` when the heuristic fallback produced the text.
    pub model: Option<String>,
    pub analyzed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub search_query: String,
    pub results: String,
    pub files_searched: usize,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedFiles {
    pub file_id: String,
    pub file_path: String,
    pub related: Vec<RelationshipScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmStatus {
    pub available: bool,
    pub available_models: Vec<String>,
    pub recommended_models: Vec<String>,
}

/// Numbered preview of the first `lines` lines of `content`.
///
/// Each line renders as `format!("{:>4} | {}")`. When more lines remain,
/// a blank line and `... (N more lines)` are appended.
pub fn render_preview(content: &str, lines: usize) -> String {
    let all: Vec<&str> = content.lines().collect();
    let mut preview = all
        .iter()
        .take(lines)
        .enumerate()
        .map(|(i, line)| format!("{:>4} | {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n");

    if all.len() > lines {
        preview.push_str(&format!("\n\n... ({} more lines)", all.len() - lines));
    }
    preview
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

pub struct Service {
    config: Config,
    store: Arc<dyn Store>,
    github: GitHubClient,
    analyzer: Analyzer,
}

impl Service {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        github: GitHubClient,
        analyzer: Analyzer,
    ) -> Self {
        Self {
            config,
            store,
            github,
            analyzer,
        }
    }

    /// Production wiring: migrated SQLite store, GitHub client, Ollama gateway.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        migrate::run_migrations(config).await?;
        let pool = db::connect(config).await?;
        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
        let github = GitHubClient::new(&config.github)?;
        let gateway = Arc::new(OllamaClient::new(&config.models)?);
        let analyzer = Analyzer::new(gateway, config.models.clone());
        Ok(Self::new(config.clone(), store, github, analyzer))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Fetches a repository and stores every qualifying text file.
    ///
    /// Contents are fetched and decoded before anything is written. When no
    /// file yields storable text the run fails with [`Error::NoFiles`] and
    /// the store is untouched, including an existing repository's files.
    /// Re-ingesting an existing `(owner, name)` keeps the repository record
    /// and rebuilds its file set.
    pub async fn ingest(&self, url: &str) -> Result<IngestReport> {
        let url = required(url, "github_url")?;
        let slug = parse_repo_url(url).ok_or(Error::InvalidUrl)?;
        tracing::info!(repo = %slug, "ingesting repository");

        let remote = self.github.get_repo_info(&slug.owner, &slug.name).await;
        let tree = self
            .github
            .get_repo_files(&slug.owner, &slug.name, self.github.default_branch())
            .await;

        let candidates: Vec<TreeEntry> = tree
            .into_iter()
            .filter(|e| e.is_blob() && is_text_file(&e.path))
            .collect();
        tracing::info!(repo = %slug, candidates = candidates.len(), "fetching file contents");

        let mut outcomes: Vec<(String, FileContent)> = stream::iter(candidates)
            .map(|entry| self.fetch_entry(&slug, entry))
            .buffer_unordered(self.config.github.concurrency)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut storable = Vec::new();
        let mut skipped = Vec::new();
        for (path, content) in outcomes {
            let reason = match content.into_stored() {
                Some(text) if !text.trim().is_empty() => {
                    storable.push((path, text));
                    continue;
                }
                Some(_) => SkipReason::Empty,
                None => SkipReason::Unavailable,
            };
            tracing::debug!(path = %path, ?reason, "skipped file");
            skipped.push(SkippedFile { path, reason });
        }

        if storable.is_empty() {
            tracing::warn!(repo = %slug, skipped = skipped.len(), "no storable files");
            return Err(Error::NoFiles {
                owner: slug.owner,
                name: slug.name,
            });
        }

        let repository = match self.store.find_repository(&slug.owner, &slug.name).await? {
            Some(existing) => {
                let purged = self.store.purge_files(&existing.id).await?;
                tracing::info!(repo = %slug, purged, "cleared previous files");
                existing
            }
            None => {
                self.store
                    .create_repository(&NewRepository {
                        owner: slug.owner.clone(),
                        name: slug.name.clone(),
                        url: format!("https://github.com/{}", slug),
                        description: remote.description.clone(),
                        language: remote.language.clone(),
                    })
                    .await?
            }
        };

        let mut files = Vec::with_capacity(storable.len());
        for (path, text) in storable {
            let record = self
                .store
                .insert_file(&NewFile {
                    repository_id: repository.id.clone(),
                    file_type: file_type(&path).to_string(),
                    path,
                    content: text,
                })
                .await?;
            files.push(IngestedFile {
                id: record.id,
                path: record.path,
                file_type: record.file_type,
                size_bytes: record.size_bytes,
                analyzed: false,
            });
        }

        tracing::info!(
            repo = %slug,
            stored = files.len(),
            skipped = skipped.len(),
            "ingestion complete"
        );

        Ok(IngestReport {
            repository: RepositorySummary::new(repository, files.len() as u64),
            remote,
            total_files: files.len(),
            files,
            skipped,
        })
    }

    async fn fetch_entry(&self, slug: &RepoSlug, entry: TreeEntry) -> (String, FileContent) {
        if entry.size.is_some_and(|s| s > self.github.max_file_size()) {
            return (entry.path, FileContent::TooLarge);
        }
        let content = self
            .github
            .get_file_content(&slug.owner, &slug.name, &entry.path)
            .await;
        (entry.path, content)
    }

    /// Numbered preview of a stored file. `lines` defaults to
    /// `preview.default_lines`.
    pub async fn preview(&self, file_id: &str, lines: Option<usize>) -> Result<FilePreview> {
        let file_id = required(file_id, "file_id")?;
        let limit = lines.unwrap_or(self.config.preview.default_lines);
        if limit == 0 {
            return Err(Error::InvalidArgument("lines must be >= 1".to_string()));
        }

        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))?;

        let preview = match (&file.preview_cache, file.preview_lines) {
            (Some(cached), Some(cached_lines)) if cached_lines == limit as i64 => cached.clone(),
            _ => {
                let rendered = render_preview(&file.content, limit);
                self.store
                    .set_preview_cache(&file.id, &rendered, limit as i64)
                    .await?;
                rendered
            }
        };

        Ok(FilePreview {
            total_lines: file.total_lines(),
            analyzed: file.is_analyzed(),
            file_id: file.id,
            file_path: file.path,
            file_type: file.file_type,
            size_bytes: file.size_bytes,
            preview,
        })
    }

    /// Runs the analysis cascade on one file and stores the result.
    pub async fn analyze_file(&self, file_id: &str) -> Result<FileAnalysis> {
        let file_id = required(file_id, "file_id")?;
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))?;

        let outcome = self.analyzer.analyze_file(&file.content, &file.path).await;
        let analyzed_at = chrono::Utc::now().timestamp();
        self.store
            .set_analysis(&file.id, &outcome.text, analyzed_at)
            .await?;

        Ok(FileAnalysis {
            file_id: file.id,
            file_path: file.path,
            analysis: outcome.text,
            model: outcome.model,
            analyzed_at: format_ts_iso(analyzed_at),
        })
    }

    /// Searches every file of a repository and appends the result to the
    /// search log.
    pub async fn search_code(&self, repository_id: &str, query: &str) -> Result<SearchResult> {
        let repository_id = required(repository_id, "repository_id")?;
        let query = required(query, "search_query")?;

        let repository = self
            .store
            .get_repository(repository_id)
            .await?
            .ok_or_else(|| Error::RepositoryNotFound(repository_id.to_string()))?;

        let files: Vec<(String, String)> = self
            .store
            .list_files(&repository.id)
            .await?
            .into_iter()
            .map(|f| (f.path, f.content))
            .collect();

        let outcome = self.analyzer.search_code(&files, query).await;
        self.store
            .append_search(&repository.id, query, &outcome.text)
            .await?;

        Ok(SearchResult {
            search_query: query.to_string(),
            results: outcome.text,
            files_searched: files.len(),
            model: outcome.model,
        })
    }

    pub async fn related_files(&self, file_id: &str) -> Result<RelatedFiles> {
        let file_id = required(file_id, "file_id")?;
        let target = self
            .store
            .get_file(file_id)
            .await?
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))?;

        let files = self.store.list_files(&target.repository_id).await?;
        let related = relations::related_files(&target, &files);

        Ok(RelatedFiles {
            file_id: target.id,
            file_path: target.path,
            related,
        })
    }

    pub async fn llm_status(&self) -> LlmStatus {
        let gateway = self.analyzer.gateway();
        let available = gateway.is_available().await;
        let available_models = if available {
            gateway.list_models().await
        } else {
            Vec::new()
        };
        LlmStatus {
            available,
            available_models,
            recommended_models: self.analyzer.recommended_models(),
        }
    }

    pub async fn list_repositories(&self) -> Result<Vec<RepositorySummary>> {
        let repos = self.store.list_repositories().await?;
        let mut summaries = Vec::with_capacity(repos.len());
        for repo in repos {
            let count = self.store.count_files(&repo.id).await?;
            summaries.push(RepositorySummary::new(repo, count));
        }
        Ok(summaries)
    }

    /// Removes a repository together with its files and search log.
    pub async fn delete_repository(&self, repository_id: &str) -> Result<()> {
        let repository_id = required(repository_id, "repository_id")?;
        if self.store.delete_repository(repository_id).await? {
            tracing::info!(repository_id, "repository deleted");
            Ok(())
        } else {
            Err(Error::RepositoryNotFound(repository_id.to_string()))
        }
    }
}
