//! Remote repository client for the GitHub REST API.
//!
//! Three calls are used: repository metadata, the recursive git tree of a
//! branch, and the contents endpoint for a single file. None of them fail
//! loudly. A non-success status, a transport error or an unexpected body
//! shape becomes an empty [`RepoInfo`], an empty tree, or
//! [`FileContent::Unavailable`].
//!
//! # Branch fallback
//!
//! [`GitHubClient::get_repo_files`] asks for the tree of the requested
//! branch. When that fails **and** the requested branch is the configured
//! default guess (`main`), it retries exactly once against the fallback
//! branch (`master`). Any other branch gets no retry.

use anyhow::Result;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::classify::is_text_file;
use crate::config::GithubConfig;
use crate::decode::{decode_base64_content, Decoded, TOO_LARGE};

/// Repository metadata. Every field is empty/zero when unknown.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RepoInfo {
    pub description: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
}

/// One path-and-kind record from the recursive tree listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Reported for blobs only.
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// Result of fetching one file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Rejected by the text classifier; nothing was fetched.
    NotText,
    /// Non-success status, transport failure or empty payload.
    Unavailable,
    /// Reported size exceeds the configured ceiling.
    TooLarge,
    Decoded(Decoded),
}

impl FileContent {
    /// The string to persist for this file, if any.
    ///
    /// Oversized and undecodable files keep a sentinel so they do not
    /// silently turn into empty files.
    pub fn into_stored(self) -> Option<String> {
        match self {
            FileContent::NotText | FileContent::Unavailable => None,
            FileContent::TooLarge => Some(TOO_LARGE.to_string()),
            FileContent::Decoded(decoded) => Some(decoded.into_content()),
        }
    }
}

#[derive(Deserialize)]
struct RepoResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    size: u64,
}

/// HTTP client for the hosting API. Cheap to clone and safe to share
/// between concurrent fetch workers.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
    default_branch: String,
    fallback_branch: String,
    max_file_size: u64,
}

impl GitHubClient {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            default_branch: config.default_branch.clone(),
            fallback_branch: config.fallback_branch.clone(),
            max_file_size: config.max_file_size,
        })
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Fetches repository metadata; any failure yields `RepoInfo::default()`.
    pub async fn get_repo_info(&self, owner: &str, repo: &str) -> RepoInfo {
        let Some(url) = self.endpoint(&["repos", owner, repo]) else {
            return RepoInfo::default();
        };
        match self.get_json::<RepoResponse>(url).await {
            Some(data) => RepoInfo {
                description: data.description.unwrap_or_default(),
                language: data.language.unwrap_or_default(),
                stars: data.stargazers_count,
                forks: data.forks_count,
            },
            None => RepoInfo::default(),
        }
    }

    /// Lists every tree entry of `branch`, with the single default-branch
    /// retry described in the module docs. Failure yields an empty list.
    pub async fn get_repo_files(&self, owner: &str, repo: &str, branch: &str) -> Vec<TreeEntry> {
        if let Some(entries) = self.fetch_tree(owner, repo, branch).await {
            return entries;
        }

        if branch == self.default_branch && self.fallback_branch != branch {
            tracing::info!(
                owner,
                repo,
                branch,
                fallback = %self.fallback_branch,
                "tree fetch failed, retrying with fallback branch"
            );
            if let Some(entries) = self.fetch_tree(owner, repo, &self.fallback_branch).await {
                return entries;
            }
        }

        tracing::warn!(owner, repo, branch, "no tree available");
        Vec::new()
    }

    /// Fetches and decodes one file. Paths rejected by the classifier are
    /// refused before any request is made.
    pub async fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> FileContent {
        if !is_text_file(path) {
            return FileContent::NotText;
        }

        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let Some(url) = self.endpoint(&segments) else {
            return FileContent::Unavailable;
        };

        let Some(data) = self.get_json::<ContentResponse>(url).await else {
            return FileContent::Unavailable;
        };

        if data.size > self.max_file_size {
            return FileContent::TooLarge;
        }

        match data.content.as_deref() {
            Some(payload) if !payload.trim().is_empty() => {
                FileContent::Decoded(decode_base64_content(payload))
            }
            _ => FileContent::Unavailable,
        }
    }

    async fn fetch_tree(&self, owner: &str, repo: &str, branch: &str) -> Option<Vec<TreeEntry>> {
        let mut url = self.endpoint(&["repos", owner, repo, "git", "trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let data = self.get_json::<TreeResponse>(url).await?;
        if data.truncated {
            tracing::warn!(owner, repo, branch, "tree listing was truncated by the API");
        }
        Some(data.tree)
    }

    fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        let mut url = match Url::parse(&self.api_url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(api_url = %self.api_url, error = %e, "invalid API url");
                return None;
            }
        };
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Some(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Option<T> {
        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(%url, error = %e, "request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, %status, "non-success status");
            return None;
        }

        match response.json::<T>().await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(%url, error = %e, "unexpected response body");
                None
            }
        }
    }
}
