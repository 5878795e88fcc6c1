//! TOML configuration.
//!
//! A single [`Config`] value is loaded once at startup and threaded into
//! every component constructor. Nothing below the CLI reads the
//! environment directly: the hosting-API token is resolved here, at load
//! time, and carried in [`GithubConfig::token`].
//!
//! ```toml
//! [db]
//! path = "./data/repolens.sqlite"
//!
//! [github]
//! # token = "ghp_..."            # or export GITHUB_TOKEN
//! default_branch = "main"
//! fallback_branch = "master"
//!
//! [models]
//! url = "http://localhost:11434"
//! code = "codellama:7b"
//! general = "llama3:8b"
//! fallback = "deepseek-coder:6.7b"
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/repolens.sqlite"),
        }
    }
}

/// Remote repository API settings.
#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Explicit token. Takes precedence over `token_env`.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable consulted by [`load_config`] when `token` is unset.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// First branch guess for the tree listing. Only this branch triggers
    /// the single retry against `fallback_branch`.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_fallback_branch")]
    pub fallback_branch: String,
    /// Raw size ceiling in bytes; larger files are stored as a sentinel.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Number of content fetches in flight during one ingestion run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_github_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            token_env: default_token_env(),
            default_branch: default_branch(),
            fallback_branch: default_fallback_branch(),
            max_file_size: default_max_file_size(),
            concurrency: default_concurrency(),
            timeout_secs: default_github_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_fallback_branch() -> String {
    "master".to_string()
}
fn default_max_file_size() -> u64 {
    1_000_000
}
fn default_concurrency() -> usize {
    8
}
fn default_github_timeout_secs() -> u64 {
    30
}

/// Local model server settings and the model name configured per role.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    #[serde(default = "default_models_url")]
    pub url: String,
    #[serde(default = "default_code_model")]
    pub code: String,
    #[serde(default = "default_general_model")]
    pub general: String,
    #[serde(default = "default_fallback_model")]
    pub fallback: String,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,
    #[serde(default = "default_search_max_tokens")]
    pub search_max_tokens: u32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            url: default_models_url(),
            code: default_code_model(),
            general: default_general_model(),
            fallback: default_fallback_model(),
            probe_timeout_secs: default_probe_timeout_secs(),
            generate_timeout_secs: default_generate_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            analysis_max_tokens: default_analysis_max_tokens(),
            search_max_tokens: default_search_max_tokens(),
        }
    }
}

fn default_models_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_code_model() -> String {
    "codellama:7b".to_string()
}
fn default_general_model() -> String {
    "llama3:8b".to_string()
}
fn default_fallback_model() -> String {
    "deepseek-coder:6.7b".to_string()
}
fn default_probe_timeout_secs() -> u64 {
    5
}
fn default_generate_timeout_secs() -> u64 {
    120
}
fn default_temperature() -> f64 {
    0.1
}
fn default_top_p() -> f64 {
    0.9
}
fn default_analysis_max_tokens() -> u32 {
    3000
}
fn default_search_max_tokens() -> u32 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_lines")]
    pub default_lines: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            default_lines: default_preview_lines(),
        }
    }
}

fn default_preview_lines() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    /// A configuration made entirely of defaults, used when no file exists.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig::default(),
            github: GithubConfig::default(),
            models: ModelsConfig::default(),
            preview: PreviewConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Fills `github.token` from `github.token_env` when no explicit token
    /// is configured. Empty variables are ignored.
    pub fn resolve_token_from_env(&mut self) {
        if self.github.token.is_none() {
            self.github.token = std::env::var(&self.github.token_env)
                .ok()
                .filter(|t| !t.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.concurrency == 0 {
            anyhow::bail!("github.concurrency must be >= 1");
        }
        if self.github.max_file_size == 0 {
            anyhow::bail!("github.max_file_size must be > 0");
        }
        if self.github.default_branch.trim().is_empty() {
            anyhow::bail!("github.default_branch must not be empty");
        }
        if self.preview.default_lines == 0 {
            anyhow::bail!("preview.default_lines must be >= 1");
        }
        if !(0.0..=2.0).contains(&self.models.temperature) {
            anyhow::bail!("models.temperature must be in [0.0, 2.0]");
        }
        if !(0.0..=1.0).contains(&self.models.top_p) {
            anyhow::bail!("models.top_p must be in [0.0, 1.0]");
        }
        if self.models.analysis_max_tokens == 0 || self.models.search_max_tokens == 0 {
            anyhow::bail!("models.*_max_tokens must be > 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.validate()?;
    config.resolve_token_from_env();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.github.default_branch, "main");
        assert_eq!(config.github.fallback_branch, "master");
        assert_eq!(config.github.max_file_size, 1_000_000);
        assert_eq!(config.models.code, "codellama:7b");
        assert_eq!(config.models.generate_timeout_secs, 120);
        assert_eq!(config.preview.default_lines, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[models]
url = "http://gpu-box:11434"
general = "mistral:7b"
"#,
        )
        .unwrap();
        assert_eq!(config.models.url, "http://gpu-box:11434");
        assert_eq!(config.models.general, "mistral:7b");
        assert_eq!(config.models.fallback, "deepseek-coder:6.7b");
        assert!((config.models.top_p - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config: Config = toml::from_str("[github]\nconcurrency = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_load_config_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("repolens.toml");
        std::fs::write(
            &path,
            "[db]\npath = \"/tmp/x.sqlite\"\n\n[github]\ntoken = \"abc\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.db.path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(config.github.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
