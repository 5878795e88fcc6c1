//! Model cascade for file analysis and code search.
//!
//! Each request walks a fixed, ordered list of [`CascadeStep`]s. A step
//! names a logical [`ModelRole`] and the predicate its output must pass.
//! Steps whose configured model is not loaded on the server are skipped
//! without a call; a failed or rejected generation advances to the next
//! step with no retry. When the server is unavailable or the list is
//! exhausted, the deterministic heuristics in [`crate::heuristics`] answer
//! instead, so every request produces some text.
//!
//! ```text
//! probe ──unavailable──────────────────────────────┐
//!   │                                              ▼
//!   ▼                                        heuristic fallback
//! list loaded models                               ▲
//!   │                                              │
//!   ▼                                              │
//! step 1 ─skip/reject─▶ step 2 ─skip/reject─▶ … ───┘
//!   │ accept              │ accept
//!   ▼                     ▼
//! model output        model output
//! ```

use serde::Serialize;
use std::sync::Arc;

use crate::config::ModelsConfig;
use crate::heuristics::{fallback_analysis, fallback_search};
use crate::llm::ModelGateway;
use crate::prompts::{analysis_prompt, search_prompt};

/// Logical model slot; the concrete model name comes from [`ModelsConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Code,
    General,
    Fallback,
}

impl ModelRole {
    pub fn model_name(self, models: &ModelsConfig) -> &str {
        match self {
            ModelRole::Code => &models.code,
            ModelRole::General => &models.general,
            ModelRole::Fallback => &models.fallback,
        }
    }
}

/// One entry of a cascade: the role to try and its acceptance predicate.
#[derive(Debug, Clone, Copy)]
pub struct CascadeStep {
    pub role: ModelRole,
    pub accept: fn(&str) -> bool,
}

/// Analysis output must be longer than this many characters.
pub const MIN_ANALYSIS_CHARS: usize = 100;
/// Search output must be longer than this many characters.
pub const MIN_SEARCH_CHARS: usize = 50;

fn substantial_analysis(text: &str) -> bool {
    text.chars().count() > MIN_ANALYSIS_CHARS
}

fn substantial_search(text: &str) -> bool {
    text.chars().count() > MIN_SEARCH_CHARS
}

pub const ANALYSIS_CASCADE: &[CascadeStep] = &[
    CascadeStep {
        role: ModelRole::Code,
        accept: substantial_analysis,
    },
    CascadeStep {
        role: ModelRole::General,
        accept: substantial_analysis,
    },
    CascadeStep {
        role: ModelRole::Fallback,
        accept: substantial_analysis,
    },
];

pub const SEARCH_CASCADE: &[CascadeStep] = &[
    CascadeStep {
        role: ModelRole::General,
        accept: substantial_search,
    },
    CascadeStep {
        role: ModelRole::Code,
        accept: substantial_search,
    },
];

/// Text produced by the cascade and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub text: String,
    /// Name of the accepted model, or `None` for heuristic output.
    pub model: Option<String>,
}

impl Outcome {
    fn heuristic(text: String) -> Self {
        Self { text, model: None }
    }

    pub fn is_fallback(&self) -> bool {
        self.model.is_none()
    }
}

/// Runs the analysis and search cascades against a [`ModelGateway`].
#[derive(Clone)]
pub struct Analyzer {
    gateway: Arc<dyn ModelGateway>,
    models: ModelsConfig,
}

impl Analyzer {
    pub fn new(gateway: Arc<dyn ModelGateway>, models: ModelsConfig) -> Self {
        Self { gateway, models }
    }

    pub fn gateway(&self) -> &Arc<dyn ModelGateway> {
        &self.gateway
    }

    /// Model names for every role, in analysis-cascade order.
    pub fn recommended_models(&self) -> Vec<String> {
        ANALYSIS_CASCADE
            .iter()
            .map(|s| s.role.model_name(&self.models).to_string())
            .collect()
    }

    pub async fn analyze_file(&self, content: &str, path: &str) -> Outcome {
        let accepted = self
            .run_cascade(
                ANALYSIS_CASCADE,
                || analysis_prompt(content, path),
                self.models.analysis_max_tokens,
            )
            .await;

        accepted.unwrap_or_else(|| {
            tracing::info!(path, "using heuristic analysis");
            Outcome::heuristic(fallback_analysis(content, path))
        })
    }

    /// Searches `(path, content)` pairs for `query`.
    pub async fn search_code(&self, files: &[(String, String)], query: &str) -> Outcome {
        let accepted = self
            .run_cascade(
                SEARCH_CASCADE,
                || search_prompt(files, query),
                self.models.search_max_tokens,
            )
            .await;

        accepted.unwrap_or_else(|| {
            tracing::info!(query, "using heuristic search");
            Outcome::heuristic(fallback_search(files, query))
        })
    }

    async fn run_cascade(
        &self,
        steps: &[CascadeStep],
        build_prompt: impl FnOnce() -> String,
        max_tokens: u32,
    ) -> Option<Outcome> {
        if !self.gateway.is_available().await {
            tracing::info!("model server unavailable");
            return None;
        }

        let prompt = build_prompt();
        let loaded = self.gateway.list_models().await;

        for step in steps {
            let model = step.role.model_name(&self.models);
            if !loaded.iter().any(|m| m == model) {
                tracing::debug!(role = ?step.role, model, "model not loaded, skipping");
                continue;
            }

            match self.gateway.generate(&prompt, model, max_tokens).await {
                Ok(text) if (step.accept)(&text) => {
                    tracing::info!(role = ?step.role, model, "model output accepted");
                    return Some(Outcome {
                        text,
                        model: Some(model.to_string()),
                    });
                }
                Ok(text) => {
                    tracing::warn!(
                        role = ?step.role,
                        model,
                        chars = text.chars().count(),
                        "model output rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(role = ?step.role, model, error = %e, "generation failed");
                }
            }
        }

        None
    }
}
