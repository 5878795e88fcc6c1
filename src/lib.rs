//! # repolens
//!
//! Ingests a public GitHub repository by URL, stores its text files, and
//! produces per-file analyses and cross-file searches with a local model
//! server. When the model server is down or its output is unusable,
//! deterministic heuristics answer instead, so every request yields text.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │ repo_url │──▶│   github   │──▶│ classify +   │──▶│  store   │
//! │  parse   │   │ tree/blobs │   │ decode       │   │ SQLite   │
//! └──────────┘   └────────────┘   └──────────────┘   └────┬─────┘
//!                                                         │
//!                   ┌─────────────────────────────────────┤
//!                   ▼                                     ▼
//!            ┌─────────────┐   ┌──────────┐        ┌────────────┐
//!            │  analysis   │──▶│   llm    │        │ relations  │
//!            │  cascade    │   │ (Ollama) │        │  scoring   │
//!            └──────┬──────┘   └──────────┘        └────────────┘
//!                   ▼
//!            ┌─────────────┐
//!            │ heuristics  │
//!            └─────────────┘
//! ```
//!
//! [`service::Service`] exposes the request-level operations; the CLI
//! and the HTTP [`server`] are thin wrappers around it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Request-level error type |
//! | [`models`] | Core data types |
//! | [`repo_url`] | Repository URL parsing |
//! | [`classify`] | Text/binary classification by path |
//! | [`decode`] | Base64 and text-encoding cascade |
//! | [`github`] | Hosting API client |
//! | [`llm`] | Model server gateway |
//! | [`prompts`] | Analysis and search prompt templates |
//! | [`analysis`] | Model cascade with heuristic fallback |
//! | [`heuristics`] | Rule-based fallback analyzers and search |
//! | [`relations`] | File relationship scoring |
//! | [`store`] | Storage trait, SQLite and in-memory backends |
//! | [`service`] | Request-level operations |
//! | [`server`] | HTTP API |
//! | [`commands`] | CLI output |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analysis;
pub mod classify;
pub mod commands;
pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod github;
pub mod heuristics;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod prompts;
pub mod relations;
pub mod repo_url;
pub mod server;
pub mod service;
pub mod store;

pub use error::{Error, Result};
