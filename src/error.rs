use thiserror::Error;

/// Errors surfaced by the request-level operations in [`crate::service`].
///
/// Upstream outages never appear here: they degrade to empty results or
/// heuristic output. What remains is bad input, unknown identifiers, a
/// repository with nothing to ingest, and storage failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid repository URL format")]
    InvalidUrl,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error(
        "unable to fetch repository files for {owner}/{name}; check that the repository exists and is public"
    )]
    NoFiles { owner: String, name: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
