//! File relationship scoring.
//!
//! Ranks the other files of a repository against a target file:
//!
//! | Signal | Points |
//! |--------|--------|
//! | candidate content contains the target path verbatim | 3 |
//! | same immediate parent directory | 1 |
//! | same file type | 1 |
//!
//! Zero-score candidates are dropped. Ties keep the enumeration order of
//! the input, so an unchanged file set always produces the same list.

use crate::models::{FileRecord, RelationshipScore};

pub const REFERENCE_POINTS: u32 = 3;
pub const SAME_DIR_POINTS: u32 = 1;
pub const SAME_TYPE_POINTS: u32 = 1;
pub const MAX_RELATED: usize = 10;

/// Parent directory of a `/`-separated path; root-level files return `""`.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

pub fn score(target: &FileRecord, candidate: &FileRecord) -> u32 {
    let mut score = 0;
    if candidate.content.contains(target.path.as_str()) {
        score += REFERENCE_POINTS;
    }
    if parent_dir(&candidate.path) == parent_dir(&target.path) {
        score += SAME_DIR_POINTS;
    }
    if candidate.file_type == target.file_type {
        score += SAME_TYPE_POINTS;
    }
    score
}

/// Top related files for `target` among `files`. The target itself is
/// skipped whether or not it appears in `files`.
pub fn related_files(target: &FileRecord, files: &[FileRecord]) -> Vec<RelationshipScore> {
    let mut scored: Vec<RelationshipScore> = files
        .iter()
        .filter(|f| f.id != target.id)
        .filter_map(|f| {
            let s = score(target, f);
            (s > 0).then(|| RelationshipScore {
                file_path: f.path.clone(),
                relationship_score: s,
                file_type: f.file_type.clone(),
            })
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.relationship_score.cmp(&a.relationship_score));
    scored.truncate(MAX_RELATED);
    scored
}
