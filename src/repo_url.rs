//! Repository URL parsing.
//!
//! Accepts the shapes users paste into a browser or a clone command and
//! recovers `(owner, name)`. Anything unrecognised yields `None`; this
//! function never fails loudly.

use regex::Regex;
use std::sync::LazyLock;

/// Tried in order; the first match wins.
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"github\.com/([^/]+)/([^/]+)/?$",
        r"github\.com/([^/]+)/([^/]+)\.git",
        r"github\.com/([^/]+)/([^/]+)/tree/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// `owner/name` pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

pub fn parse_repo_url(url: &str) -> Option<RepoSlug> {
    let url = url.trim();
    // Query strings and fragments from a browser address bar.
    let url = url.split(['?', '#']).next().unwrap_or(url);
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            let owner = caps[1].to_string();
            let name = caps[2].strip_suffix(".git").unwrap_or(&caps[2]).to_string();
            if name.is_empty() {
                return None;
            }
            return Some(RepoSlug { owner, name });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(owner: &str, name: &str) -> Option<RepoSlug> {
        Some(RepoSlug {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    #[test]
    fn test_bare_url() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets"),
            slug("acme", "widgets")
        );
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets/"),
            slug("acme", "widgets")
        );
        assert_eq!(parse_repo_url("github.com/acme/widgets"), slug("acme", "widgets"));
    }

    #[test]
    fn test_git_suffix_is_stripped() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets.git"),
            slug("acme", "widgets")
        );
        assert_eq!(
            parse_repo_url("git@github.com/acme/widgets.git"),
            slug("acme", "widgets")
        );
    }

    #[test]
    fn test_tree_url() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets/tree/main/src"),
            slug("acme", "widgets")
        );
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(
            parse_repo_url("  https://github.com/acme/widgets\n"),
            slug("acme", "widgets")
        );
    }

    #[test]
    fn test_query_and_fragment_are_ignored() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets?tab=readme-ov-file"),
            slug("acme", "widgets")
        );
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets#readme"),
            slug("acme", "widgets")
        );
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets/tree/main?plain=1"),
            slug("acme", "widgets")
        );
    }

    #[test]
    fn test_unrecognised_inputs() {
        assert_eq!(parse_repo_url(""), None);
        assert_eq!(parse_repo_url("not a url"), None);
        assert_eq!(parse_repo_url("https://github.com/acme"), None);
        assert_eq!(parse_repo_url("https://gitlab.com/acme/widgets"), None);
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets/blob/main/README.md"),
            None
        );
    }

    #[test]
    fn test_display() {
        let s = parse_repo_url("https://github.com/acme/widgets").unwrap();
        assert_eq!(s.to_string(), "acme/widgets");
    }
}
