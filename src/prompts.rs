//! Prompt templates for file analysis and code search.

use crate::classify::{file_name, file_type};

/// Characters of file content embedded in an analysis prompt.
pub const ANALYSIS_CONTENT_CHARS: usize = 4000;
/// Characters kept from each file in a search prompt.
pub const SEARCH_FILE_CHARS: usize = 1000;
/// Characters of concatenated codebase content in a search prompt.
pub const SEARCH_TOTAL_CHARS: usize = 5000;

/// Longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn analysis_prompt(content: &str, path: &str) -> String {
    let ext = match file_type(path) {
        "" => "unknown".to_string(),
        ext => ext.to_ascii_lowercase(),
    };
    let name = file_name(path);
    let size = content.chars().count();
    let body = truncate_chars(content, ANALYSIS_CONTENT_CHARS);

    format!(
        r#"As an expert code analyst, provide a comprehensive analysis of this {ext} file.

FILE INFORMATION:
- Path: {path}
- Name: {name}
- Type: {ext}
- Size: {size} characters

FILE CONTENT:
{body}

ANALYSIS REQUIREMENTS:
Provide a detailed analysis covering:

1. **PRIMARY PURPOSE & FUNCTIONALITY**
   - What is the main purpose of this file?
   - What problems does it solve?
   - How does it fit in the overall project?

2. **DETAILED CODE STRUCTURE**
   - List all classes, functions, methods with descriptions
   - Identify main entry points and execution flow
   - Explain the overall architecture pattern used

3. **DEPENDENCIES & IMPORTS**
   - List all external dependencies
   - Explain what each import is used for
   - Identify potential security or performance concerns

4. **KEY ALGORITHMS & LOGIC**
   - Explain complex algorithms or business logic
   - Identify design patterns used
   - Highlight any optimization techniques

5. **DATA STRUCTURES & MODELS**
   - Describe data structures, classes, or models defined
   - Explain relationships between different components
   - Identify data flow and transformations

6. **API & INTERFACES**
   - List public methods/functions and their parameters
   - Describe input/output formats
   - Explain error handling mechanisms

7. **CONFIGURATION & SETTINGS**
   - Identify configuration options
   - Explain environment dependencies
   - List any hardcoded values or magic numbers

8. **SECURITY & BEST PRACTICES**
   - Identify potential security vulnerabilities
   - Assess code quality and best practices
   - Suggest improvements if any

9. **TESTING & DEBUGGING**
   - Identify test coverage areas
   - Explain debugging mechanisms
   - Suggest testing strategies

10. **INTEGRATION POINTS**
    - How this file interacts with other parts
    - External services or APIs it uses
    - Database interactions if any

Be technical, detailed, and specific. Use code examples where helpful.
Format your response clearly with proper headings and sections.
"#
    )
}

/// Builds the search prompt from `(path, content)` pairs in the given order.
pub fn search_prompt(files: &[(String, String)], query: &str) -> String {
    let summary = files
        .iter()
        .map(|(path, content)| {
            format!(
                "=== {} ===\n{}",
                path,
                truncate_chars(content, SEARCH_FILE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let summary = truncate_chars(&summary, SEARCH_TOTAL_CHARS);

    format!(
        r#"Search through this codebase for: "{query}"

CODEBASE CONTENT:
{summary}

SEARCH REQUIREMENTS:
1. **EXACT MATCHES**: Find exact occurrences of "{query}"
2. **CONTEXTUAL MATCHES**: Find related concepts, similar patterns, or relevant code
3. **FILE LOCATIONS**: Specify exact file paths where matches are found
4. **LINE CONTEXT**: Provide surrounding code context for each match
5. **FUNCTIONAL RELATIONSHIP**: Explain how matches relate to each other

FORMAT YOUR RESPONSE AS:
## Direct Matches
- File: [filepath]
  - Line: [line number]
  - Context: [surrounding code]
  - Purpose: [what this code does]

## Related Code
- File: [filepath]
  - Relationship: [how it relates to search term]
  - Description: [explanation]

## Summary
[Overall summary of findings and relationships]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_analysis_prompt_embeds_truncated_content() {
        let content = format!("{}TAIL", "x".repeat(ANALYSIS_CONTENT_CHARS));
        let prompt = analysis_prompt(&content, "src/lib.rs");
        assert!(prompt.contains("- Path: src/lib.rs"));
        assert!(prompt.contains("- Name: lib.rs"));
        assert!(prompt.contains("- Type: rs"));
        assert!(prompt.contains(&format!("- Size: {} characters", ANALYSIS_CONTENT_CHARS + 4)));
        assert!(!prompt.contains("TAIL"));
        assert!(prompt.contains("10. **INTEGRATION POINTS**"));
    }

    #[test]
    fn test_analysis_prompt_unknown_type() {
        let prompt = analysis_prompt("all:\n\tcc main.c", "Makefile");
        assert!(prompt.contains("this unknown file"));
    }

    #[test]
    fn test_search_prompt_caps_each_file_and_total() {
        let files: Vec<(String, String)> = (0..10)
            .map(|i| (format!("f{i}.py"), format!("{}END{i}", "y".repeat(SEARCH_FILE_CHARS))))
            .collect();
        let prompt = search_prompt(&files, "needle");
        assert!(prompt.contains("=== f0.py ==="));
        assert!(!prompt.contains("END0"));
        assert!(!prompt.contains("=== f9.py ==="));
        assert!(prompt.contains(r#"Search through this codebase for: "needle""#));
    }
}
