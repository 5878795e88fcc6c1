//! Deterministic fallbacks used when no model produces usable output.
//!
//! Everything here works on in-memory text only and cannot fail.
//! [`fallback_analysis`] picks a summariser by extension family:
//!
//! | Family | Extensions | Reports |
//! |--------|------------|---------|
//! | source | `py`, `rs`, `go`, `java`, `kt`, `cs`, `c`/`cpp`/`h`…, `rb` | imports, type and function declarations (first 10 of each) |
//! | web script | `js`, `ts`, `jsx`, `tsx`, `mjs`, `cjs`, `vue`, `svelte` | function-like constructs, variable declarations, framework hint |
//! | markup | `html`, `htm` | form / script / stylesheet presence |
//! | other | everything else | configuration vs. documentation/code |

use crate::classify::file_type;

/// Every fallback analysis starts with this header.
pub const FALLBACK_HEADER: &str = "# FALLBACK ANALYSIS";

const LIST_CAP: usize = 10;
const PREVIEW_LINES: usize = 20;
const MATCHES_SHOWN_PER_FILE: usize = 3;
const SEARCH_CONTEXT_LINES: usize = 2;

/// Line-prefix rules for one source language.
struct SourceRules {
    label: &'static str,
    imports: &'static [&'static str],
    types: &'static [&'static str],
    /// Empty when declarations cannot be told apart by prefix alone.
    functions: &'static [&'static str],
}

const PYTHON: SourceRules = SourceRules {
    label: "Python",
    imports: &["import ", "from "],
    types: &["class "],
    functions: &["def ", "async def "],
};

const RUST: SourceRules = SourceRules {
    label: "Rust",
    imports: &["use ", "pub use ", "extern crate "],
    types: &[
        "struct ",
        "enum ",
        "trait ",
        "pub struct ",
        "pub enum ",
        "pub trait ",
        "pub(crate) struct ",
        "pub(crate) enum ",
        "pub(crate) trait ",
    ],
    functions: &[
        "fn ",
        "pub fn ",
        "async fn ",
        "pub async fn ",
        "pub(crate) fn ",
        "pub(crate) async fn ",
    ],
};

const GO: SourceRules = SourceRules {
    label: "Go",
    imports: &["import "],
    types: &["type "],
    functions: &["func "],
};

const JAVA: SourceRules = SourceRules {
    label: "Java",
    imports: &["import "],
    types: &[
        "class ",
        "interface ",
        "enum ",
        "record ",
        "public class ",
        "public interface ",
        "public enum ",
        "public record ",
        "abstract class ",
        "public abstract class ",
        "final class ",
        "public final class ",
    ],
    functions: &[],
};

const KOTLIN: SourceRules = SourceRules {
    label: "Kotlin",
    imports: &["import "],
    types: &[
        "class ",
        "data class ",
        "sealed class ",
        "enum class ",
        "interface ",
        "object ",
    ],
    functions: &["fun ", "private fun ", "override fun ", "suspend fun "],
};

const CSHARP: SourceRules = SourceRules {
    label: "C#",
    imports: &["using "],
    types: &[
        "class ",
        "interface ",
        "struct ",
        "enum ",
        "record ",
        "public class ",
        "public interface ",
        "public struct ",
        "public enum ",
        "public record ",
        "internal class ",
    ],
    functions: &[],
};

const C_FAMILY: SourceRules = SourceRules {
    label: "C/C++",
    imports: &["#include"],
    types: &["struct ", "class ", "typedef struct ", "enum ", "union "],
    functions: &[],
};

const RUBY: SourceRules = SourceRules {
    label: "Ruby",
    imports: &["require ", "require_relative "],
    types: &["class ", "module "],
    functions: &["def "],
};

/// Framework tokens checked in order, case-insensitively.
const FRAMEWORK_HINTS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("angular", "Angular"),
    ("svelte", "Svelte"),
];

enum Family {
    Source(&'static SourceRules),
    WebScript,
    Markup,
    Other,
}

fn family_for(ext: &str) -> Family {
    match ext {
        "py" => Family::Source(&PYTHON),
        "rs" => Family::Source(&RUST),
        "go" => Family::Source(&GO),
        "java" => Family::Source(&JAVA),
        "kt" => Family::Source(&KOTLIN),
        "cs" => Family::Source(&CSHARP),
        "c" | "h" | "cpp" | "cc" | "cxx" | "c++" | "cp" | "hpp" | "h++" | "hxx" => {
            Family::Source(&C_FAMILY)
        }
        "rb" => Family::Source(&RUBY),
        "js" | "ts" | "jsx" | "tsx" | "mjs" | "cjs" | "vue" | "svelte" => Family::WebScript,
        "html" | "htm" => Family::Markup,
        _ => Family::Other,
    }
}

/// Three-tier label by line count: `<100` low, `<500` medium, else high.
pub fn complexity(line_count: usize) -> &'static str {
    if line_count < 100 {
        "Low"
    } else if line_count < 500 {
        "Medium"
    } else {
        "High"
    }
}

/// Structural summary of `content` used when no model is usable.
pub fn fallback_analysis(content: &str, path: &str) -> String {
    let ext = file_type(path);
    let lines: Vec<&str> = content.lines().collect();

    let structure = match family_for(&ext.to_ascii_lowercase()) {
        Family::Source(rules) => source_structure(rules, &lines),
        Family::WebScript => web_script_structure(&lines),
        Family::Markup => markup_structure(&lines),
        Family::Other => generic_structure(&lines),
    };

    let preview = lines
        .iter()
        .take(PREVIEW_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{FALLBACK_HEADER}: {path}
*Note: Detailed AI analysis unavailable. Using basic pattern recognition.*

## File Overview
- **Type**: {} file
- **Size**: {} characters, {} lines
- **Complexity**: {}

## Basic Structure Analysis
{structure}
## Content Preview (First {PREVIEW_LINES} lines)

{preview}

*For detailed AI-powered analysis, make sure the model server is running with code models installed.*
",
        ext.to_ascii_uppercase(),
        content.chars().count(),
        lines.len(),
        complexity(lines.len()),
    )
}

fn matching<'a>(lines: &[&'a str], prefixes: &[&str]) -> Vec<&'a str> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| prefixes.iter().any(|p| l.starts_with(p)))
        .collect()
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .take(LIST_CAP)
        .map(|i| format!("  - {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_structure(rules: &SourceRules, lines: &[&str]) -> String {
    let imports = matching(lines, rules.imports);
    let types = matching(lines, rules.types);

    let mut out = format!(
        "
### {} Structure
- **Imports**: {} dependencies
{}

- **Types**: {} defined
{}
",
        rules.label,
        imports.len(),
        bullet_list(&imports),
        types.len(),
        bullet_list(&types),
    );

    if !rules.functions.is_empty() {
        let functions = matching(lines, rules.functions);
        out.push_str(&format!(
            "
- **Functions**: {} defined
{}
",
            functions.len(),
            bullet_list(&functions),
        ));
    }
    out
}

fn web_script_structure(lines: &[&str]) -> String {
    let mut functions = 0usize;
    let mut variables = 0usize;
    for line in lines.iter().map(|l| l.trim()) {
        if line.contains("function ") || line.contains("=>") {
            functions += 1;
        }
        if line.starts_with("const ") || line.starts_with("let ") || line.starts_with("var ") {
            variables += 1;
        }
    }

    let lowered: Vec<String> = lines.iter().map(|l| l.to_lowercase()).collect();
    let framework = FRAMEWORK_HINTS
        .iter()
        .find(|(token, _)| lowered.iter().any(|l| l.contains(token)))
        .map(|(_, name)| *name)
        .unwrap_or("Vanilla JS");

    format!(
        "
### JavaScript/TypeScript Structure
- **Functions**: {functions} found
- **Variables**: {variables} declared
- **Framework**: {framework}
"
    )
}

fn markup_structure(lines: &[&str]) -> String {
    let content = lines.join(" ").to_lowercase();
    let yes_no = |token: &str| if content.contains(token) { "Yes" } else { "No" };
    format!(
        "
### HTML Structure
- **Forms**: {}
- **Scripts**: {}
- **Stylesheets**: {}
",
        yes_no("<form"),
        yes_no("<script"),
        yes_no("stylesheet"),
    )
}

fn generic_structure(lines: &[&str]) -> String {
    let head = lines.iter().take(5).copied().collect::<Vec<_>>().join(" ");
    let kind = if head.contains(['=', ':', '{']) {
        "Configuration"
    } else {
        "Documentation/Code"
    };
    format!(
        "
### Generic File Analysis
- **Type**: {kind}
- **Lines**: {}
",
        lines.len()
    )
}

/// Case-insensitive line search over `(path, content)` pairs.
///
/// For each file with hits: the total match count and up to three blocks
/// with two lines of context either side.
pub fn fallback_search(files: &[(String, String)], query: &str) -> String {
    let needle = query.to_lowercase();
    let mut results = Vec::new();

    for (path, content) in files {
        let lines: Vec<&str> = content.lines().collect();
        let hits: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();

        if hits.is_empty() {
            continue;
        }

        let blocks: Vec<String> = hits
            .iter()
            .take(MATCHES_SHOWN_PER_FILE)
            .map(|&i| {
                let start = i.saturating_sub(SEARCH_CONTEXT_LINES);
                let end = (i + SEARCH_CONTEXT_LINES + 1).min(lines.len());
                let context = (start..end)
                    .map(|j| format!("{:>4}: {}", j + 1, lines[j]))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("**Line {}**:\n```\n{}\n```", i + 1, context)
            })
            .collect();

        results.push(format!(
            "## {}\nFound {} matches:\n{}",
            path,
            hits.len(),
            blocks.join("\n\n")
        ));
    }

    if results.is_empty() {
        format!("No matches found for '{}'", query)
    } else {
        results.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_tiers() {
        assert_eq!(complexity(0), "Low");
        assert_eq!(complexity(99), "Low");
        assert_eq!(complexity(100), "Medium");
        assert_eq!(complexity(499), "Medium");
        assert_eq!(complexity(500), "High");
    }

    #[test]
    fn test_python_structure() {
        let content = "import os\nfrom typing import List\n\nclass Widget:\n    def render(self):\n        pass\n\nasync def main():\n    pass\n";
        let out = fallback_analysis(content, "app/widget.py");
        assert!(out.starts_with("# FALLBACK ANALYSIS: app/widget.py"));
        assert!(out.contains("### Python Structure"));
        assert!(out.contains("- **Imports**: 2 dependencies"));
        assert!(out.contains("  - from typing import List"));
        assert!(out.contains("- **Types**: 1 defined"));
        assert!(out.contains("- **Functions**: 2 defined"));
        assert!(out.contains("  - def render(self):"));
        assert!(out.contains("- **Type**: PY file"));
        assert!(out.contains("- **Complexity**: Low"));
    }

    #[test]
    fn test_lists_capped_at_ten() {
        let content = (0..15)
            .map(|i| format!("import mod{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let out = fallback_analysis(&content, "many.py");
        assert!(out.contains("- **Imports**: 15 dependencies"));
        assert!(out.contains("  - import mod9"));
        assert!(!out.contains("  - import mod10"));
    }

    #[test]
    fn test_rust_structure() {
        let content = "use std::fs;\n\npub struct Config;\n\nimpl Config {\n    pub fn load() {}\n}\n\nfn main() {}\n";
        let out = fallback_analysis(content, "src/main.rs");
        assert!(out.contains("### Rust Structure"));
        assert!(out.contains("- **Imports**: 1 dependencies"));
        assert!(out.contains("- **Types**: 1 defined"));
        assert!(out.contains("- **Functions**: 2 defined"));
    }

    #[test]
    fn test_c_family_has_no_function_line() {
        let out = fallback_analysis("#include <stdio.h>\nstruct point { int x; };\n", "p.c");
        assert!(out.contains("### C/C++ Structure"));
        assert!(out.contains("- **Imports**: 1 dependencies"));
        assert!(!out.contains("**Functions**"));
    }

    #[test]
    fn test_web_script_structure() {
        let content = "import React from 'react';\nconst App = () => {\n  let x = 1;\n  return x;\n};\nfunction helper() {}\n";
        let out = fallback_analysis(content, "src/App.jsx");
        assert!(out.contains("- **Functions**: 2 found"));
        assert!(out.contains("- **Variables**: 2 declared"));
        assert!(out.contains("- **Framework**: React"));

        let plain = fallback_analysis("var a = 1;\n", "a.js");
        assert!(plain.contains("- **Framework**: Vanilla JS"));
    }

    #[test]
    fn test_markup_structure() {
        let content = "<html>\n<link rel=\"Stylesheet\" href=\"a.css\">\n<FORM action=\"/\"></FORM>\n</html>";
        let out = fallback_analysis(content, "index.html");
        assert!(out.contains("- **Forms**: Yes"));
        assert!(out.contains("- **Scripts**: No"));
        assert!(out.contains("- **Stylesheets**: Yes"));
    }

    #[test]
    fn test_generic_structure() {
        let config = fallback_analysis("name = \"x\"\nversion = 1\n", "settings.ini");
        assert!(config.contains("- **Type**: Configuration"));

        let doc = fallback_analysis("Just some words\nand more words\n", "NOTES.txt");
        assert!(doc.contains("- **Type**: Documentation/Code"));
    }

    #[test]
    fn test_preview_is_first_twenty_lines() {
        let content = (1..=50)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let out = fallback_analysis(&content, "notes.md");
        let expected = (1..=20)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(out.contains(&expected));
        assert!(!out.contains("line 21"));
        assert!(out.contains("50 lines"));
    }

    #[test]
    fn test_fallback_on_empty_content() {
        let out = fallback_analysis("", "empty.txt");
        assert!(out.starts_with(FALLBACK_HEADER));
        assert!(out.contains("0 characters, 0 lines"));
    }

    #[test]
    fn test_fallback_search_context_and_cap() {
        let files = vec![
            (
                "a.py".to_string(),
                "one\nTARGET two\nthree\ntarget four\nfive\ntarget six\ntarget seven".to_string(),
            ),
            ("b.py".to_string(), "nothing here".to_string()),
        ];
        let out = fallback_search(&files, "Target");
        assert!(out.starts_with("## a.py\nFound 4 matches:"));
        assert!(out.contains("**Line 2**:"));
        assert!(out.contains("   1: one\n   2: TARGET two\n   3: three\n   4: target four"));
        assert!(out.contains("**Line 6**:"));
        assert!(!out.contains("**Line 7**"));
        assert!(!out.contains("b.py"));
    }

    #[test]
    fn test_fallback_search_no_matches() {
        let files = vec![("a.py".to_string(), "abc".to_string())];
        assert_eq!(fallback_search(&files, "zzz"), "No matches found for 'zzz'");
    }
}
