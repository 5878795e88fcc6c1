//! Name-based text file classification.
//!
//! Runs once per tree entry before any content is fetched, so it looks at
//! the path only: a lowercase extension allow-list, then a set of
//! well-known extensionless names.

const TEXT_EXTENSIONS: &[&str] = &[
    // programming languages
    "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "hpp", "cs", "php", "rb", "go", "rs",
    "swift", "kt", "scala", "clj", "hs", "elm", "dart", "lua", "perl", "r", "matlab", "m", "cc",
    "cxx", "c++", "cp", "h++", "hxx", "mjs", "cjs",
    // web
    "html", "htm", "css", "scss", "sass", "less", "vue", "svelte",
    // data
    "json", "xml", "yaml", "yml", "toml", "ini", "cfg", "conf", "csv", "tsv", "sql",
    // documentation
    "md", "txt", "rst", "asciidoc", "org",
    // shell
    "sh", "bash", "zsh", "fish", "bat", "cmd", "ps1",
    // build and config
    "dockerfile", "makefile", "cmake", "gradle", "maven", "package", "lock", "gitignore",
    "gitattributes",
    // other
    "log", "env", "example", "template", "spec",
];

const SPECIAL_FILENAMES: &[&str] = &[
    "readme",
    "license",
    "changelog",
    "contributing",
    "authors",
    "dockerfile",
    "makefile",
    "rakefile",
    "gemfile",
    "requirements",
];

/// Bare filename: everything after the last `/`.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension of the bare filename without the dot, or `""`.
///
/// Dots in directory names are ignored, so `a.b/README` has no extension.
/// Dotfiles such as `.gitignore` report the part after the dot.
pub fn file_type(path: &str) -> &str {
    file_name(path)
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Whether `path` names a text file eligible for ingestion and analysis.
pub fn is_text_file(path: &str) -> bool {
    let ext = file_type(path).to_ascii_lowercase();
    if !ext.is_empty() && TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    let name = file_name(path).to_ascii_lowercase();
    SPECIAL_FILENAMES.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions_accepted() {
        for path in [
            "src/main.rs",
            "app.py",
            "web/index.HTML",
            "config/settings.yaml",
            "docs/guide.md",
            "scripts/build.sh",
            "Cargo.lock",
            ".gitignore",
        ] {
            assert!(is_text_file(path), "{path} should be text");
        }
    }

    #[test]
    fn test_binary_extensions_rejected() {
        for path in ["logo.png", "app.exe", "archive.tar.gz", "font.woff2", "lib.so"] {
            assert!(!is_text_file(path), "{path} should not be text");
        }
    }

    #[test]
    fn test_extensionless_well_known_names() {
        assert!(is_text_file("README"));
        assert!(is_text_file("docker/Dockerfile"));
        assert!(is_text_file("LICENSE"));
        assert!(is_text_file("Makefile"));
        assert!(!is_text_file("bin/run"));
        assert!(!is_text_file("NOTES"));
    }

    #[test]
    fn test_dotted_directory_does_not_leak_extension() {
        assert_eq!(file_type("pkg.v2/README"), "");
        assert!(is_text_file("pkg.v2/README"));
        assert!(!is_text_file("pkg.md/blob"));
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("src/app.py"), "py");
        assert_eq!(file_type("Makefile"), "");
        assert_eq!(file_type("a/b/c.tar.gz"), "gz");
        assert_eq!(file_type(".env"), "env");
    }

    #[test]
    fn test_pure_function_of_path() {
        for path in ["x.rs", "README", "y.bin"] {
            assert_eq!(is_text_file(path), is_text_file(path));
        }
    }
}
