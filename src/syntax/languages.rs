//! Language identification
//!
//! Maps the free-form language attribute of a code block (id, display name,
//! or alias, any case) to a known language, and provides the data the
//! language picker shows.

use std::path::Path;

/// Supported language identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LanguageId {
    #[default]
    PlainText,
    Rust,
    JavaScript,
    TypeScript,
    Json,
    Python,
    Go,
    Php,
    C,
    Cpp,
    Java,
    Bash,
    Scheme,
    Ini,
    Xml,
}

/// Static metadata for a language
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    pub language: LanguageId,
    /// Canonical identifier, also the grammar cache key
    pub id: &'static str,
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
}

/// Registry of every language the picker offers, plain text first
pub const LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        language: LanguageId::PlainText,
        id: "text",
        display_name: "Plain Text",
        aliases: &["plaintext", "plain", "txt"],
    },
    LanguageInfo {
        language: LanguageId::Rust,
        id: "rust",
        display_name: "Rust",
        aliases: &["rs"],
    },
    LanguageInfo {
        language: LanguageId::JavaScript,
        id: "javascript",
        display_name: "JavaScript",
        aliases: &["js", "mjs", "cjs", "jsx"],
    },
    LanguageInfo {
        language: LanguageId::TypeScript,
        id: "typescript",
        display_name: "TypeScript",
        aliases: &["ts", "mts", "cts"],
    },
    LanguageInfo {
        language: LanguageId::Json,
        id: "json",
        display_name: "JSON",
        aliases: &["jsonc"],
    },
    LanguageInfo {
        language: LanguageId::Python,
        id: "python",
        display_name: "Python",
        aliases: &["py"],
    },
    LanguageInfo {
        language: LanguageId::Go,
        id: "go",
        display_name: "Go",
        aliases: &["golang"],
    },
    LanguageInfo {
        language: LanguageId::Php,
        id: "php",
        display_name: "PHP",
        aliases: &[],
    },
    LanguageInfo {
        language: LanguageId::C,
        id: "c",
        display_name: "C",
        aliases: &["h"],
    },
    LanguageInfo {
        language: LanguageId::Cpp,
        id: "cpp",
        display_name: "C++",
        aliases: &["c++", "cc", "cxx", "hpp"],
    },
    LanguageInfo {
        language: LanguageId::Java,
        id: "java",
        display_name: "Java",
        aliases: &[],
    },
    LanguageInfo {
        language: LanguageId::Bash,
        id: "bash",
        display_name: "Bash",
        aliases: &["sh", "shell", "zsh", "shellscript"],
    },
    LanguageInfo {
        language: LanguageId::Scheme,
        id: "scheme",
        display_name: "Scheme",
        aliases: &["racket", "rkt", "scm"],
    },
    LanguageInfo {
        language: LanguageId::Ini,
        id: "ini",
        display_name: "INI",
        aliases: &["cfg", "conf", "properties"],
    },
    LanguageInfo {
        language: LanguageId::Xml,
        id: "xml",
        display_name: "XML",
        aliases: &["svg", "xsd", "xsl"],
    },
];

impl LanguageId {
    /// Resolve a language attribute by id, display name, or alias.
    /// Returns `None` for empty or unrecognized input.
    pub fn resolve(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        LANGUAGES
            .iter()
            .find(|info| {
                info.id.eq_ignore_ascii_case(name)
                    || info.display_name.eq_ignore_ascii_case(name)
                    || info.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
            })
            .map(|info| info.language)
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        Self::resolve(ext).unwrap_or(LanguageId::PlainText)
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(LanguageId::PlainText)
    }

    pub fn info(&self) -> &'static LanguageInfo {
        LANGUAGES
            .iter()
            .find(|info| info.language == *self)
            .unwrap_or(&LANGUAGES[0])
    }

    /// Canonical identifier (`"rust"`, `"javascript"`, `"text"`)
    pub fn id(&self) -> &'static str {
        self.info().id
    }

    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    /// Check if this language has syntax highlighting support
    pub fn has_highlighting(&self) -> bool {
        !matches!(self, LanguageId::PlainText)
    }
}

/// One entry of the language picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOption {
    pub id: &'static str,
    pub display_name: &'static str,
    pub selected: bool,
}

/// Every language, with the one matching `current` marked as selected
pub fn language_options(current: Option<&str>) -> Vec<LanguageOption> {
    let selected = current.and_then(LanguageId::resolve);
    LANGUAGES
        .iter()
        .map(|info| LanguageOption {
            id: info.id,
            display_name: info.display_name,
            selected: Some(info.language) == selected,
        })
        .collect()
}

/// Text shown in the read-only language tag of a code block: the canonical
/// id, or `text` when the attribute is missing or not a known language
pub fn language_tag(attr: Option<&str>) -> &'static str {
    attr.and_then(LanguageId::resolve)
        .unwrap_or(LanguageId::PlainText)
        .id()
}

/// Class name for the inner `<code>` element, e.g. `language-rust`
pub fn language_class(prefix: &str, attr: Option<&str>) -> String {
    format!("{}{}", prefix, language_tag(attr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_id_name_and_alias() {
        assert_eq!(LanguageId::resolve("rust"), Some(LanguageId::Rust));
        assert_eq!(LanguageId::resolve("JavaScript"), Some(LanguageId::JavaScript));
        assert_eq!(LanguageId::resolve("js"), Some(LanguageId::JavaScript));
        assert_eq!(LanguageId::resolve(" TS "), Some(LanguageId::TypeScript));
        assert_eq!(LanguageId::resolve("c++"), Some(LanguageId::Cpp));
        assert_eq!(LanguageId::resolve("text"), Some(LanguageId::PlainText));
    }

    #[test]
    fn test_resolve_unknown() {
        assert_eq!(LanguageId::resolve("x"), None);
        assert_eq!(LanguageId::resolve(""), None);
        assert_eq!(LanguageId::resolve("   "), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(LanguageId::from_extension("rs"), LanguageId::Rust);
        assert_eq!(LanguageId::from_extension("PY"), LanguageId::Python);
        assert_eq!(LanguageId::from_extension("unknown"), LanguageId::PlainText);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(LanguageId::from_path(Path::new("main.rs")), LanguageId::Rust);
        assert_eq!(
            LanguageId::from_path(Path::new("/tmp/no_extension")),
            LanguageId::PlainText
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = LANGUAGES.iter().map(|info| info.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), LANGUAGES.len());
    }

    #[test]
    fn test_language_options_selects_alias_match() {
        let options = language_options(Some("py"));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "python");
        assert!(language_options(Some("nope")).iter().all(|o| !o.selected));
    }

    #[test]
    fn test_language_tag_and_class() {
        assert_eq!(language_tag(None), "text");
        assert_eq!(language_tag(Some("")), "text");
        assert_eq!(language_tag(Some("js")), "javascript");
        assert_eq!(language_tag(Some("klingon")), "text");
        assert_eq!(language_class("language-", Some("js")), "language-javascript");
        assert_eq!(language_class("language-", Some("klingon")), "language-text");
        assert_eq!(language_class("language-", None), "language-text");
    }
}
