//! Command-line argument parsing for the highlighter
//!
//! Supports:
//! - Highlighting a JSON document or a plain source file
//! - Reading from stdin when no path is given
//! - ANSI or JSON output
//! - Listing themes and languages

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::HighlightConfig;
use crate::model::{Document, Node};
use crate::syntax::LanguageId;

/// Highlight code blocks inside a rich-text document
#[derive(Parser, Debug)]
#[command(
    name = "codeblock-highlight",
    version,
    about = "Highlight code blocks inside a rich-text document"
)]
pub struct CliArgs {
    /// Document (.json) or source file to highlight; stdin when omitted
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Ansi)]
    pub format: OutputFormat,

    /// Theme for blocks without a theme attribute
    #[arg(short = 't', long, value_name = "ID")]
    pub theme: Option<String>,

    /// Language for blocks without a language attribute
    #[arg(short = 'l', long, value_name = "ID")]
    pub language: Option<String>,

    /// Config file to use instead of the user config
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How long to wait for grammars and themes to load
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// List available themes and exit
    #[arg(long)]
    pub list_themes: bool,

    /// List supported languages and exit
    #[arg(long)]
    pub list_languages: bool,
}

/// How decorations are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Code blocks with 24-bit terminal colors (default)
    #[default]
    Ansi,
    /// The decoration set as JSON
    Json,
}

/// Where the document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    /// A serialized document (`{"content": [...]}`)
    Document(PathBuf),
    /// Any other file, wrapped in a single code block
    SourceFile(PathBuf),
}

/// What the binary should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    ListThemes,
    ListLanguages,
    Highlight(InputSource),
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    pub format: OutputFormat,
    pub timeout: Duration,
    config_path: Option<PathBuf>,
    theme: Option<String>,
    language: Option<String>,
}

impl CliArgs {
    /// Convert parsed CLI args into a run configuration
    pub fn into_config(self) -> Result<RunConfig, String> {
        if self.list_themes && self.list_languages {
            return Err("--list-themes and --list-languages are mutually exclusive".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("--timeout-ms must be greater than zero".to_string());
        }

        let mode = if self.list_themes {
            RunMode::ListThemes
        } else if self.list_languages {
            RunMode::ListLanguages
        } else {
            match self.path {
                None => RunMode::Highlight(InputSource::Stdin),
                Some(path) if path.is_dir() => {
                    return Err(format!("{} is a directory", path.display()));
                }
                Some(path) if is_document_path(&path) => {
                    RunMode::Highlight(InputSource::Document(path))
                }
                Some(path) => RunMode::Highlight(InputSource::SourceFile(path)),
            }
        };

        Ok(RunConfig {
            mode,
            format: self.format,
            timeout: Duration::from_millis(self.timeout_ms),
            config_path: self.config,
            theme: non_empty(self.theme),
            language: non_empty(self.language),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

impl RunConfig {
    /// Highlight settings: the config file (explicit or user), with the
    /// `--theme`/`--language` overrides applied
    pub fn highlight_config(&self) -> Result<HighlightConfig, String> {
        let mut config = match &self.config_path {
            Some(path) => HighlightConfig::load_from(path)?,
            None => HighlightConfig::load(),
        };
        if let Some(theme) = &self.theme {
            config.default_theme = theme.clone();
        }
        if let Some(language) = &self.language {
            config.default_language = language.clone();
        }
        Ok(config)
    }
}

impl InputSource {
    /// Read and build the document to highlight
    pub fn read_document(&self) -> anyhow::Result<Document> {
        match self {
            InputSource::Stdin => {
                let mut input = String::new();
                std::io::stdin().read_to_string(&mut input)?;
                Ok(document_from_stdin(&input))
            }
            InputSource::Document(path) => {
                let json = std::fs::read_to_string(path)?;
                Document::from_json(&json).map_err(anyhow::Error::msg)
            }
            InputSource::SourceFile(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(source_document(&text, LanguageId::from_path(path)))
            }
        }
    }
}

/// Stdin holds either a serialized document or raw code
fn document_from_stdin(input: &str) -> Document {
    match Document::from_json(input) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("Stdin is not a document ({}), treating it as code", e);
            Document::new(vec![Node::code_block(None, input)])
        }
    }
}

/// A document holding `text` as its only code block. Plain text leaves the
/// language unset so the configured default applies.
fn source_document(text: &str, language: LanguageId) -> Document {
    let attr = (language != LanguageId::PlainText).then(|| language.id());
    Document::new(vec![Node::code_block(attr, text)])
}
