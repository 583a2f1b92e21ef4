//! Syntax color themes
//!
//! Themes are YAML documents mapping highlight capture names to colors.
//! Built-in themes are embedded at compile time; user themes are read
//! from the config directory and shadow built-ins with the same id.
//!
//! Theme loading priority:
//! 1. User config: `~/.config/codeblock-highlight/themes/{id}.yaml`
//! 2. Embedded: Built-in themes compiled into binary

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config_paths;
use crate::syntax::{FontStyle, HighlightId, SpanStyle, HIGHLIGHT_NAMES};

// Embed theme YAML files at compile time
pub const VITESSE_LIGHT_YAML: &str = include_str!("../themes/vitesse-light.yaml");
pub const VITESSE_DARK_YAML: &str = include_str!("../themes/vitesse-dark.yaml");
pub const GITHUB_LIGHT_YAML: &str = include_str!("../themes/github-light.yaml");
pub const GITHUB_DARK_YAML: &str = include_str!("../themes/github-dark.yaml");
pub const MIDNIGHT_YAML: &str = include_str!("../themes/midnight.yaml");

/// Identifier of the built-in fallback theme used when nothing is loaded
pub const PLAIN_THEME_ID: &str = "plain";

/// A built-in theme entry
pub struct BuiltinTheme {
    /// Stable identifier (e.g. "vitesse-light")
    pub id: &'static str,
    /// Embedded YAML content
    pub yaml: &'static str,
}

/// Registry of all built-in themes
pub const BUILTIN_THEMES: &[BuiltinTheme] = &[
    BuiltinTheme {
        id: "vitesse-light",
        yaml: VITESSE_LIGHT_YAML,
    },
    BuiltinTheme {
        id: "vitesse-dark",
        yaml: VITESSE_DARK_YAML,
    },
    BuiltinTheme {
        id: "github-light",
        yaml: GITHUB_LIGHT_YAML,
    },
    BuiltinTheme {
        id: "github-dark",
        yaml: GITHUB_DARK_YAML,
    },
    BuiltinTheme {
        id: "midnight",
        yaml: MIDNIGHT_YAML,
    },
];

/// Where the theme came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSource {
    /// User-defined theme in the config directory
    User,
    /// Built-in theme embedded in binary
    Builtin,
}

/// Information about an available theme
#[derive(Debug, Clone)]
pub struct ThemeInfo {
    pub id: String,
    /// Display name from YAML (e.g., "Vitesse Light")
    pub name: String,
    pub source: ThemeSource,
}

/// Whether a theme with this id exists, as a user file or a built-in
pub fn theme_exists(id: &str) -> bool {
    user_theme_path(id).is_some() || BUILTIN_THEMES.iter().any(|t| t.id == id)
}

fn user_theme_path(id: &str) -> Option<std::path::PathBuf> {
    let dir = config_paths::themes_dir()?;
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", id, ext)))
        .find(|path| path.is_file())
}

/// Load a theme from a YAML file; the id is the file stem
pub fn from_file(path: &Path) -> Result<Theme, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read theme file {}: {}", path.display(), e))?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("Invalid theme file name: {}", path.display()))?;
    Theme::from_yaml(id, &content)
}

/// Load theme by id with priority: user → builtin
pub fn load_theme(id: &str) -> Result<Theme, String> {
    if let Some(user_path) = user_theme_path(id) {
        tracing::info!("Loading user theme from {}", user_path.display());
        return from_file(&user_path);
    }

    tracing::debug!("Loading builtin theme: {}", id);
    Theme::from_builtin(id)
}

/// List all available themes from all sources
///
/// User themes override builtins with the same id.
pub fn list_available_themes() -> Vec<ThemeInfo> {
    let mut themes = Vec::new();
    let mut seen_ids = std::collections::HashSet::new();

    if let Some(user_dir) = config_paths::themes_dir() {
        if let Ok(entries) = std::fs::read_dir(&user_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
                {
                    if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                        if seen_ids.insert(id.to_string()) {
                            let name = extract_theme_name(&path).unwrap_or_else(|| id.to_string());
                            themes.push(ThemeInfo {
                                id: id.to_string(),
                                name,
                                source: ThemeSource::User,
                            });
                        }
                    }
                }
            }
        }
    }

    for builtin in BUILTIN_THEMES {
        if seen_ids.insert(builtin.id.to_string()) {
            let name = Theme::from_yaml(builtin.id, builtin.yaml)
                .map(|t| t.name)
                .unwrap_or_else(|_| builtin.id.to_string());
            themes.push(ThemeInfo {
                id: builtin.id.to_string(),
                name,
                source: ThemeSource::Builtin,
            });
        }
    }

    themes
}

/// Extract theme name from YAML file without full parsing
fn extract_theme_name(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("name:") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            return Some(value.to_string());
        }
    }
    None
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGB values (alpha defaults to 255)
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse from "#RRGGBB" or "#RRGGBBAA" hex string
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim_start_matches('#');
        if !s.is_ascii() {
            return Err(format!("Invalid color format: {}", s));
        }
        match s.len() {
            6 => Ok(Color {
                r: u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?,
                g: u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?,
                b: u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?,
                a: 255,
            }),
            8 => Ok(Color {
                r: u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?,
                g: u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?,
                b: u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?,
                a: u8::from_str_radix(&s[6..8], 16).map_err(|e| e.to_string())?,
            }),
            _ => Err(format!("Invalid color format: {}", s)),
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Light or dark, as declared by the theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

/// Raw theme data as parsed from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeData {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub colors: ColorsData,
    /// Capture name → style
    #[serde(default)]
    pub tokens: HashMap<String, TokenStyleData>,
}

/// Container colors (raw strings from YAML)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorsData {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub foreground: Option<String>,
}

/// Either `"#hex"` or `{ color, font_style }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenStyleData {
    Color(String),
    Full {
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        font_style: Option<String>,
    },
}

/// Resolved theme with parsed colors and one style per highlight category
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Cache identifier (file stem or builtin id)
    pub id: String,
    pub name: String,
    pub appearance: Appearance,
    pub background: Option<Color>,
    pub foreground: Option<Color>,
    /// Indexed by `HighlightId`
    styles: Vec<SpanStyle>,
}

impl Theme {
    /// Parse a theme from YAML, registering it under `id`
    pub fn from_yaml(id: &str, yaml: &str) -> Result<Self, String> {
        let data: ThemeData =
            serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))?;
        Self::from_data(id, data)
    }

    /// Load a built-in theme by id
    pub fn from_builtin(id: &str) -> Result<Self, String> {
        let entry = BUILTIN_THEMES
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| format!("Unknown theme id: {}", id))?;
        Theme::from_yaml(entry.id, entry.yaml)
    }

    /// Convert raw theme data to resolved theme
    pub fn from_data(id: &str, data: ThemeData) -> Result<Self, String> {
        let parse_opt = |value: &Option<String>| value.as_deref().map(Color::from_hex).transpose();

        let mut explicit: HashMap<&str, SpanStyle> = HashMap::new();
        for (name, token) in &data.tokens {
            let (color, font_style) = match token {
                TokenStyleData::Color(hex) => (Some(Color::from_hex(hex)?), FontStyle::default()),
                TokenStyleData::Full { color, font_style } => (
                    parse_opt(color)?,
                    font_style
                        .as_deref()
                        .map(FontStyle::parse)
                        .transpose()?
                        .unwrap_or_default(),
                ),
            };
            explicit.insert(
                name.as_str(),
                SpanStyle {
                    highlight: None,
                    color,
                    font_style,
                },
            );
        }

        let foreground = parse_opt(&data.colors.foreground)?;
        let styles = HIGHLIGHT_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut style = resolve_hierarchical(&explicit, name).unwrap_or(SpanStyle {
                    color: foreground,
                    ..SpanStyle::empty()
                });
                style.highlight = Some(index as HighlightId);
                style
            })
            .collect();

        Ok(Theme {
            id: id.to_string(),
            name: data.name,
            appearance: data.appearance,
            background: parse_opt(&data.colors.background)?,
            foreground,
            styles,
        })
    }

    /// Colorless theme used when no theme has been loaded yet
    pub fn plain() -> Self {
        Theme {
            id: PLAIN_THEME_ID.to_string(),
            name: "Plain".to_string(),
            appearance: Appearance::Light,
            background: None,
            foreground: None,
            styles: (0..HIGHLIGHT_NAMES.len())
                .map(|index| SpanStyle {
                    highlight: Some(index as HighlightId),
                    ..SpanStyle::empty()
                })
                .collect(),
        }
    }

    /// Style for a highlight category; `None` gives the neutral style
    pub fn style_for(&self, highlight: Option<HighlightId>) -> SpanStyle {
        highlight
            .and_then(|id| self.styles.get(id as usize).copied())
            .unwrap_or_else(|| self.neutral_style())
    }

    /// Style of uncaptured text
    pub fn neutral_style(&self) -> SpanStyle {
        SpanStyle {
            color: self.foreground,
            ..SpanStyle::empty()
        }
    }

    /// Inline CSS for the code block container
    pub fn container_css(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(bg) = self.background {
            parts.push(format!("background-color:{}", bg.to_hex()));
        }
        if let Some(fg) = self.foreground {
            parts.push(format!("color:{}", fg.to_hex()));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(";"))
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::plain()
    }
}

/// `keyword.function` falls back to `keyword` when only the parent is styled
fn resolve_hierarchical(styles: &HashMap<&str, SpanStyle>, name: &str) -> Option<SpanStyle> {
    let mut current = name;
    loop {
        if let Some(style) = styles.get(current) {
            return Some(*style);
        }
        let dot = current.rfind('.')?;
        current = &current[..dot];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::highlight_id_for_name;

    #[test]
    fn test_color_hex_round_trip() {
        let color = Color::from_hex("#1e754f").unwrap();
        assert_eq!(color, Color::rgb(0x1E, 0x75, 0x4F));
        assert_eq!(color.to_hex(), "#1E754F");
        assert_eq!(Color::rgba(0, 0, 0, 0x80).to_hex(), "#00000080");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn test_all_builtin_themes_parse() {
        for builtin in BUILTIN_THEMES {
            let theme = Theme::from_builtin(builtin.id)
                .unwrap_or_else(|e| panic!("{} failed: {}", builtin.id, e));
            assert_eq!(theme.id, builtin.id);
            assert!(theme.background.is_some());
            assert!(theme.foreground.is_some());
        }
    }

    #[test]
    fn test_token_styles_and_hierarchy() {
        let yaml = r##"
version: 1
name: "Test"
colors:
  foreground: "#111111"
tokens:
  keyword: "#FF0000"
  comment: { color: "#00FF00", font_style: italic }
"##;
        let theme = Theme::from_yaml("test", yaml).unwrap();
        let keyword = theme.style_for(highlight_id_for_name("keyword"));
        assert_eq!(keyword.color, Some(Color::rgb(0xFF, 0, 0)));
        let keyword_fn = theme.style_for(highlight_id_for_name("keyword.function"));
        assert_eq!(keyword_fn.color, Some(Color::rgb(0xFF, 0, 0)));
        assert_eq!(keyword_fn.highlight, highlight_id_for_name("keyword.function"));
        let comment = theme.style_for(highlight_id_for_name("comment"));
        assert!(comment.font_style.italic);
        // Unstyled categories take the foreground
        let number = theme.style_for(highlight_id_for_name("number"));
        assert_eq!(number.color, Some(Color::rgb(0x11, 0x11, 0x11)));
        assert_eq!(theme.style_for(None).color, Some(Color::rgb(0x11, 0x11, 0x11)));
    }

    #[test]
    fn test_invalid_theme_reports_error() {
        let bad_color = "version: 1\nname: x\ntokens:\n  keyword: \"nope\"\n";
        assert!(Theme::from_yaml("x", bad_color).is_err());
        assert!(Theme::from_yaml("x", "not: [valid").is_err());
        assert!(Theme::from_builtin("does-not-exist").is_err());
    }

    #[test]
    fn test_plain_theme_has_no_colors() {
        let plain = Theme::plain();
        assert_eq!(plain.id, PLAIN_THEME_ID);
        assert_eq!(plain.container_css(), None);
        assert_eq!(plain.style_for(highlight_id_for_name("keyword")).css(), None);
    }

    #[test]
    fn test_container_css() {
        let theme = Theme::from_builtin("vitesse-light").unwrap();
        assert_eq!(
            theme.container_css().as_deref(),
            Some("background-color:#FFFFFF;color:#393A34")
        );
    }
}
