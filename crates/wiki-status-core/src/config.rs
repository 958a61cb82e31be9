use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::Locale;

pub const CONFIG_FILE: &str = ".wiki-status.toml";

/// Top-level configuration from `.wiki-status.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub locales: LocalesConfig,
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<ExclusionConfig>,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locales: LocalesConfig::default(),
            exclusions: default_exclusions(),
            history: HistoryConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalesConfig {
    #[serde(default = "default_baseline")]
    pub baseline: String,
    #[serde(default = "default_supported")]
    pub supported: Vec<Locale>,
}

fn default_baseline() -> String {
    "en".to_string()
}

fn default_supported() -> Vec<Locale> {
    [
        ("en", "English", "GB"),
        ("ar", "اَلْعَرَبِيَّةُ", "SA"),
        ("be", "Беларуская мова", "BY"),
        ("bg", "Български", "BG"),
        ("ca", "Català", "AD"),
        ("cs", "Česky", "CZ"),
        ("da", "Dansk", "DK"),
        ("de", "Deutsch", "DE"),
        ("el", "Ελληνικά", "GR"),
        ("es", "Español", "ES"),
        ("fa-ir", "فارسی", "IR"),
        ("fi", "Suomi", "FI"),
        ("fil", "Filipino", "PH"),
        ("fr", "Français", "FR"),
        ("he", "עִבְרִית", "IL"),
        ("hu", "Magyar", "HU"),
        ("id", "Bahasa Indonesia", "ID"),
        ("it", "Italiano", "IT"),
        ("ja", "日本語", "JP"),
        ("ko", "한국어", "KR"),
        ("lt", "Lietuvių kalba", "LT"),
        ("nl", "Nederlands", "NL"),
        ("no", "Norsk", "NO"),
        ("pl", "Polski", "PL"),
        ("pt", "Português", "PT"),
        ("pt-br", "Português (Brasil)", "BR"),
        ("ro", "Română", "RO"),
        ("ru", "Русский", "RU"),
        ("sk", "Slovenčina", "SK"),
        ("sl", "Slovenščina", "SI"),
        ("sr", "Српски", "RS"),
        ("sv", "Svenska", "SE"),
        ("th", "ไทย", "TH"),
        ("tr", "Türkçe", "TR"),
        ("uk", "Українська мова", "UA"),
        ("vi", "Tiếng Việt", "VN"),
        ("zh", "简体中文", "CN"),
        ("zh-tw", "繁體中文（台灣）", "TW"),
    ]
    .into_iter()
    .map(|(code, name, flag)| Locale::new(code, name, flag))
    .collect()
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            supported: default_supported(),
        }
    }
}

impl LocalesConfig {
    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.iter().any(|l| l.code == code)
    }

    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.supported.iter().find(|l| l.code == code)
    }
}

/// A baseline article path pattern that never needs translating.
///
/// Both `pattern` and `except` are case-insensitive regexes matched against
/// the logical article path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionConfig {
    pub pattern: String,
    #[serde(default)]
    pub except: Vec<String>,
}

impl ExclusionConfig {
    fn new(pattern: &str, except: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            except: except.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn default_exclusions() -> Vec<ExclusionConfig> {
    vec![
        ExclusionConfig::new(r"(?:^|/)legal/sctl$", &[]),
        ExclusionConfig::new(r"(?:^|/)news_styling_criteria$", &[]),
        ExclusionConfig::new(r"(?:^|/)staff_log(?:$|/)", &[]),
        ExclusionConfig::new(r"(?:^|/)contests/", &[]),
        ExclusionConfig::new(
            r"(?:^|/)tournaments/",
            &[r"(?:^|/)tournaments/(?:badge-weighted_seeding|countries_that_participated_in_osu!_tournaments|official_support)(?:$|/)"],
        ),
    ]
}

/// Access to the version history of the wiki checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Branch diffs are computed against.
    #[serde(default = "default_mainline")]
    pub mainline: String,
    #[serde(default = "default_git")]
    pub git: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_mainline() -> String {
    "master".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    5000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mainline: default_mainline(),
            git: default_git(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl HistoryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Locales with fewer articles than this are hidden in the locale menu.
    #[serde(default = "default_hidden_threshold")]
    pub hidden_locale_threshold: usize,
}

fn default_hidden_threshold() -> usize {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            hidden_locale_threshold: default_hidden_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from a `.wiki-status.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `wiki-status init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.wiki-status.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults."
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `wiki-status init`.
    pub fn default_toml() -> String {
        r#"# wiki-status configuration

[locales]
# Locale every other locale is compared against
baseline = "en"
# Omit `supported` to use the built-in osu! wiki locale list.
# [[locales.supported]]
# code = "fr"
# name = "Français"
# flag = "FR"

[history]
# Branch that outdated diffs are computed against
mainline = "master"
git = "git"
# Launching git can fail transiently under memory pressure; retry with a fixed delay.
retry_attempts = 5
retry_delay_ms = 5000

[report]
# Locales with fewer articles are hidden in the locale menu
hidden_locale_threshold = 10

# Baseline articles that never need translating (case-insensitive regexes).
# Defining any [[exclusions]] replaces the built-in list.
[[exclusions]]
pattern = "(?:^|/)legal/sctl$"

[[exclusions]]
pattern = "(?:^|/)news_styling_criteria$"

[[exclusions]]
pattern = "(?:^|/)staff_log(?:$|/)"

[[exclusions]]
pattern = "(?:^|/)contests/"

[[exclusions]]
pattern = "(?:^|/)tournaments/"
except = ["(?:^|/)tournaments/(?:badge-weighted_seeding|countries_that_participated_in_osu!_tournaments|official_support)(?:$|/)"]
"#
        .to_string()
    }
}
