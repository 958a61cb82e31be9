use regex::{Regex, RegexBuilder};

use crate::config::ExclusionConfig;
use crate::error::WikiError;

/// A compiled exclusion rule.
struct CompiledExclusion {
    pattern: Regex,
    except: Vec<Regex>,
}

/// Baseline article paths that are deliberately left untranslated.
pub struct ExclusionRules {
    rules: Vec<CompiledExclusion>,
}

fn compile(pattern: &str) -> Result<Regex, WikiError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| WikiError::Config(format!("invalid exclusion pattern '{pattern}': {e}")))
}

impl ExclusionRules {
    pub fn compile(configs: &[ExclusionConfig]) -> Result<Self, WikiError> {
        let rules = configs
            .iter()
            .map(|cfg| {
                Ok(CompiledExclusion {
                    pattern: compile(&cfg.pattern)?,
                    except: cfg
                        .except
                        .iter()
                        .map(|p| compile(p))
                        .collect::<Result<_, WikiError>>()?,
                })
            })
            .collect::<Result<_, WikiError>>()?;
        Ok(Self { rules })
    }

    /// Whether a missing translation of `article_path` should not be reported.
    pub fn is_excluded(&self, article_path: &str) -> bool {
        self.rules.iter().any(|rule| {
            rule.pattern.is_match(article_path)
                && !rule.except.iter().any(|e| e.is_match(article_path))
        })
    }
}
