//! Guardrails configuration

use crate::error::{GuardrailsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use veilguard_pii::{EntityType, MatcherConfig, RedactionEngine};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// Matcher selection
    #[serde(default)]
    pub pii: MatcherConfig,

    /// Deepest container nesting accepted in prompt variables
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            pii: MatcherConfig::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl GuardrailsConfig {
    /// Load from a YAML or TOML file (chosen by extension, YAML otherwise)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("VEILGUARD_MAX_DEPTH") {
            match val.trim().parse() {
                Ok(depth) => self.max_depth = depth,
                Err(_) => tracing::warn!(value = %val, "Invalid VEILGUARD_MAX_DEPTH, keeping {}", self.max_depth),
            }
        }

        // Comma-separated entity tags whose built-in matcher is switched off
        if let Some(val) = var("VEILGUARD_DISABLE") {
            for tag in val.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                match tag.parse::<EntityType>() {
                    Ok(entity) => self.pii.disable(entity),
                    Err(e) => tracing::warn!("Ignoring VEILGUARD_DISABLE entry: {}", e),
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(GuardrailsError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if let Some(pattern) = self.pii.custom_patterns.iter().find(|p| p.name.trim().is_empty()) {
            return Err(GuardrailsError::Config(format!(
                "custom pattern '{}' has an empty name",
                pattern.pattern
            )));
        }

        Ok(())
    }
}

fn default_max_depth() -> usize {
    RedactionEngine::DEFAULT_MAX_DEPTH
}
