//! Configuration management for prompt-optimizer
//!
//! Supports configuration via:
//! 1. Config file (~/.config/prompt-optimizer/config.toml)
//! 2. Environment variables (PROMPT_OPTIMIZER_AGGRESSIVENESS, etc.)
//! 3. CLI arguments (override file/env settings)

use crate::metrics::ModelPricing;
use crate::optimization::OptimizationConfig;
use crate::tokenizer::TokenEncoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optimizer settings
    pub optimizer: OptimizerSettings,

    /// Model price table for savings reports
    pub pricing: PricingSettings,
}

/// Optimizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Default aggressiveness (0.0 - 1.0)
    pub aggressiveness: f64,

    /// Encoding used for token counts (cl100k_base, p50k_base, r50k_base)
    pub encoding: TokenEncoding,

    /// Extra noun lemma file (one lemma per line)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            aggressiveness: 0.7,
            encoding: TokenEncoding::Cl100kBase,
            lexicon_path: None,
        }
    }
}

/// Price table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Model used for reports when none is given
    pub default_model: String,

    /// Model name -> price per 1000 tokens
    pub models: BTreeMap<String, ModelPricing>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("GPT-4".to_string(), ModelPricing::new(0.03, 0.06));
        models.insert("Claude".to_string(), ModelPricing::new(0.02, 0.08));
        models.insert("LLaMA 2".to_string(), ModelPricing::new(0.012, 0.04));

        Self {
            default_model: "GPT-4".to_string(),
            models,
        }
    }
}

impl PricingSettings {
    /// Case-insensitive model lookup
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.models
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(model))
            .map(|(_, pricing)| *pricing)
    }

    pub fn default_pricing(&self) -> Option<ModelPricing> {
        self.get(&self.default_model)
    }
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prompt-optimizer")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config.with_env_overrides())
    }

    /// Load config from a path that must exist
    pub fn load_required(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        Self::load_from(path)
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("PROMPT_OPTIMIZER_AGGRESSIVENESS") {
            match value.parse() {
                Ok(a) => self.optimizer.aggressiveness = a,
                Err(_) => warn!("Ignoring PROMPT_OPTIMIZER_AGGRESSIVENESS={}", value),
            }
        }
        if let Ok(value) = std::env::var("PROMPT_OPTIMIZER_ENCODING") {
            match value.parse() {
                Ok(encoding) => self.optimizer.encoding = encoding,
                Err(_) => warn!("Ignoring PROMPT_OPTIMIZER_ENCODING={}", value),
            }
        }
        if let Ok(path) = std::env::var("PROMPT_OPTIMIZER_LEXICON") {
            self.optimizer.lexicon_path = Some(PathBuf::from(path));
        }
        if let Ok(model) = std::env::var("PROMPT_OPTIMIZER_MODEL") {
            self.pricing.default_model = model;
        }

        self
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = self.optimizer.aggressiveness;
        if !(0.0..=1.0).contains(&a) {
            return Err(ConfigError::Invalid(format!(
                "optimizer.aggressiveness must be within 0.0-1.0, got {}",
                a
            )));
        }

        for (name, pricing) in &self.pricing.models {
            if pricing.input_per_1k < 0.0 || pricing.output_per_1k < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "pricing for {} must not be negative",
                    name
                )));
            }
        }

        if self.pricing.default_pricing().is_none() {
            return Err(ConfigError::Invalid(format!(
                "default model {} is not in the price table",
                self.pricing.default_model
            )));
        }

        if let Some(path) = &self.optimizer.lexicon_path {
            if !path.exists() {
                return Err(ConfigError::Invalid(format!(
                    "lexicon file {} does not exist",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Settings for building a `PromptOptimizer`
    pub fn optimization(&self) -> OptimizationConfig {
        OptimizationConfig {
            aggressiveness: self.optimizer.aggressiveness.clamp(0.0, 1.0) as f32,
            encoding: self.optimizer.encoding,
            lexicon_path: self.optimizer.lexicon_path.clone(),
        }
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = Config::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn aggressiveness(mut self, aggressiveness: f64) -> Self {
        self.config.optimizer.aggressiveness = aggressiveness;
        self
    }

    pub fn encoding(mut self, encoding: TokenEncoding) -> Self {
        self.config.optimizer.encoding = encoding;
        self
    }

    pub fn lexicon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.optimizer.lexicon_path = Some(path.into());
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.pricing.default_model = model.into();
        self
    }

    pub fn model_pricing(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.config.pricing.models.insert(model.into(), pricing);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
