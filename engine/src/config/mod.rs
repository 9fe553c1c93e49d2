//! Configuration management
//!
//! This module handles loading, validation, and management of the Daybook
//! configuration. Configuration is stored in TOML format at
//! ~/.daybook/config.toml and is constructed once at process start, then
//! threaded into every component that needs it.
//!
//! # Configuration Sections
//!
//! - **core**: Data root (where notes and context files live), log level
//! - **llm**: Primary model, token ceiling, provider base URLs
//! - **extraction**: Context document, allowed categories, confidence floor,
//!   confirmation rules
//! - **memory**: Enrichment archive settings
//! - **todoist**: Remote task service settings
//!
//! # Path Expansion
//!
//! The configuration system automatically expands ~ to the user's home
//! directory and creates the data root if it doesn't exist. API keys and
//! tokens are NOT stored here; they come from environment variables
//! (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `TODOIST_API_TOKEN`).
//!
//! # Examples
//!
//! ```no_run
//! use daybook_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Primary model: {}", config.llm.primary_model);
//! # Ok(())
//! # }
//! ```

use crate::extractor::constraints::ConfirmationRule;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// Model client configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Extraction pipeline configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Memory enrichment configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Todoist publisher configuration
    #[serde(default)]
    pub todoist: TodoistConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data root where notes, context documents and the memory archive live
    /// (supports ~ expansion)
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Model client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Primary model used for extraction
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Token ceiling for extraction calls
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    // Note: API key comes from OPENAI_API_KEY, not from config
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
    // Note: API key comes from ANTHROPIC_API_KEY, not from config
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Context document scraped for active project headings,
    /// relative to the data root
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,

    /// Allowed project categories the model may assign
    #[serde(default = "default_allowed_projects")]
    pub allowed_projects: Vec<String>,

    /// Confidence floor; tasks below it are dropped during validation
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Confirmation rules applied by the constraint engine, in order
    #[serde(default = "default_confirmation_rules")]
    pub require_confirmation_for: Vec<ConfirmationRule>,
}

/// Memory enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Enable context enrichment from the memory archive
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON-lines archive file, relative to the data root
    #[serde(default = "default_archive_file")]
    pub archive_file: PathBuf,

    /// Maximum hits per task
    #[serde(default = "default_memory_limit")]
    pub limit: usize,

    /// Minimum relevance score for a hit to be used
    #[serde(default = "default_memory_min_score")]
    pub min_score: f64,
}

/// Todoist publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    /// Base URL for the Todoist REST API
    #[serde(default = "default_todoist_base_url")]
    pub base_url: String,

    /// Section name looked up within the resolved project
    #[serde(default = "default_section")]
    pub default_section: String,

    /// Pacing delay between task creation calls, in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

// Default value functions
fn default_data_root() -> PathBuf {
    PathBuf::from("~/daybook-data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_primary_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_context_file() -> PathBuf {
    PathBuf::from("personal/context/current_projects.md")
}

fn default_allowed_projects() -> Vec<String> {
    vec![
        "Work".to_string(),
        "Personal".to_string(),
        "Learning".to_string(),
    ]
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_confirmation_rules() -> Vec<ConfirmationRule> {
    vec![
        ConfirmationRule::TasksOver4Hours,
        ConfirmationRule::TasksWithFinancialImpact,
        ConfirmationRule::TasksAffectingFamilySchedule,
    ]
}

fn default_archive_file() -> PathBuf {
    PathBuf::from("memory/archive.jsonl")
}

fn default_memory_limit() -> usize {
    2
}

fn default_memory_min_score() -> f64 {
    0.6
}

fn default_todoist_base_url() -> String {
    "https://api.todoist.com/rest/v2".to_string()
}

fn default_section() -> String {
    "backlog".to_string()
}

fn default_pacing_ms() -> u64 {
    100
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            max_tokens: default_max_tokens(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_file: default_context_file(),
            allowed_projects: default_allowed_projects(),
            min_confidence: default_min_confidence(),
            require_confirmation_for: default_confirmation_rules(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            archive_file: default_archive_file(),
            limit: default_memory_limit(),
            min_score: default_memory_min_score(),
        }
    }
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            base_url: default_todoist_base_url(),
            default_section: default_section(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.daybook/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Validates the configuration after loading and returns descriptive errors
    /// if validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails,
    /// or validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.daybook/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".daybook").join("config.toml"))
    }

    /// Create a default configuration
    fn default_config() -> Self {
        Self {
            core: CoreConfig {
                data_root: default_data_root(),
                log_level: default_log_level(),
            },
            llm: LlmConfig::default(),
            extraction: ExtractionConfig::default(),
            memory: MemoryConfig::default(),
            todoist: TodoistConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// Validates required fields and value ranges, expands ~ in the data root,
    /// and creates the data root if it doesn't exist.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate thresholds
        if self.extraction.min_confidence < 0.0 || self.extraction.min_confidence > 1.0 {
            return Err(EngineError::Config(
                "extraction.min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.memory.min_score < 0.0 || self.memory.min_score > 1.0 {
            return Err(EngineError::Config(
                "memory.min_score must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(EngineError::Config(
                "llm.max_tokens must be greater than zero".to_string(),
            ));
        }

        if self.extraction.allowed_projects.is_empty() {
            return Err(EngineError::Config(
                "extraction.allowed_projects must not be empty".to_string(),
            ));
        }

        // Expand the data root and create it if it doesn't exist
        self.core.data_root = expand_path(&self.core.data_root)?;
        if !self.core.data_root.exists() {
            fs::create_dir_all(&self.core.data_root)
                .map_err(|e| EngineError::Config(format!("Failed to create data root: {}", e)))?;
        }

        Ok(())
    }

    /// Absolute path of the context document under the data root
    pub fn context_file_path(&self) -> PathBuf {
        self.core.data_root.join(&self.extraction.context_file)
    }

    /// Absolute path of the memory archive under the data root
    pub fn archive_file_path(&self) -> PathBuf {
        self.core.data_root.join(&self.memory.archive_file)
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
