//! TOML configuration for promptool
//!
//! Loaded from `promptool.toml` (or the `--config` path). Every section has
//! defaults, so an empty or missing file yields a usable configuration that
//! talks to a local OpenAI-compatible server.
//!
//! ```toml
//! log_level = "info"
//!
//! [llm]
//! base_url = "http://localhost:11434/v1"
//! model = "llama3.2"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [llm.model_info]
//! function_calling = false
//!
//! [agent]
//! system_prompt = "You are a helpful assistant."
//! max_tool_iterations = 5
//!
//! [tools]
//! enabled = ["calculator", "echo", "current_time"]
//! ```

use crate::llm::capabilities::ModelInfo;
use crate::types::IterationBudget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "promptool.toml";

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Tool '{0}' enabled in config does not exist")]
    UnknownTool(String),
}

/// Root configuration structure loaded from promptool.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptoolConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// `pretty` or `json`
    pub log_format: LogFormat,
}

impl Default for PromptoolConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

// ============= LLM Configuration =============

/// Model endpoint and the capability hints fed to the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API, without `/chat/completions`
    pub base_url: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Stream model replies token by token
    pub stream: bool,

    /// Client-level "parallel tool calls" setting
    pub parallel_tool_calls: Option<bool>,

    /// Explicit native function-calling flag
    pub function_calling: Option<bool>,

    /// Structured model metadata
    pub model_info: Option<ModelInfo>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2".to_string(),
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
            stream: false,
            parallel_tool_calls: None,
            function_calling: None,
            model_info: None,
        }
    }
}

impl LlmConfig {
    /// API key from the configured environment variable, if any.
    ///
    /// A configured but unset variable is an error; no variable configured
    /// means an unauthenticated endpoint.
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.api_key_env {
            Some(name) => std::env::var(name)
                .map(Some)
                .map_err(|_| ConfigError::MissingEnvVar(name.clone())),
            None => Ok(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,

    pub system_prompt: String,

    /// Maximum request/parse/execute cycles per run
    pub max_tool_iterations: usize,

    /// Dispatch the calls of one turn concurrently
    pub parallel_tools: bool,

    /// Per-tool timeout in seconds; 0 disables it
    pub tool_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "assistant".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            max_tool_iterations: IterationBudget::DEFAULT,
            parallel_tools: false,
            tool_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    pub fn budget(&self) -> Result<IterationBudget, ConfigError> {
        IterationBudget::new(self.max_tool_iterations).map_err(|_| {
            ConfigError::ValidationError("agent.max_tool_iterations must be at least 1".into())
        })
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_secs > 0).then(|| Duration::from_secs(self.tool_timeout_secs))
    }
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Built-in tools to register
    pub enabled: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: crate::tools::BUILTIN_TOOLS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl PromptoolConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: PromptoolConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load from an explicit path, or from `promptool.toml` if present,
    /// falling back to defaults.
    pub fn load_or_default(path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("llm.model must not be empty".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.base_url must not be empty".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "llm.temperature must be between 0 and 2, got {}",
                    temperature
                )));
            }
        }

        self.agent.budget()?;

        for name in &self.tools.enabled {
            if !crate::tools::BUILTIN_TOOLS.contains(&name.as_str()) {
                return Err(ConfigError::UnknownTool(name.clone()));
            }
        }

        Ok(())
    }
}
