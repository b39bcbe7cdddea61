use crate::error::{BloomError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default persona for the gardening assistant.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are BloomBot, an expert gardener and plant scientist. \
You provide helpful, concise, and scientifically accurate gardening advice. \
If asked about things unrelated to plants, gardening, or nature, politely redirect \
the user back to botanical topics.";

pub const DEFAULT_IDENTIFY_PROMPT: &str = "Identify this plant and provide detailed care \
information in JSON format. Be specific and helpful.";

pub const DEFAULT_GREETING: &str = "Hello! I'm BloomBot. I can help with plant diseases, \
soil questions, or even landscaping ideas. What's on your mind?";

pub const DEFAULT_GEMINI_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloomConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub identify: IdentifyConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_key: None,
            env_var: None,
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GeminiConfig {
    /// Resolve the credential for this backend.
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_api_key(
            self.api_key.as_deref(),
            self.env_var.as_deref(),
            DEFAULT_GEMINI_ENV_VAR,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyConfig {
    #[serde(default = "default_identify_thinking_budget")]
    pub thinking_budget: u32,
    #[serde(default = "default_identify_prompt")]
    pub prompt: String,
    #[serde(default = "default_mime_type")]
    pub default_mime_type: String,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            thinking_budget: default_identify_thinking_budget(),
            prompt: default_identify_prompt(),
            default_mime_type: default_mime_type(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_thinking_budget")]
    pub thinking_budget: u32,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            thinking_budget: default_chat_thinking_budget(),
            system_instruction: default_system_instruction(),
            greeting: default_greeting(),
            fallback_message: default_fallback_message(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_identify_thinking_budget() -> u32 {
    4000
}
fn default_identify_prompt() -> String {
    DEFAULT_IDENTIFY_PROMPT.to_string()
}
fn default_mime_type() -> String {
    "image/jpeg".to_string()
}
fn default_chat_thinking_budget() -> u32 {
    2000
}
fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}
fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}
fn default_fallback_message() -> String {
    crate::error::CHAT_FALLBACK_MESSAGE.to_string()
}
fn default_idle_timeout_secs() -> u64 {
    60
}

impl BloomConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/bloombot/config.toml (global)
    /// 2. .bloombot/config.toml (project)
    /// 3. .bloombot/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let (cfg, _warnings) = Self::load_with_warnings(project_dir)?;
        Ok(cfg)
    }

    /// Same as [`load`](Self::load), also returning what validation fixed.
    pub fn load_with_warnings(project_dir: Option<&Path>) -> Result<(Self, Vec<String>)> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = project_dir {
            let project_config = dir.join(".bloombot").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            let local_config = dir.join(".bloombot").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| BloomError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| BloomError::Config(e.to_string()))?;

        let warnings = cfg.validate();
        Ok((cfg, warnings))
    }

    /// Defaults only (no files).
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate config values, resetting unusable ones and logging warnings.
    /// Lenient: bad values are fixed in place rather than rejected.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.gemini.model.trim().is_empty() {
            warnings.push(format!(
                "gemini.model is empty, using {}",
                default_gemini_model()
            ));
            self.gemini.model = default_gemini_model();
        }

        let timeout_checks: Vec<(&str, &mut u64, u64)> = vec![
            (
                "gemini.request_timeout_secs",
                &mut self.gemini.request_timeout_secs,
                default_request_timeout_secs(),
            ),
            (
                "chat.idle_timeout_secs",
                &mut self.chat.idle_timeout_secs,
                default_idle_timeout_secs(),
            ),
        ];
        for (name, val, default) in timeout_checks {
            if *val == 0 {
                warnings.push(format!("{name} = 0, setting to {default}"));
                *val = default;
            }
        }

        if self.identify.thinking_budget == 0 {
            warnings.push(format!(
                "identify.thinking_budget = 0, setting to {}",
                default_identify_thinking_budget()
            ));
            self.identify.thinking_budget = default_identify_thinking_budget();
        }

        // Chat replies must stay cheaper than identifications.
        if self.chat.thinking_budget >= self.identify.thinking_budget {
            let clamped = self.identify.thinking_budget / 2;
            warnings.push(format!(
                "chat.thinking_budget ({}) >= identify.thinking_budget ({}), clamping to {clamped}",
                self.chat.thinking_budget, self.identify.thinking_budget
            ));
            self.chat.thinking_budget = clamped;
        }

        if self.identify.default_mime_type.trim().is_empty() {
            warnings.push(format!(
                "identify.default_mime_type is empty, using {}",
                default_mime_type()
            ));
            self.identify.default_mime_type = default_mime_type();
        }

        if self.identify.prompt.trim().is_empty() {
            warnings.push("identify.prompt is empty, using the default prompt".to_string());
            self.identify.prompt = default_identify_prompt();
        }

        if self.chat.system_instruction.trim().is_empty() {
            warnings.push(
                "chat.system_instruction is empty, using the default persona".to_string(),
            );
            self.chat.system_instruction = default_system_instruction();
        }

        if self.chat.fallback_message.trim().is_empty() {
            warnings.push("chat.fallback_message is empty, using the default".to_string());
            self.chat.fallback_message = default_fallback_message();
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }

    /// Render as TOML with the API key masked, for display.
    pub fn to_toml_redacted(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.gemini.api_key.is_some() {
            shown.gemini.api_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| BloomError::Config(format!("failed to serialize config: {e}")))
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bloombot").join("config.toml"))
}

/// Resolve an API key: check the config field first, then the environment variable.
pub fn resolve_api_key(
    api_key: Option<&str>,
    env_var_override: Option<&str>,
    default_env_var: &str,
) -> Result<String> {
    if let Some(key) = api_key {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    let env_var_name = env_var_override.unwrap_or(default_env_var);

    match std::env::var(env_var_name) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(BloomError::Config(format!(
            "Gemini backend requires an API key (set gemini.api_key or {env_var_name})"
        ))),
    }
}
