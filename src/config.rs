use crate::catalog::LengthMode;
use crate::error::StoryError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.yml";

pub const ENV_MODEL_TOKEN: &str = "GLM_MODEL_TOKEN";
pub const ENV_SPEECH_KEY: &str = "AZURE_SPEECH_KEY";
pub const ENV_SPEECH_REGION: &str = "AZURE_REGION";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub length_mode: LengthMode,

    #[serde(default)]
    pub auto_narrate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_token: Option<String>,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,

    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AzureConfig {
    #[serde(default)]
    pub speech_key: String,
    #[serde(default)]
    pub region: String,
    /// Overrides the regional endpoint derived from `region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_tts_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub player_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_folder: default_output(),
            length_mode: LengthMode::default(),
            auto_narrate: false,
            model_token: None,
            llm: LlmConfig::default(),
            azure: None,
            audio: AudioConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            output_format: default_output_format(),
            timeout_seconds: default_tts_timeout(),
            player_command: Vec::new(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_llm_base_url() -> String {
    "https://open.bigmodel.cn/api/paas/v4".to_string()
}
fn default_llm_model() -> String {
    "glm-3-turbo".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_tts_provider() -> String {
    "azure".to_string()
}
fn default_output_format() -> String {
    "audio-24khz-48kbitrate-mono-mp3".to_string()
}
fn default_tts_timeout() -> u64 {
    30
}

impl Config {
    /// Reads `config.yml` from the working directory, then applies
    /// environment overrides. A missing file means all defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Environment variables take precedence over values from the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_MODEL_TOKEN) {
            self.model_token = Some(token);
        }
        if let Some(key) = non_empty(ENV_SPEECH_KEY) {
            self.azure.get_or_insert_with(Default::default).speech_key = key;
        }
        if let Some(region) = non_empty(ENV_SPEECH_REGION) {
            self.azure.get_or_insert_with(Default::default).region = region;
        }
    }

    pub fn validate(&self) -> Result<(), StoryError> {
        if self.model_token().is_none() {
            return Err(StoryError::Config(format!(
                "missing model token (set {} or model_token in {})",
                ENV_MODEL_TOKEN, CONFIG_FILE
            )));
        }

        url::Url::parse(&self.llm.base_url).map_err(|e| {
            StoryError::Config(format!("invalid llm.base_url '{}': {}", self.llm.base_url, e))
        })?;

        match self.audio.provider.as_str() {
            "azure" => {
                let azure = self.azure.as_ref();
                let key_ok = azure.map_or(false, |a| !a.speech_key.trim().is_empty());
                let region_ok = azure.map_or(false, |a| !a.region.trim().is_empty());
                if !key_ok || !region_ok {
                    return Err(StoryError::Config(
                        "Missing speech key or region in configuration".to_string(),
                    ));
                }
            }
            "edge-tts" => {}
            other => {
                return Err(StoryError::Config(format!("Unknown TTS provider: {}", other)));
            }
        }
        Ok(())
    }

    pub fn model_token(&self) -> Option<&str> {
        self.model_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_folder)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}
