use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs, path::Path};

pub const DEFAULT_PORT: u16 = 5151;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ASSISTANT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub listen_port: Option<u16>,
    pub dev_cors_origin: Option<String>,
    /// IANA zone used to decide what "today" is. Defaults to UTC.
    pub timezone: Option<String>,
    /// Front-end files served for paths outside `/api`.
    pub static_dir: Option<PathBuf>,
    pub assistant: Option<AssistantConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Falls back to `$GEMINI_API_KEY`.
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Language the assistant is asked to reply in.
    pub reply_language: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            reply_language: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_ASSISTANT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_ASSISTANT_TIMEOUT_SECS
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
            ConfigError::Invalid(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    /// Reads `$CONFIG_PATH` (default `config.yaml`). A missing default file
    /// yields the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var("CONFIG_PATH") {
            Ok(path) => Self::load_from_path(path),
            Err(_) if !Path::new("config.yaml").exists() => {
                let cfg = Self::default();
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => Self::load_from_path("config.yaml"),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        let cfg = Self::from_yaml(&text)?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not a mapping
        let cfg: AppConfig = if text.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        if let Some(a) = &self.assistant
            && a.timeout_secs == 0
        {
            return Err(ConfigError::Invalid(
                "assistant.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The configured time zone, UTC when unset.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        match &self.timezone {
            None => Ok(chrono_tz::UTC),
            Some(name) => name
                .parse::<chrono_tz::Tz>()
                .map_err(|e| ConfigError::Invalid(format!("timezone {name:?}: {e}"))),
        }
    }

    /// Assistant settings with `$GEMINI_API_KEY` applied. `None` when no key
    /// is available from either source.
    pub fn effective_assistant(&self) -> Option<AssistantConfig> {
        let mut cfg = self.assistant.clone().unwrap_or_default();
        if cfg.api_key.as_deref().is_none_or(str::is_empty) {
            cfg.api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        cfg.api_key.as_ref()?;
        Some(cfg)
    }
}
