//! Configuration management for the address scanner

use crate::constants::OPENAI_KEY_PLACEHOLDER;
use crate::error::{Result, ScannerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables layered over file values
const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";

/// Raw configuration structure matching credentials.json
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    pub supabase: Option<SupabaseConfig>,

    #[serde(default)]
    pub openai: Option<OpenAIConfig>,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub supabase: Option<SupabaseConfig>,
    pub openai: Option<OpenAIConfig>,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(alias = "base_url")]
    pub url: String,

    #[serde(alias = "api_key", alias = "anon_key")]
    pub service_role_key: String,

    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,

    /// Model used for image input
    #[serde(default = "default_vision_model")]
    pub model: String,

    /// Model used for plain-text input
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
        }
    }
}

impl RawConfig {
    /// Layer environment values over the file sections
    fn apply_env(
        &mut self,
        supabase_url: Option<String>,
        supabase_key: Option<String>,
        openai_key: Option<String>,
    ) {
        if let Some(supabase) = self.supabase.as_mut() {
            if let Some(url) = supabase_url {
                supabase.url = url;
            }
            if let Some(key) = supabase_key {
                supabase.service_role_key = key;
            }
        } else {
            match (supabase_url, supabase_key) {
                (Some(url), Some(service_role_key)) => {
                    self.supabase = Some(SupabaseConfig {
                        url,
                        service_role_key,
                        table: default_table(),
                    });
                }
                (None, None) => {}
                _ => log::warn!(
                    "Ignoring Supabase environment: both {} and {} are needed without a supabase section",
                    ENV_SUPABASE_URL,
                    ENV_SUPABASE_KEY
                ),
            }
        }

        if let Some(api_key) = openai_key {
            match self.openai.as_mut() {
                Some(openai) => openai.api_key = api_key,
                None => self.openai = Some(OpenAIConfig::with_api_key(api_key)),
            }
        }
    }
}

impl OpenAIConfig {
    /// Default models and limits for the given key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_vision_model(),
            text_model: default_text_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

// Default functions
fn default_table() -> String {
    "addresses".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_text_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl ScannerConfig {
    /// Load configuration from a JSON file, with environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScannerError::Config(format!(
                "Failed to read config file: {} does not exist",
                path.display()
            )));
        }
        Self::load(Some(path))
    }

    /// Load configuration from an optional JSON file and the process environment.
    ///
    /// A missing file is not an error here; the result then only carries
    /// environment values and defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Same as [`ScannerConfig::load`] with variables resolved through `env`.
    /// Blank variables count as unset.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let mut raw: RawConfig = builder
            .build()?
            .try_deserialize()
            .map_err(|e| ScannerError::Config(format!("Failed to parse config: {}", e)))?;

        let lookup = |name: &str| {
            env(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        raw.apply_env(
            lookup(ENV_SUPABASE_URL),
            lookup(ENV_SUPABASE_KEY),
            lookup(ENV_OPENAI_KEY),
        );

        let config = Self::from_raw_config(raw);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| ScannerError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self::from_raw_config(raw);
        config.validate()?;
        Ok(config)
    }

    fn from_raw_config(raw: RawConfig) -> Self {
        // A placeholder or blank key means the LLM is not configured
        let openai = raw.openai.filter(|openai| {
            let key = openai.api_key.trim();
            !key.is_empty() && key != OPENAI_KEY_PLACEHOLDER
        });

        Self {
            supabase: raw.supabase,
            openai,
            storage: raw.storage,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(supabase) = &self.supabase {
            if !(supabase.url.starts_with("http://") || supabase.url.starts_with("https://")) {
                return Err(ScannerError::Config(
                    "Supabase url must start with http:// or https://".to_string(),
                ));
            }

            if supabase.service_role_key.is_empty() {
                return Err(ScannerError::Config("Supabase key is required".to_string()));
            }

            if supabase.table.is_empty() {
                return Err(ScannerError::Config("Supabase table name is required".to_string()));
            }
        }

        if let Some(openai) = &self.openai {
            if openai.model.is_empty() || openai.text_model.is_empty() {
                return Err(ScannerError::Config("OpenAI model names are required".to_string()));
            }
        }

        Ok(())
    }

    /// Remote store settings, required by the database commands
    pub fn supabase(&self) -> Result<&SupabaseConfig> {
        self.supabase.as_ref().ok_or_else(|| {
            ScannerError::Config(format!(
                "Missing Supabase configuration. Add a \"supabase\" section or set {} and {}",
                ENV_SUPABASE_URL, ENV_SUPABASE_KEY
            ))
        })
    }

    /// LLM settings, required by image scanning
    pub fn openai(&self) -> Result<&OpenAIConfig> {
        self.openai.as_ref().ok_or_else(|| {
            ScannerError::Config(format!(
                "OpenAI API key not configured. Add an \"openai\" section or set {}",
                ENV_OPENAI_KEY
            ))
        })
    }
}
