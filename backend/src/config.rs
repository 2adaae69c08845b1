use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
const DEFAULT_TRANSLATION_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid translation endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_TRANSLATION_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl TranslationConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.endpoint)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub translation: TranslationConfig,
    /// CSV column holding the text of each batch item.
    pub batch_text_column: String,
    pub max_upload_bytes: usize,
    /// Directory of the built dashboard; resolved at startup when unset.
    pub frontend_dir: Option<PathBuf>,
    /// Minutes a session's history survives without activity.
    pub session_idle_minutes: u32,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/sentiment_model.json"),
            vectorizer_path: PathBuf::from("models/tfidf_vectorizer.json"),
            translation: TranslationConfig::default(),
            batch_text_column: "text".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            frontend_dir: None,
            session_idle_minutes: 60,
            port: 8081,
        }
    }
}

impl AppConfig {
    /// Reads `$APP_CONFIG` (or `config/app.yaml` when present) and applies
    /// environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var("APP_CONFIG").ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if explicit.is_some() || path.exists() {
            let config = Self::from_file(&path)?;
            log::info!("Loaded configuration from {}", path.display());
            config
        } else {
            log::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overrides individual keys from `lookup`, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("VECTORIZER_PATH") {
            self.vectorizer_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRANSLATION_ENABLED") {
            self.translation.enabled = parse_bool("TRANSLATION_ENABLED", &value)?;
        }
        if let Some(value) = lookup("TRANSLATION_ENDPOINT") {
            self.translation.endpoint = value;
        }
        if let Some(value) = lookup("TRANSLATION_TIMEOUT_SECS") {
            self.translation.timeout_secs = parse_number("TRANSLATION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("BATCH_TEXT_COLUMN") {
            self.batch_text_column = value;
        }
        if let Some(value) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_number("MAX_UPLOAD_BYTES", &value)?;
        }
        if let Some(value) = lookup("FRONTEND_DIR") {
            self.frontend_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("SESSION_IDLE_MINUTES") {
            self.session_idle_minutes = parse_number("SESSION_IDLE_MINUTES", &value)?;
        }
        if let Some(value) = lookup("PORT") {
            self.port = parse_number("PORT", &value)?;
        }
        Ok(())
    }

    pub fn session_idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_idle_minutes))
    }

    pub fn resolve_frontend_dir(&self) -> PathBuf {
        if let Some(dir) = &self.frontend_dir {
            return dir.clone();
        }
        if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            PathBuf::from(format!("{}/../frontend/dist", manifest_dir))
        } else {
            PathBuf::from("/usr/src/app/frontend/dist")
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
