//! Configuration types, normalization, and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ochat/config.json`) and environment.
//! The [`ConfigStore`] owns the live value; hosts pass it by handle into the session.

use crate::host::ConfigPersistence;
use crate::llm::ModelSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Backend and model settings for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Base URL of the inference server, without trailing slash.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Model sent with each prompt. Empty until a model listing has succeeded.
    #[serde(default)]
    pub selected_model: String,

    /// Upper bound on generated tokens, sent as `max_tokens`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Seconds before an outstanding prompt is resolved as failed.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            selected_model: String::new(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Configuration {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backend URL checked for use in a request.
    pub fn validated_backend_url(&self) -> Result<&str, ConfigError> {
        validate_backend_url(&self.backend_url)?;
        Ok(&self.backend_url)
    }

    /// Normalized copy of a loaded value. Zero limits are not usable, so they
    /// are replaced by the defaults.
    fn normalized(mut self) -> Self {
        self.backend_url = normalize_backend_url(&self.backend_url);
        self.selected_model = self.selected_model.trim().to_string();
        if self.max_tokens == 0 {
            log::warn!("maxTokens is 0, using {}", DEFAULT_MAX_TOKENS);
            self.max_tokens = DEFAULT_MAX_TOKENS;
        }
        if self.request_timeout_secs == 0 {
            log::warn!(
                "requestTimeoutSecs is 0, using {}",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("backend URL is not set")]
    MissingUrl,
    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("model {0:?} is not offered by the backend")]
    UnknownModel(String),
    #[error("saving configuration failed: {0:#}")]
    Persist(anyhow::Error),
}

/// Trim whitespace and strip trailing `/` characters.
pub fn normalize_backend_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// The URL must parse and use http or https.
pub fn validate_backend_url(url: &str) -> Result<(), ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

/// Partial update for [`ConfigStore::set`]. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub backend_url: Option<String>,
    pub selected_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl ConfigUpdate {
    pub fn backend_url(url: impl Into<String>) -> Self {
        Self {
            backend_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn selected_model(model: impl Into<String>) -> Self {
        Self {
            selected_model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.backend_url.is_none()
            && self.selected_model.is_none()
            && self.max_tokens.is_none()
            && self.request_timeout_secs.is_none()
    }
}

struct StoreState {
    config: Configuration,
    /// Last model set reported by the backend; `None` until a listing has been applied.
    models: Option<ModelSet>,
}

/// Live configuration plus the host persistence it is saved through.
pub struct ConfigStore {
    state: RwLock<StoreState>,
    persistence: Box<dyn ConfigPersistence>,
}

impl ConfigStore {
    pub fn new(config: Configuration, persistence: impl ConfigPersistence + 'static) -> Self {
        Self {
            state: RwLock::new(StoreState {
                config: config.normalized(),
                models: None,
            }),
            persistence: Box::new(persistence),
        }
    }

    /// Load through the persistence capability; nothing stored => defaults.
    pub fn open(persistence: impl ConfigPersistence + 'static) -> Result<Self> {
        let config = persistence
            .load()
            .context("loading configuration")?
            .unwrap_or_default();
        Ok(Self::new(config, persistence))
    }

    pub fn get(&self) -> Configuration {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    /// Model set from the most recent listing, if any.
    pub fn models(&self) -> Option<ModelSet> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .models
            .clone()
    }

    /// Normalize, validate, and persist a partial update. On any error the
    /// live configuration is left unchanged.
    pub fn set(&self, update: ConfigUpdate) -> Result<Configuration, ConfigError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.config.clone();

        if let Some(url) = update.backend_url {
            let url = normalize_backend_url(&url);
            validate_backend_url(&url)?;
            next.backend_url = url;
        }
        if let Some(model) = update.selected_model {
            let model = model.trim().to_string();
            if let Some(models) = &state.models {
                let allowed = if models.is_empty() {
                    model.is_empty()
                } else {
                    models.contains(&model)
                };
                if !allowed {
                    return Err(ConfigError::UnknownModel(model));
                }
            }
            next.selected_model = model;
        }
        if let Some(n) = update.max_tokens {
            if n == 0 {
                return Err(ConfigError::Zero("maxTokens"));
            }
            next.max_tokens = n;
        }
        if let Some(secs) = update.request_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Zero("requestTimeoutSecs"));
            }
            next.request_timeout_secs = secs;
        }

        if next == state.config {
            return Ok(next);
        }
        self.persistence.save(&next).map_err(ConfigError::Persist)?;
        if next.backend_url != state.config.backend_url {
            // The old listing describes another server.
            state.models = None;
        }
        state.config = next.clone();
        Ok(next)
    }

    /// Record a freshly fetched model set and keep the selection inside it:
    /// an absent selection falls back to the first model, or empty when the
    /// set is empty. The in-memory selection is updated even if saving fails.
    pub fn apply_model_set(&self, models: &ModelSet) -> Result<Configuration, ConfigError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.models = Some(models.clone());

        let current = state.config.selected_model.as_str();
        if !current.is_empty() && models.contains(current) {
            return Ok(state.config.clone());
        }
        let fallback = models.first().unwrap_or("").to_string();
        if fallback == current {
            return Ok(state.config.clone());
        }
        log::info!(
            "selected model {:?} not offered by backend, using {:?}",
            current,
            fallback
        );
        state.config.selected_model = fallback;
        let config = state.config.clone();
        self.persistence
            .save(&config)
            .map_err(ConfigError::Persist)?;
        Ok(config)
    }

    /// Forget the last model set after a listing failed. The selection is
    /// kept as is, so an outage does not erase the stored model.
    pub fn clear_model_set(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .models = None;
    }
}

/// JSON file persistence. A missing file loads as "nothing stored".
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPersistence for JsonFileStore {
    fn load(&self) -> Result<Option<Configuration>> {
        if !self.path.exists() {
            log::debug!("config file not found, using defaults: {}", self.path.display());
            return Ok(None);
        }
        let s = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading config from {}", self.path.display()))?;
        let config = serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", self.path.display()))?;
        Ok(Some(config))
    }

    fn save(&self, config: &Configuration) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating config directory {}", dir.display()))?;
        }
        let s = serde_json::to_string_pretty(config).context("serializing config")?;
        std::fs::write(&self.path, s)
            .with_context(|| format!("writing config to {}", self.path.display()))?;
        log::debug!("saved config to {}", self.path.display());
        Ok(())
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("OCHAT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".ochat").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Backend URL from env OCHAT_BACKEND_URL, if set and non-empty.
pub fn backend_url_override() -> Option<String> {
    std::env::var("OCHAT_BACKEND_URL")
        .ok()
        .map(|s| normalize_backend_url(&s))
        .filter(|s| !s.is_empty())
}

/// Open the store at `path` (default: OCHAT_CONFIG_PATH or ~/.ochat/config.json).
/// Env OCHAT_BACKEND_URL overrides the stored backend URL for this run.
/// Returns the store and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(ConfigStore, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let file = JsonFileStore::new(path.clone());
    let mut config = file.load()?.unwrap_or_default();
    if let Some(url) = backend_url_override() {
        log::debug!("backend URL overridden from environment: {}", url);
        config.backend_url = url;
    }
    Ok((ConfigStore::new(config, file), path))
}
