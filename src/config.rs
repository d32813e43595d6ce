/// Application configuration, read from a RON file.
///
/// Every field has a default, so an empty file (or no file at all) yields
/// an offline setup: sample data under `data/`, the built-in template and
/// the echo backend.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::completion::{CompletionBackend, EchoBackend, HttpBackendConfig};
#[cfg(feature = "http")]
use crate::core::http_backend::HttpBackend;
use crate::core::lexicon::LexiconSources;
use crate::core::pipeline::{EngineError, StoryEngine, StoryEngineBuilder};

pub const DEFAULT_CONFIG_PATH: &str = "fairytale.ron";

/// Overrides the HTTP backend's `api_token` when set.
pub const API_TOKEN_ENV: &str = "FAIRYTALE_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Which completion backend to use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CompletionConfig {
    #[default]
    Echo,
    Http(HttpBackendConfig),
}

impl CompletionConfig {
    pub fn build_backend(&self) -> Result<Box<dyn CompletionBackend>, EngineError> {
        match self {
            CompletionConfig::Echo => Ok(Box::new(EchoBackend)),
            #[cfg(feature = "http")]
            CompletionConfig::Http(settings) => Ok(Box::new(HttpBackend::new(settings)?)),
            #[cfg(not(feature = "http"))]
            CompletionConfig::Http(_) => Err(EngineError::BackendUnsupported("http".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub lexicon: LexiconSources,
    /// Custom prompt template. `None` uses the built-in one.
    pub template: Option<PathBuf>,
    pub completion: CompletionConfig,
    /// Fixed seed for reproducible stories. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn parse_ron(input: &str) -> Result<AppConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Load from `path`, falling back to defaults when the file does not
    /// exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let mut config = if path.exists() {
            let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config = Self::parse_ron(&input)?;
            info!("loaded config from {}", path.display());
            config
        } else {
            info!("no config at {}, using defaults", path.display());
            AppConfig::default()
        };
        config.apply_api_token(std::env::var(API_TOKEN_ENV).ok());
        Ok(config)
    }

    /// Replace the HTTP token. Has no effect on other backends.
    pub fn apply_api_token(&mut self, token: Option<String>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return;
        };
        if let CompletionConfig::Http(settings) = &mut self.completion {
            debug!("api token taken from {API_TOKEN_ENV}");
            settings.api_token = Some(token);
        }
    }

    /// An engine builder with every configured part applied.
    pub fn engine_builder(&self) -> Result<StoryEngineBuilder, EngineError> {
        let mut builder = StoryEngine::builder()
            .lexicon_sources(self.lexicon.clone())
            .with_backend(self.completion.build_backend()?);
        if let Some(path) = &self.template {
            builder = builder.template_path(path.clone());
        }
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        Ok(builder)
    }
}
