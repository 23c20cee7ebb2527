use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_builder::Builder;
use dyn_clone::DynClone;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::utils::uri::{is_http_url, normalize_endpoint};
use crate::{Error, Result};

pub const SUGGESTION_API_KEY_ENV_VAR: &str = "COMMENTGEN_SUGGESTION_API_KEY";
pub const COMPLETION_API_KEY_ENV_VAR: &str = "COMMENTGEN_COMPLETION_API_KEY";

pub const DEFAULT_SUGGESTION_ENDPOINT: &str =
    "https://api.seobility.net/es/resellerapi/termsuggestion";
pub const DEFAULT_COMPLETION_ENDPOINT: &str =
    "https://api.openai.com/v1/engines/davinci/completions";
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;
pub const DEFAULT_OUTPUT_PREFIX: &str = "A comment in a blog post that writes about";

/// Search engine the suggestion service analyses rankings against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEngine {
    #[default]
    #[serde(rename = "google.com")]
    GoogleCom,
    #[serde(rename = "google.es")]
    GoogleEs,
}

impl SearchEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::GoogleCom => "google.com",
            SearchEngine::GoogleEs => "google.es",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "google.com" => Ok(SearchEngine::GoogleCom),
            "google.es" => Ok(SearchEngine::GoogleEs),
            other => Err(Error::InvalidConfig(format!(
                "unsupported search engine {other:?}"
            ))),
        }
    }
}

/// The settings snapshot used for a single comment generation.
#[derive(Debug, Clone, Builder)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub struct Config {
    #[builder(default = "SecretString::from(String::new())")]
    pub suggestion_api_key: SecretString,
    #[builder(default = "SecretString::from(String::new())")]
    pub completion_api_key: SecretString,
    #[builder(default = "DEFAULT_SUGGESTION_ENDPOINT.to_string()")]
    pub suggestion_endpoint: String,
    #[builder(default = "DEFAULT_COMPLETION_ENDPOINT.to_string()")]
    pub completion_endpoint: String,
    /// How many suggested terms are sent to the completion service.
    #[builder(default = "DEFAULT_SUGGESTION_COUNT")]
    pub suggestion_count: usize,
    /// Text placed in front of the suggested terms to form the prompt.
    #[builder(default = "DEFAULT_OUTPUT_PREFIX.to_string()")]
    pub output_prefix: String,
    #[builder(default)]
    pub search_engine: SearchEngine,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suggestion_api_key: SecretString::from(String::new()),
            completion_api_key: SecretString::from(String::new()),
            suggestion_endpoint: DEFAULT_SUGGESTION_ENDPOINT.to_string(),
            completion_endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            search_engine: SearchEngine::default(),
        }
    }
}

impl Config {
    /// Returns the name of the first required setting that is empty.
    ///
    /// Both API keys and both service endpoints are required.
    pub fn missing_setting(&self) -> Option<&'static str> {
        if self.suggestion_api_key.expose_secret().is_empty() {
            Some("suggestion_api_key")
        } else if self.completion_api_key.expose_secret().is_empty() {
            Some("completion_api_key")
        } else if self.suggestion_endpoint.is_empty() {
            Some("suggestion_endpoint")
        } else if self.completion_endpoint.is_empty() {
            Some("completion_endpoint")
        } else {
            None
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.missing_setting().is_none()
    }

    /// Errors with [`Error::NotConfigured`] naming the first missing setting.
    pub fn ensure_enabled(&self) -> Result<()> {
        match self.missing_setting() {
            Some(setting) => Err(Error::NotConfigured(setting)),
            None => Ok(()),
        }
    }

    /// Resolves the stored options into a config, falling back to defaults
    /// for every unset or empty value.
    pub fn from_options(options: Options) -> Result<Self> {
        let suggestion_count = match options.suggestion_count {
            None => DEFAULT_SUGGESTION_COUNT,
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "suggestion_count must be at least 1".to_string(),
                ));
            }
            Some(count) => count,
        };

        let search_engine = match non_empty(options.search_engine) {
            Some(engine) => engine.parse()?,
            None => SearchEngine::default(),
        };

        let suggestion_endpoint = endpoint_or(
            options.suggestion_endpoint,
            DEFAULT_SUGGESTION_ENDPOINT,
            "suggestion_endpoint",
        )?;
        let completion_endpoint = endpoint_or(
            options.completion_endpoint,
            DEFAULT_COMPLETION_ENDPOINT,
            "completion_endpoint",
        )?;

        Ok(Self {
            suggestion_api_key: SecretString::from(options.suggestion_api_key.unwrap_or_default()),
            completion_api_key: SecretString::from(options.completion_api_key.unwrap_or_default()),
            suggestion_endpoint,
            completion_endpoint,
            suggestion_count,
            output_prefix: non_empty(options.output_prefix)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            search_engine,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn endpoint_or(value: Option<String>, default: &str, name: &str) -> Result<String> {
    let endpoint = normalize_endpoint(non_empty(value).as_deref().unwrap_or(default));
    if !is_http_url(&endpoint) {
        return Err(Error::InvalidConfig(format!(
            "{name} is not an http(s) URL: {endpoint}"
        )));
    }
    Ok(endpoint)
}

/// The flat options blob as it is stored.
///
/// Keys of the legacy settings page are accepted as aliases so an exported
/// options blob can be loaded as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    #[serde(alias = "seobility_api_key")]
    pub suggestion_api_key: Option<String>,
    #[serde(alias = "openai_api_key")]
    pub completion_api_key: Option<String>,
    pub suggestion_endpoint: Option<String>,
    pub completion_endpoint: Option<String>,
    #[serde(alias = "seobility_nr_suggestions")]
    pub suggestion_count: Option<usize>,
    #[serde(alias = "seobility_output_prepend")]
    pub output_prefix: Option<String>,
    #[serde(alias = "seobility_search_engine")]
    pub search_engine: Option<String>,
}

impl Options {
    /// Replaces the API keys with values from the environment, when set.
    ///
    /// `lookup` is usually [`std::env::var`].
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        for (name, slot) in [
            (SUGGESTION_API_KEY_ENV_VAR, &mut self.suggestion_api_key),
            (COMPLETION_API_KEY_ENV_VAR, &mut self.completion_api_key),
        ] {
            match lookup(name) {
                Ok(value) if !value.is_empty() => *slot = Some(value),
                Ok(_) | Err(std::env::VarError::NotPresent) => {}
                Err(e) => return Err(Error::EnvVarError(name.to_string(), e)),
            }
        }
        Ok(self)
    }
}

/// Read-only source of the [`Config`] snapshot.
pub trait ConfigStore: DynClone + fmt::Debug + Send + Sync {
    fn load(&self) -> Result<Config>;
}

dyn_clone::clone_trait_object!(ConfigStore);

#[derive(Debug, Clone)]
pub struct StaticConfigStore {
    config: Config,
}

impl StaticConfigStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigStore for StaticConfigStore {
    fn load(&self) -> Result<Config> {
        Ok(self.config.clone())
    }
}

/// Loads [`Options`] from a TOML file on every [`ConfigStore::load`], then
/// applies environment overrides.
///
/// A missing file is treated like settings that were never saved: the
/// resulting config is valid but not enabled.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_options(&self) -> Result<Options> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "options file not found, using defaults");
                Ok(Options::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config> {
        let options = self.read_options()?.with_env_overrides(|name| std::env::var(name))?;
        Config::from_options(options)
    }
}
