use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{docs, geocode};

const DEFAULT_FILE: &str = "archiver";
const ENV_PREFIX: &str = "ARCHIVER";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub document_id: String,
    pub credentials_file: PathBuf,
    pub geocode_endpoint: String,
    pub docs_endpoint: String,
    /// Substring a clipboard/argument value must contain to be treated as a maps URL.
    pub maps_marker: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub document_id: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `archiver.toml` (or `--config`), then `ARCHIVER_*` env vars, then CLI.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_prefix(overrides, ENV_PREFIX)
    }

    fn load_with_prefix(overrides: &Overrides, env_prefix: &str) -> Result<Self, ConfigError> {
        let file = match &overrides.config_file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("geocode_endpoint", geocode::DEFAULT_ENDPOINT)?
            .set_default("docs_endpoint", docs::api::DEFAULT_ENDPOINT)?
            .set_default("maps_marker", "google.com/maps")?
            .set_default("request_timeout_secs", 10_i64)?
            .set_default("poll_interval_ms", 500_i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(env_prefix))
            .set_override_option("document_id", overrides.document_id.clone())?
            .set_override_option(
                "credentials_file",
                overrides
                    .credentials_file
                    .as_ref()
                    .map(|p| p.display().to_string()),
            )?
            .build()?
            .try_deserialize()?;

        settings.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        for (key, value) in [
            ("api_key", self.api_key.as_str()),
            ("document_id", self.document_id.as_str()),
            ("maps_marker", self.maps_marker.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{} must not be empty", key)));
            }
        }
        if self.credentials_file.as_os_str().is_empty() {
            return Err(ConfigError::Message("credentials_file must not be empty".into()));
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
