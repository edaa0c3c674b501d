use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Runtime configuration of the uploader.
///
/// Resolved once at startup: defaults, then an optional TOML file, then
/// `MIGRATOR_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the migration service, e.g. `https://migrator.example.com`.
    pub base_url: String,
    /// Delay between two progress requests.
    pub poll_interval_ms: u64,
    /// Consecutive failed progress requests tolerated before polling gives up.
    pub max_poll_failures: u32,
    /// Upper bound for the whole upload request, processing included.
    pub request_timeout_secs: u64,
    /// Poll `/progress/<id>` while the upload runs.
    pub poll_progress: bool,
    /// File name of the saved artifact.
    pub artifact_name: String,
    /// Directory the artifact is saved into.
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            poll_interval_ms: 500,
            max_poll_failures: 5,
            request_timeout_secs: 300,
            poll_progress: true,
            artifact_name: "updated_template.xlsm".to_string(),
            download_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "migrator.toml";
    pub const PATH_VAR: &'static str = "MIGRATOR_CONFIG";

    /// Loads the config from `$MIGRATOR_CONFIG`, or `migrator.toml` in the
    /// working directory when present, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(Self::PATH_VAR) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let local = PathBuf::from(Self::FILE_NAME);
                local.is_file().then_some(local)
            }
        };
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                debug!("Reading config from {}", path.display());
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `MIGRATOR_*` overrides looked up through `lookup`.
    /// Unparsable numeric or boolean values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MIGRATOR_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = parse_override(&lookup, "MIGRATOR_POLL_INTERVAL_MS") {
            self.poll_interval_ms = value;
        }
        if let Some(value) = parse_override(&lookup, "MIGRATOR_MAX_POLL_FAILURES") {
            self.max_poll_failures = value;
        }
        if let Some(value) = parse_override(&lookup, "MIGRATOR_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = value;
        }
        if let Some(value) = parse_override(&lookup, "MIGRATOR_POLL_PROGRESS") {
            self.poll_progress = value;
        }
        if let Some(value) = lookup("MIGRATOR_ARTIFACT_NAME") {
            self.artifact_name = value;
        }
        if let Some(value) = lookup("MIGRATOR_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(value);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.max_poll_failures == 0 {
            return Err(ConfigError::Invalid("max_poll_failures must be positive".into()));
        }
        if self.artifact_name.is_empty()
            || self.artifact_name.contains(['/', '\\'])
            || self.artifact_name == ".."
        {
            return Err(ConfigError::Invalid(format!(
                "artifact_name '{}' must be a plain file name",
                self.artifact_name
            )));
        }
        Ok(())
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}
