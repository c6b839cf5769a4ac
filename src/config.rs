//! Configuration management for athena-glance.
//!
//! Handles loading configuration from TOML files and environment variables,
//! and resolving it into validated [`AthenaSettings`]. Credentials have no
//! built-in defaults: missing values are a configuration error.

use crate::athena::Credentials;
use crate::error::{QueryError, Result};
use crate::query::executor::{PollPolicy, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure, as read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query service settings.
    #[serde(default)]
    pub athena: AthenaConfig,

    /// Status polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Access credentials (prefer environment variables over storing them here).
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Query service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AthenaConfig {
    /// Database (catalog namespace) queries run against.
    pub database: Option<String>,

    /// Bucket receiving result files.
    pub output_bucket: Option<String>,

    /// Folder within the bucket receiving result files.
    pub output_folder: Option<String>,

    /// AWS region, e.g. "eu-north-1".
    pub region: Option<String>,

    /// Workgroup to run queries in (service default when unset).
    pub workgroup: Option<String>,

    /// Endpoint override, e.g. for a local emulator.
    pub endpoint: Option<String>,
}

impl AthenaConfig {
    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &AthenaConfig) {
        if other.database.is_some() {
            self.database = other.database.clone();
        }
        if other.output_bucket.is_some() {
            self.output_bucket = other.output_bucket.clone();
        }
        if other.output_folder.is_some() {
            self.output_folder = other.output_folder.clone();
        }
        if other.region.is_some() {
            self.region = other.region.clone();
        }
        if other.workgroup.is_some() {
            self.workgroup = other.workgroup.clone();
        }
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint.clone();
        }
    }
}

/// Status polling settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of status checks.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds between status checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl PollingConfig {
    /// Converts to a poll policy, rejecting zero attempts or interval.
    pub fn to_policy(&self) -> Result<PollPolicy> {
        if self.poll_interval_secs == 0 {
            return Err(QueryError::config("poll_interval_secs must be at least 1"));
        }
        PollPolicy::new(
            self.max_attempts,
            Duration::from_secs(self.poll_interval_secs),
        )
    }
}

/// Credentials as configured; every field optional until resolved.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CredentialsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("CredentialsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("session_token", &redacted(&self.session_token))
            .finish()
    }
}

/// Fully resolved settings for an Athena-backed execution client.
#[derive(Debug, Clone)]
pub struct AthenaSettings {
    pub database: String,
    pub output_bucket: String,
    pub output_folder: String,
    pub region: String,
    pub workgroup: Option<String>,
    pub endpoint: Option<String>,
    pub credentials: Credentials,
    pub poll_policy: PollPolicy,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            QueryError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies AWS_* environment variables as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Fills unset fields from `lookup` (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
    /// AWS_SESSION_TOKEN, AWS_REGION, AWS_DEFAULT_REGION).
    pub fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let creds = &mut self.credentials;
        if creds.access_key_id.is_none() {
            creds.access_key_id = lookup("AWS_ACCESS_KEY_ID");
        }
        if creds.secret_access_key.is_none() {
            creds.secret_access_key = lookup("AWS_SECRET_ACCESS_KEY");
        }
        if creds.session_token.is_none() {
            creds.session_token = lookup("AWS_SESSION_TOKEN");
        }
        if self.athena.region.is_none() {
            self.athena.region = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION"));
        }
    }

    /// Validates the configuration and resolves it into settings.
    pub fn resolve(&self) -> Result<AthenaSettings> {
        let athena = &self.athena;
        let creds = &self.credentials;

        let credentials = Credentials {
            access_key_id: required(&creds.access_key_id, "credentials.access_key_id")?,
            secret_access_key: required(&creds.secret_access_key, "credentials.secret_access_key")?,
            session_token: creds.session_token.clone().filter(|t| !t.is_empty()),
        };

        Ok(AthenaSettings {
            database: required(&athena.database, "athena.database")?,
            output_bucket: required(&athena.output_bucket, "athena.output_bucket")?,
            output_folder: athena.output_folder.clone().unwrap_or_default(),
            region: required(&athena.region, "athena.region")?,
            workgroup: athena.workgroup.clone(),
            endpoint: athena.endpoint.clone(),
            credentials,
            poll_policy: self.polling.to_policy()?,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| QueryError::config(format!("missing required setting '{name}'")))
}
