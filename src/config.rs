//! Server configuration loaded from the environment.

use std::path::PathBuf;

use thiserror::Error;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health server port
pub const HEALTH_PORT: u16 = 8080;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number between 1 and 65535, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    EmptyPath { var: &'static str },
}

/// Ports and certificate locations for the webhook binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub webhook_port: u16,
    pub health_port: u16,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            webhook_port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            cert_path: PathBuf::from(WEBHOOK_CERT_PATH),
            key_path: PathBuf::from(WEBHOOK_KEY_PATH),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            webhook_port: port(&lookup, "WEBHOOK_PORT", defaults.webhook_port)?,
            health_port: port(&lookup, "HEALTH_PORT", defaults.health_port)?,
            cert_path: path(&lookup, "WEBHOOK_CERT_PATH", defaults.cert_path)?,
            key_path: path(&lookup, "WEBHOOK_KEY_PATH", defaults.key_path)?,
        })
    }

    /// Whether both TLS files are present on disk.
    pub fn certificates_present(&self) -> bool {
        self.cert_path.exists() && self.key_path.exists()
    }
}

fn port<F>(lookup: &F, var: &'static str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort { var, value }),
    }
}

fn path<F>(lookup: &F, var: &'static str, default: PathBuf) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyPath { var }),
        Some(value) => Ok(PathBuf::from(value)),
    }
}
