//! Client configuration.
//!
//! # Design
//! Every option is a named field with a default. Overrides arrive as a JSON
//! object and are merged over the defaults by serde; `deny_unknown_fields`
//! turns a misspelled key into an error instead of a silently ignored one.

use std::env;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

pub const DEFAULT_HOST: &str = "http://localhost:8080";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: u64 = 60;
pub const DEFAULT_VERSION: &str = "v1";

/// Settings a [`Client`](crate::Client) builds its connection from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub host: String,
    /// Kept for callers that want it; requests never use it.
    pub port: u16,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// API version segment, as in `/api/{version}/...`.
    pub version: String,
    /// Bearer token. `None` or empty sends no `Authorization` header.
    pub oauth_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            version: DEFAULT_VERSION.to_string(),
            oauth_token: None,
        }
    }
}

impl ClientConfig {
    /// Merge a JSON object of overrides over the defaults.
    ///
    /// `null` means "no overrides". Unknown keys and mistyped values are
    /// rejected with [`Error::Config`].
    pub fn from_options(options: Value) -> Result<Self, Error> {
        if options.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(options).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read `HAPPI_*` environment overrides over the defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(host) = lookup("HAPPI_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("HAPPI_PORT") {
            config.port = parse_number("HAPPI_PORT", &port)?;
        }
        if let Some(timeout) = lookup("HAPPI_TIMEOUT") {
            config.timeout = parse_number("HAPPI_TIMEOUT", &timeout)?;
        }
        if let Some(version) = lookup("HAPPI_VERSION") {
            config.version = version;
        }
        if let Some(token) = lookup("HAPPI_OAUTH_TOKEN") {
            config.oauth_token = Some(token);
        }
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}
