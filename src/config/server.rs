//! Listener settings: bind address, log filter and the browser origins
//! allowed to reach the chat socket and the room status endpoints.

use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;

/// Listener configuration for the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Comma-separated browser origins, e.g. `https://chat.example.org`.
    #[serde(default)]
    pub allowed_origins: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Which cross-origin browsers may talk to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Development without a list: any page may connect.
    Any,
    /// Only these origins.
    Listed(Vec<String>),
    /// Production without a list: cross-origin requests are refused.
    SameOriginOnly,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Configured origins, trimmed, blanks dropped.
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.allowed_origins
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        let origins = self.allowed_origins();
        if !origins.is_empty() {
            return OriginPolicy::Listed(origins.into_iter().map(String::from).collect());
        }
        match self.environment {
            Environment::Development => OriginPolicy::Any,
            Environment::Production => OriginPolicy::SameOriginOnly,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr()?;

        // Browsers send the scheme in Origin; a bare host would never match.
        if let Some(origin) = self
            .allowed_origins()
            .into_iter()
            .find(|origin| !origin.starts_with("http://") && !origin.starts_with("https://"))
        {
            return Err(ValidationError::InvalidOrigin(origin.to_string()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            allowed_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,chat_relay=debug,sqlx=warn".to_string()
}
