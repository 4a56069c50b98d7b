//! Configuration module
//!
//! Handles CLI configuration including the scanner API URL and credential.

use spyglass_client::SessionConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Scanner API base URL
    pub api_url: String,
    /// Optional bearer credential
    pub token: Option<String>,
}

impl Config {
    /// Session configuration derived from the CLI arguments
    pub fn session_config(&self) -> SessionConfig {
        let config = SessionConfig::new(&self.api_url);
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}
