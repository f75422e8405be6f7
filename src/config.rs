//! Environment-derived configuration for the gateway.
//!
//! All settings come from the process environment (a `.env` file is loaded
//! in `main`). Required variables fail startup with a clear error instead of
//! surfacing later as broken upstream calls.

use anyhow::{Context, Result};

/// Runtime environment, from `NODE_ENV` (the dashboard's deployment scripts
/// set it for every service, this one included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Discord application client id
    pub client_id: String,
    /// Discord application client secret
    pub client_secret: String,
    /// OAuth redirect URI registered in the Discord developer portal
    pub redirect_uri: String,
    /// Guild users are auto-joined to after login
    pub guild_id: String,
    /// Bot-level credential for guild joins and welcome DMs
    pub bot_token: String,
    /// Base URL of the bot backend service
    pub bot_api_url: String,
    /// Static API key the bot backend trusts (`x-api-key` header)
    pub dashboard_api_key: String,
    pub environment: Environment,
    /// Listener port (HTTP_PORT, default 3000)
    pub http_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            redirect_uri: required("REDIRECT_URI")?,
            guild_id: required("GUILD_ID")?,
            bot_token: required("BOT_TOKEN")?,
            bot_api_url: required("BOT_API_URL")?,
            dashboard_api_key: required("DASHBOARD_API_KEY")?,
            environment: Environment::from_node_env(std::env::var("NODE_ENV").ok().as_deref()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("Missing {} environment variable", name))
}

/// Whether error detail may be included in responses. Read at response time
/// rather than carried through every error value.
pub fn development_mode() -> bool {
    std::env::var("NODE_ENV").map(|v| v != "production").unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_node_env() {
        assert_eq!(
            Environment::from_node_env(Some("production")),
            Environment::Production
        );
        assert_eq!(
            Environment::from_node_env(Some("development")),
            Environment::Development
        );
        // Unset or unknown values default to development
        assert_eq!(Environment::from_node_env(None), Environment::Development);
        assert_eq!(
            Environment::from_node_env(Some("staging")),
            Environment::Development
        );
    }
}
