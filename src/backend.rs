//! Bot backend client.
//!
//! The backend trusts the gateway's static API key (`x-api-key` header),
//! not the end user's Discord identity — authorization happens here before
//! a request is forwarded. Responses are relayed as-is; on failure the
//! backend's `error` field is extracted and its status code propagated.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::{ApiError, Result};

/// Guild appearance customization, premium-gated by the backend.
/// Empty strings reset the corresponding field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.bot_api_url.trim_end_matches('/').to_string(),
            api_key: config.dashboard_api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Guild details (member count etc.). Best-effort: a non-OK response
    /// yields an empty object so the dashboard still renders the Discord
    /// side of the data.
    pub async fn guild_info(&self, guild_id: &str) -> Result<Map<String, Value>> {
        let response = self
            .http
            .get(self.url(&format!("/api/guilds/{}", guild_id)))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Map::new());
        }

        let value: Value = response.json().await?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Premium flag for a guild. Any failure reads as not premium.
    pub async fn is_premium(&self, guild_id: &str) -> bool {
        #[derive(Deserialize)]
        struct PremiumResponse {
            #[serde(default)]
            success: bool,
            #[serde(default, rename = "isPremium")]
            is_premium: bool,
        }

        let request = self
            .http
            .get(self.url(&format!("/api/ispremium?guildId={}", guild_id)))
            .header("x-api-key", &self.api_key);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<PremiumResponse>().await {
                    Ok(body) => body.success && body.is_premium,
                    Err(err) => {
                        warn!("Malformed premium response for guild {}: {}", guild_id, err);
                        false
                    }
                }
            }
            Ok(_) => false,
            Err(err) => {
                warn!("Premium check failed for guild {}: {}", guild_id, err);
                false
            }
        }
    }

    pub async fn get_appearance(&self, guild_id: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(&format!("/api/guilds/{}/appearance", guild_id)))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        relay_json(response, "Failed to fetch appearance").await
    }

    pub async fn put_appearance(&self, guild_id: &str, appearance: &Appearance) -> Result<Value> {
        let response = self
            .http
            .put(self.url(&format!("/api/guilds/{}/appearance", guild_id)))
            .header("x-api-key", &self.api_key)
            .json(appearance)
            .send()
            .await?;

        relay_json(response, "Failed to update appearance").await
    }

    /// Mutual-servers list, authenticated with the caller's own token —
    /// the backend filters by the Discord identity behind it.
    pub async fn mutual_servers(&self, access_token: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url("/api/mutual-servers"))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Mutual servers backend error: {}", text);
            return Err(ApiError::upstream(
                500,
                "Failed to fetch mutual servers from backend",
            ));
        }

        Ok(response.json().await?)
    }

    /// Public bot liveness/metrics passthrough
    pub async fn status(&self) -> Result<Value> {
        let response = self.http.get(self.url("/api/status")).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::upstream(
                500,
                format!("External API failed: {}", response.status().as_u16()),
            ));
        }

        Ok(response.json().await?)
    }
}

/// Relay a backend response: the JSON body on success, otherwise the
/// backend's `error` field (or the fallback message) with its status.
async fn relay_json(response: reqwest::Response, fallback: &str) -> Result<Value> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body: Value = response.json().await.unwrap_or_else(|_| json!({}));
    let message = extract_error(&body, fallback);
    Err(ApiError::upstream(status.as_u16(), message))
}

fn extract_error(body: &Value, fallback: &str) -> String {
    body.get("error")
        .and_then(|v| v.as_str())
        .unwrap_or(fallback)
        .to_string()
}
