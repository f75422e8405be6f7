//! Discord REST API client.
//!
//! Covers the handful of endpoints the gateway touches: the OAuth token
//! exchange, the current-user and current-user-guilds lookups used by the
//! permission gate, and the bot-credential calls (guild auto-join, welcome
//! DM) performed after login.

use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, Result};
use crate::permissions;

const API_BASE: &str = "https://discord.com/api";

/// Scopes requested during login. `guilds` feeds the permission gate,
/// `guilds.join` allows the auto-join after login.
const OAUTH_SCOPE: &str = "identify guilds guilds.join";

const WELCOME_MESSAGE: &str = "\u{1F44B} Welcome to the dashboard, {username}! \
    Thank you for using our bot. If you have any questions, feel free to ask!";

/// Discord OAuth token response. `access_token` is absent when Discord
/// rejects the authorization code.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
}

/// User info from /users/@me
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// One entry of /users/@me/guilds
#[derive(Debug, Clone, Deserialize)]
pub struct UserGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(deserialize_with = "permissions_from_any")]
    pub permissions: u64,
}

impl UserGuild {
    /// CDN URL for the guild icon, if it has one
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/icons/{}/{}.png", self.id, hash))
    }
}

/// Discord serves `permissions` as a numeric string on this endpoint, but
/// older payloads carry a plain number. Accept both; anything else is an
/// upstream decode failure.
fn permissions_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    bot_token: String,
}

impl DiscordClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            bot_token: config.bot_token.clone(),
        }
    }

    /// Authorize URL the browser is redirected to when no code is present
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth2/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}",
            API_BASE,
            self.client_id,
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
        )
    }

    /// Exchange an authorization code for an access token.
    /// A code Discord rejects yields `InvalidCode`.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/oauth2/token", API_BASE))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = response.json().await?;
        token.access_token.ok_or(ApiError::InvalidCode)
    }

    /// Fetch the authenticated user's profile.
    /// A non-OK response means the bearer token is not valid.
    pub async fn current_user(&self, access_token: &str) -> Result<DiscordUser> {
        let response = self
            .http
            .get(format!("{}/users/@me", API_BASE))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::InvalidToken);
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::upstream(500, format!("Malformed user response: {}", err)))
    }

    /// Fetch the guilds the authenticated user belongs to
    pub async fn current_user_guilds(&self, access_token: &str) -> Result<Vec<UserGuild>> {
        let response = self
            .http
            .get(format!("{}/users/@me/guilds", API_BASE))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::upstream(500, "Failed to fetch user guilds"));
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::upstream(500, format!("Malformed guild list: {}", err)))
    }

    /// Permission gate: resolve a session token to a guild the caller may
    /// manage. Runs fresh on every protected request; a user demoted in
    /// Discord loses access on their next call.
    pub async fn authorize_guild(&self, token: Option<&str>, guild_id: &str) -> Result<UserGuild> {
        let token = token.ok_or(ApiError::NotAuthenticated)?;

        self.current_user(token).await?;
        let guilds = self.current_user_guilds(token).await?;

        let guild = permissions::find_guild(&guilds, guild_id)
            .cloned()
            .ok_or(ApiError::GuildNotFound)?;

        if !permissions::can_manage(guild.permissions) {
            return Err(ApiError::Forbidden);
        }

        Ok(guild)
    }

    /// Add the user to the configured guild using their OAuth token.
    /// Idempotent on Discord's side (204 when already a member).
    pub async fn add_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
        access_token: &str,
    ) -> Result<()> {
        let response = self
            .http
            .put(format!("{}/guilds/{}/members/{}", API_BASE, guild_id, user_id))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "access_token": access_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                status.as_u16(),
                format!("Guild add failed: {}", text),
            ));
        }

        Ok(())
    }

    /// Open a DM channel with the user and send the welcome message
    pub async fn send_welcome_dm(&self, user: &DiscordUser) -> Result<()> {
        #[derive(Deserialize)]
        struct DmChannel {
            id: String,
        }

        let response = self
            .http
            .post(format!("{}/users/@me/channels", API_BASE))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "recipient_id": user.id }))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Could not open DM channel with {}: {}", user.id, response.status());
            return Err(ApiError::upstream(500, "Failed to open DM channel"));
        }

        let channel: DmChannel = response
            .json()
            .await
            .map_err(|err| ApiError::upstream(500, format!("Malformed DM channel: {}", err)))?;

        let content = WELCOME_MESSAGE.replace("{username}", &user.username);
        let response = self
            .http
            .post(format!("{}/channels/{}/messages", API_BASE, channel.id))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "content": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            error!("Welcome message to {} failed: {}", user.username, response.status());
            return Err(ApiError::upstream(500, "Failed to send welcome message"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_as_number() {
        let guild: UserGuild = serde_json::from_str(
            r#"{"id": "123", "name": "Test", "icon": null, "permissions": 32}"#,
        )
        .unwrap();
        assert_eq!(guild.permissions, 32);
    }

    #[test]
    fn test_permissions_as_numeric_string() {
        let guild: UserGuild = serde_json::from_str(
            r#"{"id": "123", "name": "Test", "permissions": "2147483647"}"#,
        )
        .unwrap();
        assert_eq!(guild.permissions, 2147483647);
        assert_eq!(guild.icon, None);
    }

    #[test]
    fn test_permissions_garbage_rejected() {
        let result: std::result::Result<UserGuild, _> = serde_json::from_str(
            r#"{"id": "123", "name": "Test", "permissions": "lots"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_tolerated() {
        let guild: UserGuild = serde_json::from_str(
            r#"{"id": "1", "name": "T", "permissions": 8, "owner": false, "features": []}"#,
        )
        .unwrap();
        assert_eq!(guild.permissions, 8);
    }

    #[test]
    fn test_icon_url() {
        let guild: UserGuild = serde_json::from_str(
            r#"{"id": "123", "name": "Test", "icon": "a1b2c3", "permissions": 32}"#,
        )
        .unwrap();
        assert_eq!(
            guild.icon_url().as_deref(),
            Some("https://cdn.discordapp.com/icons/123/a1b2c3.png")
        );

        let bare: UserGuild =
            serde_json::from_str(r#"{"id": "123", "name": "Test", "permissions": 32}"#).unwrap();
        assert_eq!(bare.icon_url(), None);
    }

    #[test]
    fn test_token_response_without_access_token() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(token.access_token.is_none());
    }
}
