//! Permission-gated guild endpoints: guild info and appearance read/write.
//!
//! Every handler re-derives the caller's identity from the session cookie
//! and re-checks their permissions against Discord before touching the bot
//! backend.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::info;

use super::server::AppState;
use crate::backend::Appearance;
use crate::discord::UserGuild;
use crate::error::{ApiError, Result};
use crate::session;

/// GET /api/guilds/:id - guild info with premium flag
pub async fn guild_info(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = session::token_from_headers(&headers);
    let guild = state.discord.authorize_guild(token.as_deref(), &guild_id).await?;

    let backend_fields = state.backend.guild_info(&guild_id).await?;
    let premium = state.backend.is_premium(&guild_id).await;

    Ok(Json(compose_guild_payload(&guild, backend_fields, premium)))
}

/// GET /api/guilds/:id/appearance
pub async fn get_appearance(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = session::token_from_headers(&headers);
    state.discord.authorize_guild(token.as_deref(), &guild_id).await?;

    let data = state.backend.get_appearance(&guild_id).await?;
    Ok(Json(data))
}

/// PUT /api/guilds/:id/appearance
///
/// The premium requirement is enforced by the backend; the gateway only
/// enforces the write cooldown so it cannot be bypassed by calling the API
/// directly.
pub async fn put_appearance(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(appearance): Json<Appearance>,
) -> Result<Json<Value>> {
    let token = session::token_from_headers(&headers);
    state.discord.authorize_guild(token.as_deref(), &guild_id).await?;

    if let Some(retry_after_secs) = state.cooldown.remaining_secs(&guild_id) {
        return Err(ApiError::CooldownActive { retry_after_secs });
    }

    let data = state.backend.put_appearance(&guild_id, &appearance).await?;

    // Only an accepted write consumes the window
    state.cooldown.record(&guild_id);
    info!("Appearance updated for guild {}", guild_id);

    Ok(Json(data))
}

/// Compose the guild payload the dashboard renders: Discord-side identity
/// and permissions, the premium flag, and whatever fields the backend
/// reports (which override on key collisions).
fn compose_guild_payload(guild: &UserGuild, backend_fields: Map<String, Value>, premium: bool) -> Value {
    let mut payload = Map::new();
    payload.insert("id".to_string(), json!(guild.id));
    payload.insert("name".to_string(), json!(guild.name));
    payload.insert("icon".to_string(), json!(guild.icon_url()));
    payload.insert("memberCount".to_string(), json!(0));
    payload.insert("permissions".to_string(), json!(guild.permissions));
    payload.insert("premium".to_string(), json!(premium));

    for (key, value) in backend_fields {
        payload.insert(key, value);
    }

    json!({ "success": true, "guild": payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild(permissions: u64) -> UserGuild {
        serde_json::from_value(json!({
            "id": "123",
            "name": "Test Guild",
            "icon": "a1b2c3",
            "permissions": permissions,
        }))
        .unwrap()
    }

    #[test]
    fn test_compose_guild_payload() {
        let mut backend_fields = Map::new();
        backend_fields.insert("memberCount".to_string(), json!(50));

        let payload = compose_guild_payload(&guild(0x20), backend_fields, true);

        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["guild"]["id"], json!("123"));
        assert_eq!(payload["guild"]["name"], json!("Test Guild"));
        assert_eq!(
            payload["guild"]["icon"],
            json!("https://cdn.discordapp.com/icons/123/a1b2c3.png")
        );
        assert_eq!(payload["guild"]["memberCount"], json!(50));
        assert_eq!(payload["guild"]["permissions"], json!(32));
        assert_eq!(payload["guild"]["premium"], json!(true));
    }

    #[test]
    fn test_compose_guild_payload_backend_unreachable() {
        // Empty backend fields leave memberCount at its default
        let payload = compose_guild_payload(&guild(0x8), Map::new(), false);

        assert_eq!(payload["guild"]["memberCount"], json!(0));
        assert_eq!(payload["guild"]["premium"], json!(false));
    }

    #[test]
    fn test_compose_guild_payload_merges_extra_backend_fields() {
        let mut backend_fields = Map::new();
        backend_fields.insert("memberCount".to_string(), json!(7));
        backend_fields.insert("prefix".to_string(), json!("!"));

        let payload = compose_guild_payload(&guild(0x28), backend_fields, false);

        assert_eq!(payload["guild"]["prefix"], json!("!"));
        assert_eq!(payload["guild"]["memberCount"], json!(7));
    }

    #[test]
    fn test_compose_guild_payload_without_icon() {
        let guild: UserGuild = serde_json::from_value(json!({
            "id": "9",
            "name": "Bare",
            "permissions": "32",
        }))
        .unwrap();

        let payload = compose_guild_payload(&guild, Map::new(), false);
        assert_eq!(payload["guild"]["icon"], Value::Null);
    }
}
