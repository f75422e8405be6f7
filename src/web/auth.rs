//! Discord OAuth login flow.
//!
//! `GET /auth/discord` serves double duty: without a `code` query parameter
//! it redirects the browser to Discord's authorize endpoint; with one it
//! completes the exchange, runs the best-effort onboarding side effects and
//! sets the session cookie.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::server::AppState;
use crate::error::{ApiError, Result};
use crate::session;

/// Query parameters from Discord's OAuth redirect
#[derive(Deserialize)]
pub struct LoginParams {
    code: Option<String>,
}

/// GET /auth/discord - OAuth redirect or code exchange
pub async fn discord_login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Result<Response> {
    let Some(code) = params.code else {
        // First leg: send the browser to Discord. No side effects.
        return Ok(Redirect::temporary(&state.discord.authorize_url()).into_response());
    };

    // Second leg: exchange the code. A rejected code is the caller's
    // fault (400); anything else unexpected is ours (500).
    let access_token = state.discord.exchange_code(&code).await?;

    let user = state.discord.current_user(&access_token).await.map_err(|err| {
        error!("User fetch after token exchange failed: {}", err);
        ApiError::internal(err)
    })?;

    info!("User {} ({}) authenticated via OAuth", user.username, user.id);

    // Onboarding side effects are best-effort: the login must succeed
    // even when the bot cannot join or message the user.
    if let Err(err) = state
        .discord
        .add_guild_member(&state.config.guild_id, &user.id, &access_token)
        .await
    {
        warn!(
            "Could not add {} to guild {}: {}",
            user.id, state.config.guild_id, err
        );
    }

    if let Err(err) = state.discord.send_welcome_dm(&user).await {
        warn!("Could not send welcome message to {}: {}", user.username, err);
    }

    let cookie = session::session_cookie(&access_token, state.config.is_production());

    Ok(([(SET_COOKIE, cookie)], Redirect::temporary("/servers")).into_response())
}
