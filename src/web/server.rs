//! Router construction and server startup.

use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::{auth, guilds, proxy};
use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::cooldown::{self, SharedWriteCooldown};
use crate::discord::DiscordClient;

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub discord: DiscordClient,
    pub backend: BackendClient,
    pub cooldown: SharedWriteCooldown,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        // One connection pool shared by both upstreams
        let http = reqwest::Client::new();

        Self {
            discord: DiscordClient::new(http.clone(), &config),
            backend: BackendClient::new(http, &config),
            cooldown: cooldown::create_write_cooldown(),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/auth/discord", get(auth::discord_login))
        .route("/api/guilds/:id", get(guilds::guild_info))
        .route(
            "/api/guilds/:id/appearance",
            get(guilds::get_appearance).put(guilds::put_appearance),
        )
        .route("/api/mutual-servers", get(proxy::mutual_servers))
        .route("/api/status", get(proxy::status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway server
pub async fn start_web_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard gateway listening on http://{}", listener.local_addr()?);
    info!("OAuth login entry point: /auth/discord");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> &'static str {
    "Dashboard Gateway Running"
}
