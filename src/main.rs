use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;

/// API gateway between the bot dashboard and Discord / the bot backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides HTTP_PORT)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: std::net::IpAddr,
}

mod backend;
mod config;
mod cooldown;
mod discord;
mod error;
mod permissions;
mod session;
mod web;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let config = config::AppConfig::from_env()?;
    let port = args.port.unwrap_or(config.http_port);
    let addr = SocketAddr::new(args.bind, port);

    info!("Environment: {:?}", config.environment);
    info!("Bot backend: {}", config.bot_api_url);
    info!("OAuth redirect URI: {}", config.redirect_uri);

    let state = web::AppState::new(Arc::new(config));
    web::start_web_server(addr, state).await
}
