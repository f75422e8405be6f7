//! HTTP surface of the gateway.
//!
//! Routes the dashboard front-end calls: the Discord OAuth login flow,
//! permission-gated guild endpoints, and the pass-through proxies to the
//! bot backend.

mod auth;
mod guilds;
mod proxy;
mod server;

pub use server::{router, start_web_server, AppState};
