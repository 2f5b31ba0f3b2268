// Server Main
// Wires configuration, the upstream clients, live feeds and the HTTP routes.

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::io;
use std::sync::Arc;
use std::time::Duration;

mod client;
mod config;
mod data;
mod error;
mod handlers;
mod live;
mod pages;
mod render;
mod types;

#[cfg(test)]
mod test_support;

use client::{build_http_client, CoinGeckoClient};
use config::ServerConfig;
use live::{sweep_idle_periodically, LiveFeeds};
use render::Templates;
use types::AppState;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    eprintln!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = ServerConfig::load().map_err(|e| startup_error("Failed to load server configuration", e))?;
    config.setup_logging();

    let http = build_http_client(config.request_timeout_seconds)
        .map_err(|e| startup_error("Failed to build HTTP client", e))?;
    let client = CoinGeckoClient::new(http.clone(), config.base_url.clone(), Some(config.api_key.clone()))
        .with_revalidate(config.revalidate_seconds);
    let public = CoinGeckoClient::new(http, config.public_base_url.clone(), None);

    let templates = Templates::new().map_err(|e| startup_error("Failed to compile page templates", e))?;

    let live = Arc::new(LiveFeeds::new(
        public.clone(),
        Duration::from_secs(config.live_poll_interval_seconds.max(1)),
        Duration::from_secs(config.live_idle_timeout_seconds),
    ));

    let state = web::Data::new(AppState {
        client,
        public,
        live: live.clone(),
        templates,
    });

    let sweep_every = Duration::from_secs(config.live_idle_timeout_seconds.clamp(1, 60));
    let sweeper = tokio::spawn(sweep_idle_periodically(live.clone(), sweep_every));

    info!("Starting market data front-end on http://{}:{}", config.http_host, config.http_port);
    info!("Page revalidation window: {}s", config.revalidate_seconds);
    info!(
        "Live feeds poll every {}s (authenticated: {})",
        config.live_poll_interval_seconds,
        state.public.is_authenticated()
    );

    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))?
    .run()
    .await;

    sweeper.abort();
    live.shutdown();
    info!("Server stopped");
    result
}
