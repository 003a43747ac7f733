#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
// #![doc = include_str!("../README.md")]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum_client_ip::ClientIpSource;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::router;
use crate::cache::Cache;
use crate::notes::NoteService;
use crate::storage::Storage;
use crate::utils::env_var_or_else;

mod api;
mod cache;
mod client_ip;
mod collaborators;
mod graceful_shutdown;
mod labels;
mod notes;
mod password;
mod storage;
#[cfg(test)]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "jotter=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(AppConfig::from_env()).await;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Runtime configuration of the app
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Secret used to sign and verify API tokens
    pub jwt_secret: String,

    /// Scope single note reads to collaborators, and note deletes to owners
    pub strict_owner_scoping: bool,
}

impl AppConfig {
    /// Read the configuration from the environment
    fn from_env() -> Self {
        let jwt_secret = env_var_or_else("JWT_SECRET", || {
            let jwt_secret = password::generate();
            tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
            jwt_secret
        });

        let strict_owner_scoping =
            env_var_or_else("STRICT_OWNER_SCOPING", || String::from("false")) == "true";

        Self {
            jwt_secret,
            strict_owner_scoping,
        }
    }
}

/// Create and setup the app with its dependencies
///
/// The storage and the note cache are set up here, everything downstream gets them through
/// extensions
pub async fn setup_app(config: AppConfig) -> Router {
    let storage = storage::setup().await;
    let cache = cache::setup();

    create_router(storage, cache, &config)
}

/// Create the router for Jotter
fn create_router<S: Storage, C: Cache>(storage: S, cache: C, config: &AppConfig) -> Router {
    let jwt_keys = JwtKeys::new(config.jwt_secret.as_bytes());

    let note_service = NoteService::new(storage.clone(), cache, config.strict_owner_scoping);

    Router::new()
        .nest("/api", router::<S, C>())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(note_service))
        .layer(Extension(jwt_keys))
        .layer(ClientIpSource::ConnectInfo.into_extension())
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port.parse::<u16>()?;

            address.set_port(port);
        }
    }

    Ok(address)
}
