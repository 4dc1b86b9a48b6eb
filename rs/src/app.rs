/*
 * Responsibility
 * - Config読み込み → decoder/factory 生成 → Router 組み立て
 * - Middleware の適用 (token pipeline は api::v1、HTTP 横断は middleware::http)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use token_gate::{AuthFactory, TokenDecoder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,token_gate=debug,tower_http=debug cargo run -p resource-server
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process. Production: default hook, server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting resource server in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");

    let app = build_router(&config)?;
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_factory(config: &Config) -> Result<AuthFactory> {
    // One decoder shared by every token middleware the factory builds.
    let decoder: Arc<dyn TokenDecoder> = Arc::new(config.decoder()?);
    Ok(AuthFactory::new(Some(Arc::new(move || Arc::clone(&decoder)))))
}

fn build_router(config: &Config) -> Result<Router> {
    let factory = build_factory(config)?;
    let settings = &config.token_settings;
    let state = AppState::new(settings.attributes.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(&factory, settings)?)
        .fallback(not_found)
        .with_state(state);

    Ok(middleware::http::apply(router, config))
}

async fn not_found() -> AppError {
    AppError::NotFound
}
