use anyhow::{Context, Result};
use axum::{extract::FromRef, Router};
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::Settings, dealer_api::DealerApi};

mod catalog;
mod config;
mod dealer_api;
mod error;
mod filters;
mod inventory;
mod models;
mod price;
mod query;
mod routes;
mod url_codec;

// Shared by every handler
#[derive(Clone, FromRef)]
struct AppState {
    settings: Arc<Settings>,
    dealer_api: Arc<DealerApi>,
}

fn build_http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("car_showroom/", env!("CARGO_PKG_VERSION")))
        .cookie_store(true)
        .timeout(Duration::from_secs(settings.request_timeout_secs));

    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url).context("Invalid proxy_url in configuration")?;
        builder = builder.proxy(proxy);
        tracing::info!("Routing dealer API traffic through configured proxy.");
    }

    builder.build().context("Failed to build shared reqwest client")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "car_showroom=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing car showroom server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!(api_base_url = %s.api_base_url, language = ?s.language, "Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let http_client = Arc::new(build_http_client(&settings)?);
    let dealer_api = DealerApi::new(http_client, &settings).context("Failed to set up dealer API client")?;
    tracing::info!("Dealer API client created.");

    let app_state = AppState {
        settings: Arc::new(settings),
        dealer_api: Arc::new(dealer_api),
    };

    let router: Router = routes::create_router(app_state.clone());
    let app = router
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = app_state
        .settings
        .server_address
        .parse()
        .with_context(|| format!("Invalid server address format: {}", app_state.settings.server_address))?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
