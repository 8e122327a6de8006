use gsc_dashboard::api::{AppState, RowCache};
use gsc_dashboard::config::Config;
use gsc_dashboard::fetcher::Fetcher;
use gsc_dashboard::gsc::{Credentials, GscClient};
use gsc_dashboard::server;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gsc_dashboard=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        row_limit = config.effective_row_limit(),
        verified_only = config.verified_only,
        "Starting Search Console dashboard"
    );

    let client = match GscClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Could not set up Search Console credentials; set GSC_CREDENTIALS or GSC_ACCESS_TOKEN"
            );
            std::process::exit(1);
        }
    };
    match client.credentials() {
        Credentials::ServiceAccount(auth) => {
            tracing::info!(client_email = %auth.client_email(), "Using service account");
        }
        Credentials::AccessToken(_) => tracing::info!("Using pre-issued access token"),
    }

    // Token problems surface per request too; checking here gives an early hint.
    if let Err(e) = client.authorize().await {
        tracing::warn!(error = %e, "Initial token exchange failed");
    }

    let cache = RowCache::new(config.cache_ttl_secs);

    // Periodic eviction of expired tables
    if config.cache_ttl_secs > 0 {
        let sweep_cache = cache.clone();
        let ttl = config.cache_ttl_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(ttl));
            loop {
                interval.tick().await;
                sweep_cache.cleanup_expired();
                tracing::debug!(remaining = sweep_cache.len(), "Cache sweep completed");
            }
        });
    }

    let state = Arc::new(AppState {
        fetcher: Fetcher::from_config(client, &config),
        cache,
        dashboard_origin: config.dashboard_origin.clone(),
    });

    let app = server::build_router(state);
    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %addr, "Listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
