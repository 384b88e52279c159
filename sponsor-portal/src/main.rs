use dotenvy::dotenv;
use service_core::observability::logging::init_tracing;
use sponsor_auth::provider::{HttpIdentityProvider, ProviderConfig};
use sponsor_portal::config::get_configuration;
use sponsor_portal::services::rpc::PlatformRpcClient;
use sponsor_portal::startup::build_router;
use sponsor_portal::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("sponsor-portal", "info");

    let provider = Arc::new(HttpIdentityProvider::new(ProviderConfig {
        base_url: configuration.identity.url.clone(),
        anon_key: configuration.identity.anon_key.clone(),
        service_key: configuration.identity.service_key.clone(),
        token_file: configuration.identity.token_file.clone(),
    }));
    let rpc = Arc::new(PlatformRpcClient::new(&configuration.platform));

    let state = AppState::new(configuration.clone(), provider, rpc);
    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting sponsor-portal on {}", address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
