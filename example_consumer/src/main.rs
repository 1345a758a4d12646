//! Example consumer: loads a model file, connects to PostgreSQL and serves the data routes.
//!
//! Run from repo root: `cargo run -p example-consumer`

use strata_sdk::{
    common_routes_with_ready, data_routes, load_from_path, resolve, AppState, Client, PgBackend, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strata_sdk=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let definitions = load_from_path(&settings.models_path).await?;
    let registry = resolve(&definitions)?;
    tracing::info!(models = definitions.len(), path = %settings.models_path.display(), "model registry loaded");

    let backend = PgBackend::connect(&settings).await?;
    let client = Client::new(registry, Arc::new(backend));
    let state = AppState::new(client).with_debug(settings.debug);

    let app = common_routes_with_ready(state.clone()).merge(data_routes(state));
    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
