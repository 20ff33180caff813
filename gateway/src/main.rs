use anyhow::Result;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod routes;
mod storage;

use config::GatewayConfig;
use routes::AppState;
use storage::CalculationStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "link_gateway=debug,tower_http=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();

    let store = CalculationStore::open(&config.storage_dir)?;
    tracing::info!("   Saved calculations in {}", store.dir().display());

    let api = routes::router(AppState { store })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Static file serving for UI (if dist exists)
    let app = if config.ui_dir.exists() {
        tracing::info!("   Serving UI from {}", config.ui_dir.display());
        api.nest_service("/ui", ServeDir::new(&config.ui_dir))
    } else {
        tracing::warn!("   UI not built at {}", config.ui_dir.display());
        api
    };

    let addr = config.addr();
    tracing::info!("Link budget gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
