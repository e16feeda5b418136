use std::error::Error;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shift_roster::api::{AppState, create_router};
use shift_roster::config::ConfigLoader;
use shift_roster::service::RosterService;
use shift_roster::store::RosterStore;

const CONFIG_PATH_ENV: &str = "ROSTER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config/roster.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shift_roster=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let loader = ConfigLoader::load(&config_path)?;
    tracing::info!(path = %config_path, "Configuration loaded");

    let store = RosterStore::connect(loader.database()).await?;
    store.health_check().await?;
    tracing::info!("Database ready");

    let state = AppState::new(RosterService::new(store), loader.auth().clone());
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = loader.server().bind_address();
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
