mod assistant;
mod chat;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::Assistant;
use crate::chat::ChatService;
use crate::config::{Config, Storage};
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, Documents, FileStore, MemoryStore, RedisStore};
use crate::tracker::Tracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Companion API v{}", env!("CARGO_PKG_VERSION"));

    // Document store: Redis, JSON files on disk, or process memory
    let store: Arc<dyn DocumentStore> = match &config.storage {
        Storage::Redis(url) => {
            let store = RedisStore::connect(url).await?;
            info!("Document store: Redis");
            Arc::new(store)
        }
        Storage::Files(dir) => {
            let store = FileStore::open(dir.clone()).await?;
            info!("Document store: files under {}", store.dir().display());
            Arc::new(store)
        }
        Storage::Memory => {
            warn!("Neither REDIS_URL nor DATA_DIR is set; documents are kept in memory only");
            Arc::new(MemoryStore::default())
        }
    };
    let tracker = Arc::new(Tracker::load(Documents::new(store)).await?);

    // Initialize the model client
    let model = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_api_base.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let assistant = Assistant::new(Arc::new(model));

    let state = AppState {
        chats: ChatService::new(tracker.clone(), assistant.clone()),
        tracker,
        assistant,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
