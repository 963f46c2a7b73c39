//! Chat relay server binary.
//!
//! # Usage
//!
//! ```bash
//! # In-memory message store (development)
//! chat-relay
//!
//! # PostgreSQL message store
//! CHAT_RELAY__DATABASE__URL=postgres://chat@localhost/chat \
//! CHAT_RELAY__DATABASE__RUN_MIGRATIONS=true \
//! chat-relay
//! ```

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_relay::adapters::http::rooms_routes;
use chat_relay::adapters::websocket::{websocket_router, WebSocketBroadcaster, WebSocketState};
use chat_relay::adapters::{InMemoryMessageStore, PostgresMessageStore};
use chat_relay::application::ChatHub;
use chat_relay::config::{AppConfig, DatabaseConfig, OriginPolicy, ServerConfig};
use chat_relay::ports::MessageStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        "Chat relay starting"
    );

    let store = build_store(config.database.as_ref()).await?;
    let broadcaster = Arc::new(WebSocketBroadcaster::new(config.relay.outbound_buffer));
    let hub = ChatHub::with_max_message_len(
        broadcaster.clone(),
        store,
        config.relay.max_message_len,
    );

    let app = Router::new()
        .merge(websocket_router().with_state(WebSocketState::new(hub.clone(), broadcaster)))
        .merge(rooms_routes(hub))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Chat relay stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn build_store(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn MessageStore>, Box<dyn std::error::Error>> {
    let Some(database) = database else {
        tracing::warn!("No database configured - messages are kept in memory only");
        return Ok(Arc::new(InMemoryMessageStore::new()));
    };

    let pool = database.pool_options().connect(&database.url).await?;
    let store = PostgresMessageStore::new(pool);
    if database.run_migrations {
        store.ensure_schema().await?;
        tracing::info!("Message store schema ready");
    }
    Ok(Arc::new(store))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = match server.origin_policy() {
        OriginPolicy::Any => return CorsLayer::permissive(),
        OriginPolicy::SameOriginOnly => {
            tracing::warn!("No allowed origins configured - cross-origin requests are refused");
            return CorsLayer::new();
        }
        OriginPolicy::Listed(origins) => origins,
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
