use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamingzone::player::repository::{InMemoryPlayerRepository, PostgresPlayerRepository};
use gamingzone::stats::repository::{InMemoryScoreRepository, PostgresScoreRepository};
use gamingzone::stats::service::Leveling;
use gamingzone::{api_router, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamingzone=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GamingZone portal server");

    // Create shared application state with dependency injection.
    // DATABASE_URL switches to the PostgreSQL repositories; without it
    // everything lives in memory.
    let app_state = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            info!("Using PostgreSQL repositories");
            AppState::new(
                Arc::new(PostgresPlayerRepository::new(pool.clone())),
                Arc::new(PostgresScoreRepository::new(pool)),
                Leveling::default(),
            )
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory repositories");
            AppState::new(
                Arc::new(InMemoryPlayerRepository::new()),
                Arc::new(InMemoryScoreRepository::new()),
                Leveling::default(),
            )
        }
    };

    // The front end is served from a different origin in development.
    let app = api_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
