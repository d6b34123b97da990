use rental_booking_ddd::{
    adapters::postgres::{
        PostgresAssetCatalog, PostgresBookingRepository, PostgresIdentityProvider, seed_demo_data,
    },
    api::{handlers::AppState, router::create_router},
    application::booking::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_booking_ddd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!(
        bind_addr = %config.bind_addr,
        max_connections = config.db_max_connections,
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        "Configuration loaded"
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    if config.seed_demo_data {
        seed_demo_data(&pool)
            .await
            .expect("Failed to seed demo data");
        tracing::info!("Demo assets and users seeded");
    }

    // Initialize adapters
    let booking_repository = Arc::new(PostgresBookingRepository::new(pool.clone()));
    let asset_catalog = Arc::new(PostgresAssetCatalog::new(pool.clone()));
    let identity_provider = Arc::new(PostgresIdentityProvider::new(pool));

    let service_deps = ServiceDependencies {
        booking_repository,
        asset_catalog,
        identity_provider,
        settings: config.booking_settings(),
    };

    let app_state = Arc::new(AppState { service_deps });

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
