use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use helpdesk_api::{app, config, jobs, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics();

    info!("Starting Helpdesk API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let db_config = persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    };
    let pool = persistence::db::create_pool(&db_config).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Start background jobs
    let notifier = services::Notifier::new(pool.clone());
    let lifecycle = services::TicketLifecycleService::new(
        pool.clone(),
        notifier,
        config.support.notify_owner_on_self_close,
    );
    let email = services::EmailService::new(config.email.clone());

    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::AutoCloseJob::new(
        pool.clone(),
        lifecycle,
        config.support.inactivity_close_days,
        config.support.auto_close_batch_size,
    ));
    scheduler.register(jobs::NotificationDeliveryJob::new(
        pool.clone(),
        Arc::new(email),
        config.support.notification_batch_size,
    ));
    scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = app::create_app(config.clone(), pool);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background jobs before exiting
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    info!("Shutdown signal received");
}
