//! Showroom Backend - Dealership Website API
//!
//! Persists motorcycle listings (with uploaded images), testimonials, and
//! customer inquiries in PostgreSQL, and gates writes behind a single-admin
//! session token. Serves uploaded files and the static frontend directly.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::{error, info};

use showroom_backend::{auth, build_router, config::Config, handlers::AppState, store::Store};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Initialize structured logging
    init_tracing();

    // Load and validate configuration; a missing or weak signing secret
    // aborts startup rather than falling back to a built-in value
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };
    log_startup_info(&config);

    // Connect to the store and bring the schema up to date
    let pool = connect_pool(&config)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create uploads directory");

    let store = Store::new(pool);
    seed_admin(&store, &config).await;

    // Build and serve the application
    let state = AppState::new(store, Arc::new(config.clone()));
    let app = build_router(state);
    serve(app, &config).await;
}

/// Initialize tracing with environment-based log levels.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("showroom_backend=debug,tower_http=info")),
        )
        .init();
}

/// Log startup configuration (no secrets).
fn log_startup_info(config: &Config) {
    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        environment = %config.environment,
        upload_dir = %config.upload_dir.display(),
        public_dir = %config.public_dir.display(),
        "Starting showroom backend"
    );
}

/// Open the connection pool. TLS toward the store is required in
/// production and relaxed elsewhere.
async fn connect_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let ssl_mode = if config.is_production() {
        PgSslMode::Require
    } else {
        PgSslMode::Prefer
    };

    let options = PgConnectOptions::from_str(&config.database_url)?.ssl_mode(ssl_mode);

    PgPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
}

/// Create the admin credential row on first boot.
///
/// When no row exists yet, ADMIN_PASSWORD must be set; refusing to invent a
/// default keeps an unconfigured deployment from coming up with a known
/// password.
async fn seed_admin(store: &Store, config: &Config) {
    let existing = store
        .find_admin_by_username(&config.admin_username)
        .await
        .expect("Failed to query admin account");
    if existing.is_some() {
        return;
    }

    let Some(password) = config.admin_password.as_deref() else {
        error!("no admin account exists and ADMIN_PASSWORD is not set");
        std::process::exit(1);
    };

    let password_hash = auth::hash_password(password).expect("Failed to hash admin password");
    store
        .seed_admin(&config.admin_username, &password_hash)
        .await
        .expect("Failed to seed admin account");

    info!(username = %config.admin_username, "Seeded admin account");
}

/// Bind to address and serve the application.
async fn serve(app: axum::Router, config: &Config) {
    let bind_addr = format!("{}:{}", config.bind_addr, config.port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app).await.expect("Server error");
}
