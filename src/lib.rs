//! # Showroom Backend
//!
//! CRUD backend for a small dealership website: motorcycle listings with
//! uploaded images, customer testimonials, and inquiries, with a
//! single-admin token gate on write operations.
//!
//! ## Design Notes
//!
//! - **Soft deletes**: listings and testimonials are stamped with
//!   `deleted_at`, never removed; every read filters on it
//! - **Stateless auth**: one seeded admin account; signed tokens carry their
//!   own expiry, so verification needs no session table
//! - **Upload hygiene**: files written during a failed request are always
//!   removed before the error response goes out
//! - **No shared in-process state**: the database is the only shared mutable
//!   state; concurrent writes race at the row level, last write wins
//!
//! ## API Overview
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/health` | GET | Health check |
//! | `/api/motorcycles` | GET | Featured listings with images |
//! | `/api/motorcycles` | POST | Create listing (admin) |
//! | `/api/motorcycles/:id` | PUT | Replace listing (admin) |
//! | `/api/motorcycles/:id` | DELETE | Soft-delete listing (admin) |
//! | `/api/motorcycles/:id/images` | POST | Attach images (admin) |
//! | `/api/testimonials` | GET/POST | List / create (admin) |
//! | `/api/testimonials/:id` | PUT/DELETE | Replace / soft-delete (admin) |
//! | `/api/inquiries` | POST | Submit inquiry (photos counted, discarded) |
//! | `/api/admin/login` | POST | Password login, returns session token |
//! | `/api/admin/verify` | POST | Token check, always 200 |
//! | `/api/backup` | GET | Full content export (admin) |
//! | `/uploads/*` | GET | Uploaded image files |
//! | `*` | GET | Static frontend entry document |

pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod store;
pub mod uploads;

pub use config::Config;
pub use handlers::AppState;
pub use store::Store;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Maximum request body size: five files at the per-file cap plus headroom
/// for the surrounding form fields
pub const MAX_BODY_SIZE: usize =
    uploads::MAX_FILES_PER_REQUEST * uploads::MAX_FILE_SIZE + 1024 * 1024;

/// Build the Axum router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let frontend = ServeDir::new(&state.config.public_dir)
        .not_found_service(ServeFile::new(state.config.public_dir.join("index.html")));

    Router::new()
        // Health check (unauthenticated)
        .route("/api/health", get(handlers::health))
        // Listings
        .route(
            "/api/motorcycles",
            get(handlers::list_motorcycles).post(handlers::create_motorcycle),
        )
        .route(
            "/api/motorcycles/:id",
            put(handlers::update_motorcycle).delete(handlers::delete_motorcycle),
        )
        .route(
            "/api/motorcycles/:id/images",
            post(handlers::upload_motorcycle_images),
        )
        // Testimonials
        .route(
            "/api/testimonials",
            get(handlers::list_testimonials).post(handlers::create_testimonial),
        )
        .route(
            "/api/testimonials/:id",
            put(handlers::update_testimonial).delete(handlers::delete_testimonial),
        )
        // Inquiries
        .route("/api/inquiries", post(handlers::submit_inquiry))
        // Admin auth
        .route("/api/admin/login", post(handlers::admin_login))
        .route("/api/admin/verify", post(handlers::admin_verify))
        // Backup export
        .route("/api/backup", get(handlers::export_backup))
        // Uploaded files and the static frontend for anything unmatched
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback_service(frontend)
        // Middleware stack (order matters: first added = outermost)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
