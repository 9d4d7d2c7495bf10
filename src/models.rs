//! Data models for the showroom backend.
//!
//! Row types map directly onto the PostgreSQL schema; listings and
//! testimonials carry a `deleted_at` stamp instead of ever being removed.
//! Request and response shapes for the JSON API live alongside them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default color tag for testimonials submitted without one
pub const DEFAULT_TESTIMONIAL_COLOR: &str = "orange";

/// A motorcycle listing row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Motorcycle {
    pub id: i64,
    pub name: String,
    /// Display price, stored as entered (e.g. "KES 150000")
    pub price: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub mileage: Option<String>,
    pub location: Option<String>,
    /// Whether the listing appears in the public feed
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An image attached to a motorcycle listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MotorcycleImage {
    pub id: i64,
    pub motorcycle_id: i64,
    /// Public URL, built from the uploading request's scheme and host
    pub url: String,
    pub original_name: Option<String>,
    pub size_bytes: i64,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// A listing with its images, primary first then oldest upload first
#[derive(Debug, Clone, Serialize)]
pub struct MotorcycleWithImages {
    #[serde(flatten)]
    pub motorcycle: Motorcycle,
    pub images: Vec<MotorcycleImage>,
}

/// A customer testimonial row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub text: String,
    /// Display color tag for the frontend
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A customer inquiry row (append-only)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Inquiry {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub model: Option<String>,
    pub year: Option<String>,
    pub details: Option<String>,
    /// Number of photos submitted with the inquiry; the photos themselves
    /// are discarded, never stored
    pub photos_count: i32,
    pub created_at: DateTime<Utc>,
}

/// The admin credential row. Never serialized - the password hash must not
/// leave the server.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of an admin account, safe to return to clients
#[derive(Debug, Clone, Serialize)]
pub struct AdminPublic {
    pub id: i64,
    pub username: String,
}

impl From<&AdminUser> for AdminPublic {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

// === API Request/Response Models ===

/// Create/update payload for a motorcycle listing (full-field replace)
#[derive(Debug, Deserialize)]
pub struct MotorcycleInput {
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub year: Option<String>,
    pub mileage: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_featured")]
    pub featured: bool,
}

fn default_featured() -> bool {
    true
}

/// Create/update payload for a testimonial (full-field replace)
#[derive(Debug, Deserialize)]
pub struct TestimonialInput {
    pub name: String,
    pub location: Option<String>,
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_TESTIMONIAL_COLOR.to_string()
}

/// Inquiry submission fields. Accepted as-is beyond the store's NOT NULL
/// columns - no phone format validation.
#[derive(Debug, Default, Deserialize)]
pub struct InquiryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub model: Option<String>,
    pub year: Option<String>,
    pub details: Option<String>,
}

/// Admin login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Admin login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Explicit expiry timestamp for client display
    pub expiry: DateTime<Utc>,
    pub user: AdminPublic,
}

/// Token verification request
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Token verification response - always 200, never an error
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AdminPublic>,
}

/// Acknowledgement for soft deletes
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Operator-initiated backup snapshot
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    /// All non-deleted listings with images, regardless of the featured flag
    pub motorcycles: Vec<MotorcycleWithImages>,
    /// All non-deleted testimonials
    pub testimonials: Vec<Testimonial>,
    pub generated_at: DateTime<Utc>,
    pub format_version: u32,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
