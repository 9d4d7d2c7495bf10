//! HTTP request handlers for the showroom backend API.
//!
//! Every handler is a direct mapping of an HTTP verb to a store call, with
//! soft-delete visibility applied in the queries. Mutating endpoints require
//! a valid admin Bearer token; the public feeds and inquiry submission are
//! open. Failures are logged server-side and surface as a flat
//! `{"error": message}` body with a generic message.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::auth::{self, AuthError, TokenClaims};
use crate::config::Config;
use crate::models::*;
use crate::store::{NewImage, Store, StoreError};
use crate::uploads::{self, UploadError};

/// Version stamp embedded in backup exports
const EXPORT_FORMAT_VERSION: u32 = 1;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}

// === Health Check ===

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Showroom API is running",
        timestamp: Utc::now(),
    })
}

// === Admin Gate ===

/// Require a valid admin Bearer token on the request
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<TokenClaims, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized("Authorization header required"))?;

    let token = auth::extract_bearer_token(header_value)
        .ok_or(ApiError::Unauthorized("Authorization header required"))?;

    auth::verify_token(&state.config.token_secret, token)
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))
}

// === Motorcycles ===

/// GET /api/motorcycles - public feed of featured, non-deleted listings
pub async fn list_motorcycles(
    State(state): State<AppState>,
) -> Result<Json<Vec<MotorcycleWithImages>>, ApiError> {
    let motorcycles = state.store.motorcycles_with_images(true).await?;
    Ok(Json(motorcycles))
}

/// POST /api/motorcycles
pub async fn create_motorcycle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<MotorcycleInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let motorcycle = state.store.create_motorcycle(&input).await?;
    info!(id = motorcycle.id, name = %motorcycle.name, "Created motorcycle listing");

    Ok((StatusCode::CREATED, Json(motorcycle)))
}

/// PUT /api/motorcycles/:id - full-field replace of a visible listing
pub async fn update_motorcycle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<MotorcycleInput>,
) -> Result<Json<Motorcycle>, ApiError> {
    require_admin(&state, &headers)?;

    let motorcycle = state
        .store
        .update_motorcycle(id, &input)
        .await?
        .ok_or(ApiError::NotFound("Motorcycle not found"))?;

    Ok(Json(motorcycle))
}

/// DELETE /api/motorcycles/:id - soft delete, idempotent
pub async fn delete_motorcycle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Ack>, ApiError> {
    require_admin(&state, &headers)?;

    state.store.soft_delete_motorcycle(id).await?;
    info!(id, "Soft-deleted motorcycle listing");

    Ok(Json(Ack { success: true }))
}

/// POST /api/motorcycles/:id/images - attach up to five image files
///
/// Files are written first, then the listing is checked; on a bad id every
/// written file is removed before the 404 goes out, and the batch insert
/// runs in one transaction so a store failure leaves no partial image set.
pub async fn upload_motorcycle_images(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let saved = uploads::save_images(&mut multipart, &state.config.upload_dir, "images").await?;
    if saved.is_empty() {
        return Err(ApiError::Validation("no files uploaded".to_string()));
    }

    match state.store.motorcycle_visible(id).await {
        Ok(true) => {}
        Ok(false) => {
            uploads::cleanup(&saved).await;
            return Err(ApiError::NotFound("Motorcycle not found"));
        }
        Err(err) => {
            uploads::cleanup(&saved).await;
            return Err(err.into());
        }
    }

    let base_url = public_base_url(&headers);
    let images: Vec<NewImage> = saved
        .iter()
        .map(|file| NewImage {
            url: format!("{base_url}/uploads/{}", file.file_name),
            original_name: Some(file.original_name.clone()),
            size_bytes: file.size as i64,
        })
        .collect();

    match state.store.attach_images(id, &images).await {
        Ok(stored) => {
            info!(id, count = stored.len(), "Attached images to motorcycle listing");
            Ok((StatusCode::CREATED, Json(stored)))
        }
        Err(err) => {
            uploads::cleanup(&saved).await;
            Err(err.into())
        }
    }
}

/// Base URL from the request's own Host header; scheme from the proxy
/// header when present, plain http otherwise
fn public_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

// === Testimonials ===

/// GET /api/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    let testimonials = state.store.list_testimonials().await?;
    Ok(Json(testimonials))
}

/// POST /api/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TestimonialInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let testimonial = state.store.create_testimonial(&input).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// PUT /api/testimonials/:id
pub async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<TestimonialInput>,
) -> Result<Json<Testimonial>, ApiError> {
    require_admin(&state, &headers)?;

    let testimonial = state
        .store
        .update_testimonial(id, &input)
        .await?
        .ok_or(ApiError::NotFound("Testimonial not found"))?;

    Ok(Json(testimonial))
}

/// DELETE /api/testimonials/:id - soft delete, idempotent
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Ack>, ApiError> {
    require_admin(&state, &headers)?;

    state.store.soft_delete_testimonial(id).await?;

    Ok(Json(Ack { success: true }))
}

// === Inquiries ===

/// POST /api/inquiries - record a customer inquiry
///
/// Accepts either a JSON body or a multipart form. Attached photos are
/// counted into `photos_count` and dropped; they are never written to disk.
pub async fn submit_inquiry(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (input, photos_count) = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::Validation("malformed multipart request".to_string()))?;
        parse_inquiry_form(&mut multipart).await?
    } else {
        let Json(input) = Json::<InquiryInput>::from_request(request, &())
            .await
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        (input, 0)
    };

    let inquiry = state.store.insert_inquiry(&input, photos_count).await?;
    info!(id = inquiry.id, photos_count, "Recorded inquiry");

    Ok((StatusCode::CREATED, Json(inquiry)))
}

/// Collect inquiry fields from a multipart form, counting photo parts
async fn parse_inquiry_form(multipart: &mut Multipart) -> Result<(InquiryInput, i32), ApiError> {
    let mut input = InquiryInput::default();
    let mut photos_count = 0;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::Validation("malformed multipart request".to_string()))?;
        let Some(field) = field else { break };

        if field.file_name().is_some() {
            // Drain and drop the bytes; only the count is recorded
            field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("malformed multipart request".to_string()))?;
            photos_count += 1;
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|_| ApiError::Validation("malformed multipart request".to_string()))?;

        match name.as_str() {
            "name" => input.name = value,
            "phone" => input.phone = value,
            "model" => input.model = Some(value),
            "year" => input.year = Some(value),
            "details" => input.details = Some(value),
            _ => {}
        }
    }

    Ok((input, photos_count))
}

// === Admin Auth ===

/// POST /api/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let admin = state
        .store
        .find_admin_by_username(&request.username)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    auth::verify_password(&request.password, &admin.password_hash)?;

    let (token, expiry) = auth::issue_token(&state.config.token_secret, admin.id, &admin.username);
    info!(username = %admin.username, "Admin logged in");

    Ok(Json(LoginResponse {
        token,
        expiry,
        user: AdminPublic::from(&admin),
    }))
}

/// POST /api/admin/verify - always 200; failures collapse to valid:false
pub async fn admin_verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    match auth::verify_token(&state.config.token_secret, &request.token) {
        Some(claims) => Json(VerifyResponse {
            valid: true,
            user: Some(AdminPublic {
                id: claims.sub,
                username: claims.username,
            }),
        }),
        None => Json(VerifyResponse {
            valid: false,
            user: None,
        }),
    }
}

// === Backup Export ===

/// GET /api/backup - full snapshot of non-deleted content
///
/// Two independent queries; the snapshot is not transactionally atomic
/// across them.
pub async fn export_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ExportResponse>, ApiError> {
    require_admin(&state, &headers)?;

    let motorcycles = state.store.motorcycles_with_images(false).await?;
    let testimonials = state.store.list_testimonials().await?;

    Ok(Json(ExportResponse {
        motorcycles,
        testimonials,
        generated_at: Utc::now(),
        format_version: EXPORT_FORMAT_VERSION,
    }))
}

// === Error Handling ===

/// API error taxonomy
#[derive(Debug)]
pub enum ApiError {
    /// Bad upload type/size or missing required field (400)
    Validation(String),
    /// Bad credentials or missing/invalid token (401)
    Unauthorized(&'static str),
    /// Id does not resolve to a visible row (404)
    NotFound(&'static str),
    /// Store or filesystem failure (500); cause already logged
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "store operation failed");
        ApiError::Internal
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(err) => {
                error!(error = %err, "upload write failed");
                ApiError::Internal
            }
            UploadError::Multipart(_) => {
                warn!("malformed multipart request");
                ApiError::Validation("malformed multipart request".to_string())
            }
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials"),
            AuthError::PasswordHash => {
                error!("password hashing failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse { error: message });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_base_url_uses_host_and_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "dealer.example.com".parse().unwrap());
        assert_eq!(public_base_url(&headers), "http://dealer.example.com");

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(public_base_url(&headers), "https://dealer.example.com");
    }

    #[test]
    fn public_base_url_falls_back_to_localhost() {
        assert_eq!(public_base_url(&HeaderMap::new()), "http://localhost");
    }
}
