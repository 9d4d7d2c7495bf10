//! PostgreSQL-backed store.
//!
//! One method per SQL statement. Soft-deleted rows are filtered with
//! `deleted_at IS NULL`; nothing is ever physically removed by the
//! application. The image batch insert is the only multi-statement write and
//! runs inside a single transaction so a failed upload leaves no partial
//! image set.

use sqlx::postgres::PgPool;

use crate::models::*;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A pending image row for a batch insert
#[derive(Debug, Clone)]
pub struct NewImage {
    pub url: String,
    pub original_name: Option<String>,
    pub size_bytes: i64,
}

/// Thread-safe handle to the database
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // === Motorcycles ===

    /// Fetch non-deleted listings with their images, newest listing first.
    ///
    /// `only_featured` restricts to the public feed; the backup export passes
    /// `false` to include everything that is not soft-deleted. Images come
    /// back primary-first, then by upload time; listings with no images get
    /// an empty array.
    pub async fn motorcycles_with_images(
        &self,
        only_featured: bool,
    ) -> Result<Vec<MotorcycleWithImages>, StoreError> {
        let query = if only_featured {
            "SELECT id, name, price, description, year, mileage, location, featured, \
                    created_at, updated_at, deleted_at \
             FROM motorcycles \
             WHERE deleted_at IS NULL AND featured = TRUE \
             ORDER BY created_at DESC"
        } else {
            "SELECT id, name, price, description, year, mileage, location, featured, \
                    created_at, updated_at, deleted_at \
             FROM motorcycles \
             WHERE deleted_at IS NULL \
             ORDER BY created_at DESC"
        };

        let motorcycles: Vec<Motorcycle> = sqlx::query_as(query).fetch_all(&self.pool).await?;

        let ids: Vec<i64> = motorcycles.iter().map(|m| m.id).collect();
        let images: Vec<MotorcycleImage> = sqlx::query_as(
            "SELECT id, motorcycle_id, url, original_name, size_bytes, is_primary, uploaded_at \
             FROM motorcycle_images \
             WHERE motorcycle_id = ANY($1) \
             ORDER BY is_primary DESC, uploaded_at ASC, id ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_listing: std::collections::HashMap<i64, Vec<MotorcycleImage>> =
            std::collections::HashMap::new();
        for image in images {
            by_listing.entry(image.motorcycle_id).or_default().push(image);
        }

        Ok(motorcycles
            .into_iter()
            .map(|motorcycle| {
                let images = by_listing.remove(&motorcycle.id).unwrap_or_default();
                MotorcycleWithImages { motorcycle, images }
            })
            .collect())
    }

    /// Insert a listing and return the stored row
    pub async fn create_motorcycle(
        &self,
        input: &MotorcycleInput,
    ) -> Result<Motorcycle, StoreError> {
        let motorcycle = sqlx::query_as(
            "INSERT INTO motorcycles (name, price, description, year, mileage, location, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, name, price, description, year, mileage, location, featured, \
                       created_at, updated_at, deleted_at",
        )
        .bind(&input.name)
        .bind(&input.price)
        .bind(&input.description)
        .bind(&input.year)
        .bind(&input.mileage)
        .bind(&input.location)
        .bind(input.featured)
        .fetch_one(&self.pool)
        .await?;

        Ok(motorcycle)
    }

    /// Full-field replace of a visible listing. Returns `None` when no
    /// non-deleted row has the given id.
    pub async fn update_motorcycle(
        &self,
        id: i64,
        input: &MotorcycleInput,
    ) -> Result<Option<Motorcycle>, StoreError> {
        let motorcycle = sqlx::query_as(
            "UPDATE motorcycles \
             SET name = $1, price = $2, description = $3, year = $4, mileage = $5, \
                 location = $6, featured = $7, updated_at = now() \
             WHERE id = $8 AND deleted_at IS NULL \
             RETURNING id, name, price, description, year, mileage, location, featured, \
                       created_at, updated_at, deleted_at",
        )
        .bind(&input.name)
        .bind(&input.price)
        .bind(&input.description)
        .bind(&input.year)
        .bind(&input.mileage)
        .bind(&input.location)
        .bind(input.featured)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(motorcycle)
    }

    /// Stamp a listing deleted. Unknown or already-deleted ids are a silent
    /// no-op, not an error.
    pub async fn soft_delete_motorcycle(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE motorcycles SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Whether a listing exists and is not soft-deleted
    pub async fn motorcycle_visible(&self, id: i64) -> Result<bool, StoreError> {
        let visible: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM motorcycles WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(visible.unwrap_or(false))
    }

    /// Insert a batch of image rows for a listing in one transaction.
    ///
    /// If the listing has no primary image yet, the first row of the batch
    /// becomes primary so the feed has a stable cover image.
    pub async fn attach_images(
        &self,
        motorcycle_id: i64,
        images: &[NewImage],
    ) -> Result<Vec<MotorcycleImage>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let has_primary: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM motorcycle_images \
             WHERE motorcycle_id = $1 AND is_primary)",
        )
        .bind(motorcycle_id)
        .fetch_optional(&mut *tx)
        .await?;
        let mut needs_primary = !has_primary.unwrap_or(false);

        let mut stored = Vec::with_capacity(images.len());
        for image in images {
            let row: MotorcycleImage = sqlx::query_as(
                "INSERT INTO motorcycle_images \
                     (motorcycle_id, url, original_name, size_bytes, is_primary) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, motorcycle_id, url, original_name, size_bytes, is_primary, \
                           uploaded_at",
            )
            .bind(motorcycle_id)
            .bind(&image.url)
            .bind(&image.original_name)
            .bind(image.size_bytes)
            .bind(needs_primary)
            .fetch_one(&mut *tx)
            .await?;

            needs_primary = false;
            stored.push(row);
        }

        tx.commit().await?;

        Ok(stored)
    }

    // === Testimonials ===

    /// Non-deleted testimonials, newest first
    pub async fn list_testimonials(&self) -> Result<Vec<Testimonial>, StoreError> {
        let testimonials = sqlx::query_as(
            "SELECT id, name, location, text, color, created_at, deleted_at \
             FROM testimonials \
             WHERE deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(testimonials)
    }

    pub async fn create_testimonial(
        &self,
        input: &TestimonialInput,
    ) -> Result<Testimonial, StoreError> {
        let testimonial = sqlx::query_as(
            "INSERT INTO testimonials (name, location, text, color) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, location, text, color, created_at, deleted_at",
        )
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.text)
        .bind(&input.color)
        .fetch_one(&self.pool)
        .await?;

        Ok(testimonial)
    }

    pub async fn update_testimonial(
        &self,
        id: i64,
        input: &TestimonialInput,
    ) -> Result<Option<Testimonial>, StoreError> {
        let testimonial = sqlx::query_as(
            "UPDATE testimonials \
             SET name = $1, location = $2, text = $3, color = $4 \
             WHERE id = $5 AND deleted_at IS NULL \
             RETURNING id, name, location, text, color, created_at, deleted_at",
        )
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.text)
        .bind(&input.color)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(testimonial)
    }

    /// Stamp a testimonial deleted; idempotent like the listing variant
    pub async fn soft_delete_testimonial(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE testimonials SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // === Inquiries ===

    /// Record an inquiry. Only the count of any submitted photos is kept.
    pub async fn insert_inquiry(
        &self,
        input: &InquiryInput,
        photos_count: i32,
    ) -> Result<Inquiry, StoreError> {
        let inquiry = sqlx::query_as(
            "INSERT INTO inquiries (name, phone, model, year, details, photos_count) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, phone, model, year, details, photos_count, created_at",
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.model)
        .bind(&input.year)
        .bind(&input.details)
        .bind(photos_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(inquiry)
    }

    // === Admin accounts ===

    pub async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, StoreError> {
        let admin = sqlx::query_as(
            "SELECT id, username, password_hash, created_at \
             FROM admin_users \
             WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// Create the admin credential row if no row claims the username yet
    pub async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_users (username, password_hash) \
             VALUES ($1, $2) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
