//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub mobile: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub gender: Option<&'a str>,
    pub categories: &'a [String],
}

/// Partial profile update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub gender: Option<String>,
    pub instagram: Option<String>,
    pub categories: Option<Vec<String>>,
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                   latitude, longitude, location_updated_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                   latitude, longitude, location_updated_at, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by mobile number.
    pub async fn find_by_mobile(&self, mobile: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_mobile");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                   latitude, longitude, location_updated_at, created_at, updated_at
            FROM users
            WHERE mobile = $1
            "#,
        )
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether an account already uses this mobile number.
    pub async fn mobile_exists(&self, mobile: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_mobile_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE mobile = $1)",
        )
        .bind(mobile)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether a user with this ID exists.
    pub async fn exists(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_exists");
        let result = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Creates the user and consumes the verified OTP for its mobile in one
    /// transaction.
    ///
    /// Returns `None` (and writes nothing) when no verified OTP exists for
    /// the mobile at commit time.
    pub async fn create_with_verified_otp(
        &self,
        new_user: NewUser<'_>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_user_with_otp");

        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query("DELETE FROM otps WHERE mobile = $1 AND verified = TRUE")
            .bind(new_user.mobile)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if consumed == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, mobile, password_hash, name, gender, categories)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                      latitude, longitude, location_updated_at, created_at, updated_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.mobile)
        .bind(new_user.password_hash)
        .bind(new_user.name)
        .bind(new_user.gender)
        .bind(new_user.categories)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Applies a partial profile update and returns the new row.
    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_profile");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                photo = COALESCE($3, photo),
                gender = COALESCE($4, gender),
                instagram = COALESCE($5, instagram),
                categories = COALESCE($6, categories),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                      latitude, longitude, location_updated_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.photo.as_deref())
        .bind(changes.gender.as_deref())
        .bind(changes.instagram.as_deref())
        .bind(changes.categories.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replaces the category list.
    pub async fn update_categories(
        &self,
        id: Uuid,
        categories: &[String],
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_categories");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET categories = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                      latitude, longitude, location_updated_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(categories)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stores the user's last known position.
    pub async fn update_location(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_location");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET latitude = $2, longitude = $3, location_updated_at = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, mobile, password_hash, name, photo, gender, categories, instagram,
                      latitude, longitude, location_updated_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Case-insensitive substring search on name or Instagram handle.
    pub async fn search(
        &self,
        requester_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_users");
        let pattern = format!("%{}%", escape_like(query.trim()));
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT id, name, photo, instagram
            FROM users
            WHERE id <> $1
              AND (name ILIKE $2 ESCAPE '\' OR instagram ILIKE $2 ESCAPE '\')
            ORDER BY name ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(requester_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
