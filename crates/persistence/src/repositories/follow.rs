//! Follow repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{FollowCountsEntity, FollowEntity, FollowStatusEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

/// Repository for follow edges.
#[derive(Clone)]
pub struct FollowRepository {
    pool: PgPool,
}

impl FollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the edge. Returns `None` when it already existed.
    pub async fn follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<Option<FollowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_follow");
        let result = sqlx::query_as::<_, FollowEntity>(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            RETURNING follower_id, following_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Removes the edge. Returns whether it existed.
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_follow");
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_following");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Relationship in both directions between `user_id` and `other_id`.
    pub async fn status(&self, user_id: Uuid, other_id: Uuid) -> Result<FollowStatusEntity, sqlx::Error> {
        let timer = QueryTimer::new("follow_status");
        let result = sqlx::query_as::<_, FollowStatusEntity>(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2) AS is_following,
                EXISTS(SELECT 1 FROM follows WHERE follower_id = $2 AND following_id = $1) AS is_followed_by
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn counts(&self, user_id: Uuid) -> Result<FollowCountsEntity, sqlx::Error> {
        let timer = QueryTimer::new("follow_counts");
        let result = sqlx::query_as::<_, FollowCountsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE following_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Users following `user_id`, most recent first.
    pub async fn list_followers(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_followers");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.name, u.photo, u.instagram
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC, u.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Users `user_id` follows, most recent first.
    pub async fn list_following(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_following");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.name, u.photo, u.instagram
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC, u.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
