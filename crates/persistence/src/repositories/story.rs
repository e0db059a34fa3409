//! Story repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::services::BoundingBox;

use crate::entities::{FeedStoryEntity, NearbyCandidateEntity, StoryEntity, StoryWithFlagsEntity};
use crate::metrics::QueryTimer;

/// Input for creating a story.
#[derive(Debug, Clone)]
pub struct NewStory<'a> {
    pub user_id: Uuid,
    pub image: &'a str,
    pub location_name: Option<&'a str>,
    pub coordinates: Option<(f64, f64)>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for stories and their like/view rows.
#[derive(Clone)]
pub struct StoryRepository {
    pool: PgPool,
}

impl StoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a story. When coordinates are given the author's stored
    /// location is moved there in the same transaction.
    pub async fn create(&self, new_story: NewStory<'_>) -> Result<StoryEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_story");
        let (latitude, longitude) = match new_story.coordinates {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };

        let mut tx = self.pool.begin().await?;

        let story = sqlx::query_as::<_, StoryEntity>(
            r#"
            INSERT INTO stories (user_id, image, location_name, latitude, longitude, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, image, location_name, latitude, longitude,
                      likes_count, views_count, created_at, expires_at
            "#,
        )
        .bind(new_story.user_id)
        .bind(new_story.image)
        .bind(new_story.location_name)
        .bind(latitude)
        .bind(longitude)
        .bind(new_story.created_at)
        .bind(new_story.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some((lat, lon)) = new_story.coordinates {
            sqlx::query(
                r#"
                UPDATE users
                SET latitude = $2, longitude = $3, location_updated_at = $4, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(new_story.user_id)
            .bind(lat)
            .bind(lon)
            .bind(new_story.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(story)
    }

    /// Find a story that has not expired at `now`.
    pub async fn find_active(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<StoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_story");
        let result = sqlx::query_as::<_, StoryEntity>(
            r#"
            SELECT id, user_id, image, location_name, latitude, longitude,
                   likes_count, views_count, created_at, expires_at
            FROM stories
            WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Same as [`find_active`](Self::find_active) with the viewer's flags.
    pub async fn find_active_for_viewer(
        &self,
        id: Uuid,
        viewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<StoryWithFlagsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_story_for_viewer");
        let result = sqlx::query_as::<_, StoryWithFlagsEntity>(
            r#"
            SELECT s.id, s.user_id, s.image, s.location_name, s.latitude, s.longitude,
                   s.likes_count, s.views_count, s.created_at, s.expires_at,
                   EXISTS(SELECT 1 FROM story_likes l WHERE l.story_id = s.id AND l.user_id = $2) AS liked_by_me,
                   EXISTS(SELECT 1 FROM story_views v WHERE v.story_id = s.id AND v.user_id = $2) AS viewed_by_me
            FROM stories s
            WHERE s.id = $1 AND s.expires_at > $3
            "#,
        )
        .bind(id)
        .bind(viewer_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active stories of `user_id`, newest first, flagged for `viewer_id`.
    pub async fn list_active_by_user(
        &self,
        user_id: Uuid,
        viewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoryWithFlagsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_stories_by_user");
        let result = sqlx::query_as::<_, StoryWithFlagsEntity>(
            r#"
            SELECT s.id, s.user_id, s.image, s.location_name, s.latitude, s.longitude,
                   s.likes_count, s.views_count, s.created_at, s.expires_at,
                   EXISTS(SELECT 1 FROM story_likes l WHERE l.story_id = s.id AND l.user_id = $2) AS liked_by_me,
                   EXISTS(SELECT 1 FROM story_views v WHERE v.story_id = s.id AND v.user_id = $2) AS viewed_by_me
            FROM stories s
            WHERE s.user_id = $1 AND s.expires_at > $3
            ORDER BY s.created_at DESC, s.id ASC
            "#,
        )
        .bind(user_id)
        .bind(viewer_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_story");
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Adds a like and bumps the counter. Returns `None` when the user had
    /// already liked the story.
    pub async fn like(&self, story_id: Uuid, user_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
        let timer = QueryTimer::new("like_story");
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO story_likes (story_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (story_id, user_id) DO NOTHING
            "#,
        )
        .bind(story_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let likes = sqlx::query_scalar::<_, i32>(
            "UPDATE stories SET likes_count = likes_count + 1 WHERE id = $1 RETURNING likes_count",
        )
        .bind(story_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(likes))
    }

    /// Removes a like and decrements the counter, never below zero.
    /// Returns `None` when there was no like to remove.
    pub async fn unlike(&self, story_id: Uuid, user_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
        let timer = QueryTimer::new("unlike_story");
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM story_likes WHERE story_id = $1 AND user_id = $2")
            .bind(story_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let likes = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE stories SET likes_count = GREATEST(likes_count - 1, 0)
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(story_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(likes))
    }

    /// Records a view at most once per user. Returns whether this call
    /// counted and the resulting view total.
    pub async fn record_view(&self, story_id: Uuid, user_id: Uuid) -> Result<(bool, i32), sqlx::Error> {
        let timer = QueryTimer::new("record_story_view");
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO story_views (story_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (story_id, user_id) DO NOTHING
            "#,
        )
        .bind(story_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let views = if inserted > 0 {
            sqlx::query_scalar::<_, i32>(
                "UPDATE stories SET views_count = views_count + 1 WHERE id = $1 RETURNING views_count",
            )
            .bind(story_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar::<_, i32>("SELECT views_count FROM stories WHERE id = $1")
                .bind(story_id)
                .fetch_one(&mut *tx)
                .await?
        };

        tx.commit().await?;
        timer.record();
        Ok((inserted > 0, views))
    }

    /// Latest active story of every other user whose stored location lies
    /// inside `bbox`.
    pub async fn nearby_candidates(
        &self,
        bbox: &BoundingBox,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<NearbyCandidateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("nearby_story_candidates");
        let result = sqlx::query_as::<_, NearbyCandidateEntity>(
            r#"
            SELECT DISTINCT ON (s.user_id)
                   s.id, s.user_id, s.image, s.location_name, s.latitude, s.longitude,
                   s.likes_count, s.views_count, s.created_at, s.expires_at,
                   u.name AS author_name, u.photo AS author_photo, u.instagram AS author_instagram,
                   u.latitude AS author_latitude, u.longitude AS author_longitude
            FROM stories s
            JOIN users u ON u.id = s.user_id
            WHERE s.expires_at > $6
              AND u.id <> $5
              AND u.latitude IS NOT NULL AND u.longitude IS NOT NULL
              AND u.latitude BETWEEN $1 AND $2
              AND u.longitude BETWEEN $3 AND $4
            ORDER BY s.user_id, s.created_at DESC, s.id ASC
            "#,
        )
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lon)
        .bind(bbox.max_lon)
        .bind(requester_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active stories of everyone `follower_id` follows. Rows of one author
    /// are contiguous; authors are ordered by their newest story.
    pub async fn following_feed(
        &self,
        follower_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<FeedStoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("following_story_feed");
        let result = sqlx::query_as::<_, FeedStoryEntity>(
            r#"
            SELECT s.id, s.user_id, s.image, s.location_name, s.latitude, s.longitude,
                   s.likes_count, s.views_count, s.created_at, s.expires_at,
                   EXISTS(SELECT 1 FROM story_likes l WHERE l.story_id = s.id AND l.user_id = $1) AS liked_by_me,
                   EXISTS(SELECT 1 FROM story_views v WHERE v.story_id = s.id AND v.user_id = $1) AS viewed_by_me,
                   u.name AS author_name, u.photo AS author_photo, u.instagram AS author_instagram
            FROM follows f
            JOIN stories s ON s.user_id = f.following_id
            JOIN users u ON u.id = s.user_id
            WHERE f.follower_id = $1 AND s.expires_at > $2
            ORDER BY MAX(s.created_at) OVER (PARTITION BY s.user_id) DESC,
                     s.user_id ASC,
                     s.created_at DESC
            "#,
        )
        .bind(follower_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes every story expired at `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_stories");
        let result = sqlx::query("DELETE FROM stories WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
