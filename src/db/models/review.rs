use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::pool::DbError;
use crate::db::select::{ColumnKind, Table};

pub static REVIEWS: Table = Table {
    name: "reviews",
    columns: &[
        ("id", ColumnKind::Uuid),
        ("title", ColumnKind::Text),
        ("text", ColumnKind::Text),
        ("rating", ColumnKind::Int),
        ("bootcamp_id", ColumnKind::Uuid),
        ("owner_id", ColumnKind::Uuid),
        ("created_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub bootcamp_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub title: String,
    pub text: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReview {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

impl Review {
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Review>, DbError> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(review)
    }

    /// The unique (bootcamp_id, owner_id) index enforces one review per
    /// user per bootcamp; violations surface as a duplicate-value conflict.
    pub async fn insert(
        pool: &PgPool,
        bootcamp_id: Uuid,
        owner_id: Uuid,
        data: &CreateReview,
    ) -> Result<Review, DbError> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (title, text, rating, bootcamp_id, owner_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&data.title)
        .bind(&data.text)
        .bind(data.rating)
        .bind(bootcamp_id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
        Ok(review)
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: &UpdateReview) -> Result<Review, DbError> {
        let review = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET title = COALESCE($2, title), text = COALESCE($3, text), \
             rating = COALESCE($4, rating) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.text)
        .bind(data.rating)
        .fetch_one(pool)
        .await?;
        Ok(review)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh the parent bootcamp's average rating after any review change.
    /// Deleting the last review resets the rating to 0 rather than leaving
    /// it NULL, so rating sorts keep unreviewed bootcamps at the bottom.
    pub async fn recompute_average_rating(
        pool: &PgPool,
        bootcamp_id: Uuid,
    ) -> Result<(), DbError> {
        sqlx::query(AVERAGE_RATING_UPDATE)
            .bind(bootcamp_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

const AVERAGE_RATING_UPDATE: &str = "UPDATE bootcamps SET average_rating = \
     (SELECT COALESCE(AVG(rating), 0)::float8 FROM reviews WHERE bootcamp_id = $1) \
     WHERE id = $1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_rollup_resets_to_zero_without_reviews() {
        // AVG over zero rows is NULL; the rollup must store 0 instead.
        assert!(AVERAGE_RATING_UPDATE.contains("COALESCE(AVG(rating), 0)"));
    }
}
