use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::pool::DbError;
use crate::db::select::{ColumnKind, Table};

pub static COURSES: Table = Table {
    name: "courses",
    columns: &[
        ("id", ColumnKind::Uuid),
        ("title", ColumnKind::Text),
        ("description", ColumnKind::Text),
        ("weeks", ColumnKind::Int),
        ("tuition", ColumnKind::Float),
        ("minimum_skill", ColumnKind::Text),
        ("scholarship_available", ColumnKind::Bool),
        ("bootcamp_id", ColumnKind::Uuid),
        ("owner_id", ColumnKind::Uuid),
        ("created_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: String,
    pub scholarship_available: bool,
    pub bootcamp_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: String,
    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<i32>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<String>,
    pub scholarship_available: Option<bool>,
}

impl Course {
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Course>, DbError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(course)
    }

    pub async fn insert(
        pool: &PgPool,
        bootcamp_id: Uuid,
        owner_id: Uuid,
        data: &CreateCourse,
    ) -> Result<Course, DbError> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses \
             (title, description, weeks, tuition, minimum_skill, scholarship_available, \
              bootcamp_id, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.weeks)
        .bind(data.tuition)
        .bind(&data.minimum_skill)
        .bind(data.scholarship_available)
        .bind(bootcamp_id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
        Ok(course)
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: &UpdateCourse) -> Result<Course, DbError> {
        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET \
             title = COALESCE($2, title), description = COALESCE($3, description), \
             weeks = COALESCE($4, weeks), tuition = COALESCE($5, tuition), \
             minimum_skill = COALESCE($6, minimum_skill), \
             scholarship_available = COALESCE($7, scholarship_available) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.weeks)
        .bind(data.tuition)
        .bind(&data.minimum_skill)
        .bind(data.scholarship_available)
        .fetch_one(pool)
        .await?;
        Ok(course)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh the parent bootcamp's average cost after any course change.
    /// Rounded up to the nearest ten; NULL again once no courses remain.
    pub async fn recompute_average_cost(pool: &PgPool, bootcamp_id: Uuid) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE bootcamps SET average_cost = \
             (SELECT (CEIL(AVG(tuition) / 10) * 10)::float8 FROM courses WHERE bootcamp_id = $1) \
             WHERE id = $1",
        )
        .bind(bootcamp_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
