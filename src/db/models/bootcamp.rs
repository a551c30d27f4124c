use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::pool::DbError;
use crate::db::select::{ColumnKind, Table};
use crate::geo::{GeoPoint, EARTH_RADIUS_MILES};

pub static BOOTCAMPS: Table = Table {
    name: "bootcamps",
    columns: &[
        ("id", ColumnKind::Uuid),
        ("name", ColumnKind::Text),
        ("slug", ColumnKind::Text),
        ("description", ColumnKind::Text),
        ("website", ColumnKind::Text),
        ("phone", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("address", ColumnKind::Text),
        ("latitude", ColumnKind::Float),
        ("longitude", ColumnKind::Float),
        ("careers", ColumnKind::TextArray),
        ("housing", ColumnKind::Bool),
        ("job_assistance", ColumnKind::Bool),
        ("job_guarantee", ColumnKind::Bool),
        ("accept_gi", ColumnKind::Bool),
        ("average_rating", ColumnKind::Float),
        ("average_cost", ColumnKind::Float),
        ("photo", ColumnKind::Text),
        ("owner_id", ColumnKind::Uuid),
        ("created_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bootcamp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub average_rating: Option<f64>,
    pub average_cost: Option<f64>,
    pub photo: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBootcamp {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBootcamp {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

/// URL-safe slug from a bootcamp name: lowercase, runs of anything
/// non-alphanumeric collapse to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

impl Bootcamp {
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Bootcamp>, DbError> {
        let bootcamp = sqlx::query_as::<_, Bootcamp>("SELECT * FROM bootcamps WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(bootcamp)
    }

    pub async fn insert(
        pool: &PgPool,
        owner_id: Uuid,
        data: &CreateBootcamp,
        point: Option<GeoPoint>,
    ) -> Result<Bootcamp, DbError> {
        let slug = slugify(&data.name);
        let bootcamp = sqlx::query_as::<_, Bootcamp>(
            "INSERT INTO bootcamps \
             (name, slug, description, website, phone, email, address, latitude, longitude, \
              careers, housing, job_assistance, job_guarantee, accept_gi, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(&data.name)
        .bind(&slug)
        .bind(&data.description)
        .bind(&data.website)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.address)
        .bind(point.map(|p| p.latitude))
        .bind(point.map(|p| p.longitude))
        .bind(&data.careers)
        .bind(data.housing)
        .bind(data.job_assistance)
        .bind(data.job_guarantee)
        .bind(data.accept_gi)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
        Ok(bootcamp)
    }

    /// Partial update; absent fields keep their value. The slug follows the
    /// name when the name changes. Coordinates are not touched here, an
    /// address change does not re-geocode.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: &UpdateBootcamp,
    ) -> Result<Bootcamp, DbError> {
        let slug = data.name.as_deref().map(slugify);
        let bootcamp = sqlx::query_as::<_, Bootcamp>(
            "UPDATE bootcamps SET \
             name = COALESCE($2, name), slug = COALESCE($3, slug), \
             description = COALESCE($4, description), website = COALESCE($5, website), \
             phone = COALESCE($6, phone), email = COALESCE($7, email), \
             address = COALESCE($8, address), careers = COALESCE($9, careers), \
             housing = COALESCE($10, housing), job_assistance = COALESCE($11, job_assistance), \
             job_guarantee = COALESCE($12, job_guarantee), accept_gi = COALESCE($13, accept_gi) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.name)
        .bind(&slug)
        .bind(&data.description)
        .bind(&data.website)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.address)
        .bind(&data.careers)
        .bind(data.housing)
        .bind(data.job_assistance)
        .bind(data.job_guarantee)
        .bind(data.accept_gi)
        .fetch_one(pool)
        .await?;
        Ok(bootcamp)
    }

    /// Courses and reviews go with it via FK cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Existence check backing the one-bootcamp-per-publisher rule.
    pub async fn owner_has_bootcamp(pool: &PgPool, owner_id: Uuid) -> Result<bool, DbError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bootcamps WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;
        Ok(count.0 > 0)
    }

    pub async fn set_photo(pool: &PgPool, id: Uuid, filename: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE bootcamps SET photo = $2 WHERE id = $1")
            .bind(id)
            .bind(filename)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Great-circle search around a point. Rows without coordinates are
    /// excluded; the acos argument is clamped against rounding drift.
    pub async fn within_radius(
        pool: &PgPool,
        center: GeoPoint,
        miles: f64,
    ) -> Result<Vec<Bootcamp>, DbError> {
        let bootcamps = sqlx::query_as::<_, Bootcamp>(
            "SELECT * FROM bootcamps \
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
             AND acos(least(1.0, greatest(-1.0, \
                 sin(radians($1)) * sin(radians(latitude)) + \
                 cos(radians($1)) * cos(radians(latitude)) * cos(radians(longitude - $2)) \
             ))) * $3 <= $4",
        )
        .bind(center.latitude)
        .bind(center.longitude)
        .bind(EARTH_RADIUS_MILES)
        .bind(miles)
        .fetch_all(pool)
        .await?;
        Ok(bootcamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_collapse_punctuation_and_case() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("ModernTech -- 2024!"), "moderntech-2024");
        assert_eq!(slugify("  Codemasters  "), "codemasters");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn create_payload_defaults_optional_fields() {
        let data: CreateBootcamp = serde_json::from_value(serde_json::json!({
            "name": "Devworks",
            "description": "Full stack in 12 weeks",
        }))
        .unwrap();
        assert!(data.careers.is_empty());
        assert!(!data.housing);
        assert!(data.website.is_none());
    }
}
