// seed.rs - fixture loading for local development and demos
//
// Fixture files are plain JSON arrays under a directory (fixtures/ by
// default). Cross-references between files are positional: a course's
// `bootcamp` field is the index of a bootcamp in bootcamps.json, not an
// id, since ids are minted by the database at insert time.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, AuthError};
use crate::authz::Role;
use crate::db::models::bootcamp::{Bootcamp, CreateBootcamp};
use crate::db::models::course::{Course, CreateCourse};
use crate::db::models::review::{CreateReview, Review};
use crate::db::models::user::User;
use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}[{index}] references a record that does not exist")]
    BadReference { file: String, index: usize },
    #[error("{file}[{index}] has unknown role {role:?}")]
    BadRole {
        file: String,
        index: usize,
        role: String,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

#[derive(Debug, Deserialize)]
struct UserFixture {
    name: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
    password: String,
}

#[derive(Debug, Deserialize)]
struct BootcampFixture {
    #[serde(flatten)]
    data: CreateBootcamp,
    owner: usize,
}

#[derive(Debug, Deserialize)]
struct CourseFixture {
    #[serde(flatten)]
    data: CreateCourse,
    bootcamp: usize,
    owner: usize,
}

#[derive(Debug, Deserialize)]
struct ReviewFixture {
    #[serde(flatten)]
    data: CreateReview,
    bootcamp: usize,
    owner: usize,
}

/// Loads every fixture file under `dir` into the database. Files that do
/// not exist are skipped, so a directory with only users.json seeds only
/// users. Addresses are stored as given; the seeder never geocodes.
pub async fn seed(pool: &PgPool, dir: &Path) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    let users: Vec<UserFixture> = load(dir, "users.json").await?;
    let mut user_ids: Vec<Uuid> = Vec::with_capacity(users.len());
    for (index, fixture) in users.iter().enumerate() {
        let role = match fixture.role.as_deref() {
            None => Role::User,
            Some(raw) => raw.parse().map_err(|_| SeedError::BadRole {
                file: "users.json".to_string(),
                index,
                role: raw.to_string(),
            })?,
        };
        let hash = hash_password(&fixture.password)?;
        let user = User::insert(pool, &fixture.name, &fixture.email, role, &hash).await?;
        user_ids.push(user.id);
    }
    report.users = user_ids.len();

    let bootcamps: Vec<BootcampFixture> = load(dir, "bootcamps.json").await?;
    let mut bootcamp_ids: Vec<Uuid> = Vec::with_capacity(bootcamps.len());
    for (index, fixture) in bootcamps.iter().enumerate() {
        let owner = resolve(&user_ids, fixture.owner, "bootcamps.json", index)?;
        let bootcamp = Bootcamp::insert(pool, owner, &fixture.data, None).await?;
        bootcamp_ids.push(bootcamp.id);
    }
    report.bootcamps = bootcamp_ids.len();

    let courses: Vec<CourseFixture> = load(dir, "courses.json").await?;
    for (index, fixture) in courses.iter().enumerate() {
        let bootcamp = resolve(&bootcamp_ids, fixture.bootcamp, "courses.json", index)?;
        let owner = resolve(&user_ids, fixture.owner, "courses.json", index)?;
        Course::insert(pool, bootcamp, owner, &fixture.data).await?;
        report.courses += 1;
    }

    let reviews: Vec<ReviewFixture> = load(dir, "reviews.json").await?;
    for (index, fixture) in reviews.iter().enumerate() {
        let bootcamp = resolve(&bootcamp_ids, fixture.bootcamp, "reviews.json", index)?;
        let owner = resolve(&user_ids, fixture.owner, "reviews.json", index)?;
        Review::insert(pool, bootcamp, owner, &fixture.data).await?;
        report.reviews += 1;
    }

    // Rollups once at the end rather than per insert.
    for id in &bootcamp_ids {
        Course::recompute_average_cost(pool, *id).await?;
        Review::recompute_average_rating(pool, *id).await?;
    }

    Ok(report)
}

/// Deletes every seeded row, children before parents.
pub async fn flush(pool: &PgPool) -> Result<(), SeedError> {
    for table in ["reviews", "courses", "bootcamps", "users", "inbound_emails"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await
            .map_err(DbError::from)?;
    }
    Ok(())
}

async fn load<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, SeedError> {
    let path = dir.join(file);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("fixture {} not found, skipping", path.display());
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(SeedError::Io {
                file: file.to_string(),
                source: err,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|err| SeedError::Parse {
        file: file.to_string(),
        source: err,
    })
}

fn resolve(ids: &[Uuid], index: usize, file: &str, at: usize) -> Result<Uuid, SeedError> {
    ids.get(index).copied().ok_or_else(|| SeedError::BadReference {
        file: file.to_string(),
        index: at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_references_are_positional() {
        let fixture: CourseFixture = serde_json::from_str(
            r#"{
                "title": "Full Stack Web Dev",
                "description": "Twelve weeks of everything",
                "weeks": 12,
                "tuition": 10000,
                "minimum_skill": "beginner",
                "bootcamp": 0,
                "owner": 1
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.bootcamp, 0);
        assert_eq!(fixture.owner, 1);
        assert_eq!(fixture.data.title, "Full Stack Web Dev");
    }

    #[test]
    fn out_of_range_references_are_reported() {
        let ids = vec![Uuid::new_v4()];
        let err = resolve(&ids, 3, "courses.json", 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "courses.json[7] references a record that does not exist"
        );
    }

    #[tokio::test]
    async fn missing_fixture_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let empty: Vec<UserFixture> = load(dir.path(), "users.json").await.unwrap();
        assert!(empty.is_empty());
    }
}
