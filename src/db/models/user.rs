use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::authz::{Principal, Role};
use crate::db::pool::DbError;
use crate::db::select::{ColumnKind, Table};

/// Filterable surface of the users table. The password hash is deliberately
/// not listed, so clients can neither project nor filter on it.
pub static USERS: Table = Table {
    name: "users",
    columns: &[
        ("id", ColumnKind::Uuid),
        ("name", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("role", ColumnKind::Text),
        ("created_at", ColumnKind::Timestamp),
    ],
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Acting identity for authorization. Unknown role strings get the
    /// least-privileged role.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role.parse().unwrap_or(Role::User),
        }
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn insert(
        pool: &PgPool,
        name: &str,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, role, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(role.as_str())
        .bind(password_hash)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Partial update of profile fields; absent fields keep their value.
    pub async fn update_details(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Admin variant that may also reassign the role.
    pub async fn update_admin(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
    ) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             role = COALESCE($4, role) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role.map(|r| r.as_str()))
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
