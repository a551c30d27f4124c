use serde_json::Value;
use sqlx::{PgPool, Row};

use super::pool::DbError;
use super::select::{self, Table};
use crate::query::QueryPlan;

/// One page of dynamically-projected rows plus the filtered total.
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: i64,
}

/// Execute a query plan: count with the plan's filters, then fetch the
/// requested window as raw JSON rows.
pub async fn list(pool: &PgPool, table: &Table, plan: &QueryPlan) -> Result<Page, DbError> {
    let total = count(pool, table, plan).await?;

    let query = select::render_select(table, plan)?;
    let mut q = sqlx::query(&query.sql);
    for param in query.params.iter() {
        q = select::bind_value(q, param);
    }
    let raw_rows = q.fetch_all(pool).await?;

    let mut rows = Vec::with_capacity(raw_rows.len());
    for row in raw_rows {
        let value: Value = row.try_get("row")?;
        rows.push(value);
    }

    Ok(Page { rows, total })
}

pub async fn count(pool: &PgPool, table: &Table, plan: &QueryPlan) -> Result<i64, DbError> {
    let query = select::render_count(table, plan)?;
    let mut q = sqlx::query(&query.sql);
    for param in query.params.iter() {
        q = select::bind_value(q, param);
    }
    let row = q.fetch_one(pool).await?;
    let total: i64 = row.try_get("count")?;
    Ok(total)
}
