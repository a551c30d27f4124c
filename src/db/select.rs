// Renders a QueryPlan into parameterized SQL for one table.
//
// Filter values arrive as raw strings; this layer coerces them against the
// table's column types before binding. Only columns listed in the `Table`
// description are reachable from client input, so no identifier from the
// request ever lands in SQL text unquoted or unchecked.
use chrono::{DateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use uuid::Uuid;

use super::pool::DbError;
use crate::query::{Comparison, Condition, QueryPlan, SortDirection, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
    Bool,
    Uuid,
    Timestamp,
    TextArray,
}

/// Static description of a queryable table: name plus the columns clients
/// may reference in filters, projections and sorts.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
}

impl Table {
    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
    }
}

/// Typed bind parameter after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    BoolArray(Vec<bool>),
    UuidArray(Vec<Uuid>),
    TimestampArray(Vec<DateTime<Utc>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<BindValue>,
}

/// Page query: projected, filtered, ordered, windowed rows wrapped with
/// `row_to_json` so any projection comes back as ready-made JSON.
pub fn render_select(table: &Table, plan: &QueryPlan) -> Result<SqlQuery, DbError> {
    let projection = render_projection(table, &plan.selection);
    let (where_clause, params) = render_where(table, &plan.conditions)?;
    let order_clause = render_order(table, &plan.sort);

    let mut inner = format!("SELECT {} FROM \"{}\"", projection, table.name);
    if !where_clause.is_empty() {
        inner.push_str(" WHERE ");
        inner.push_str(&where_clause);
    }
    if !order_clause.is_empty() {
        inner.push(' ');
        inner.push_str(&order_clause);
    }
    inner.push_str(&format!(
        " LIMIT {} OFFSET {}",
        plan.window.limit,
        plan.window.skip()
    ));

    Ok(SqlQuery {
        sql: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner),
        params,
    })
}

/// Count query sharing the page query's WHERE clause, so the total always
/// reflects the applied filters.
pub fn render_count(table: &Table, plan: &QueryPlan) -> Result<SqlQuery, DbError> {
    let (where_clause, params) = render_where(table, &plan.conditions)?;
    let sql = if where_clause.is_empty() {
        format!("SELECT COUNT(*) AS count FROM \"{}\"", table.name)
    } else {
        format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
            table.name, where_clause
        )
    };
    Ok(SqlQuery { sql, params })
}

fn render_projection(table: &Table, selection: &[String]) -> String {
    let known: Vec<String> = selection
        .iter()
        .filter(|c| table.kind(c).is_some())
        .map(|c| format!("\"{}\"", c))
        .collect();
    if known.is_empty() {
        // The registry is the default projection, never `*`: columns a table
        // keeps out of its registry (the users password hash) must not leak
        // through row_to_json.
        table
            .columns
            .iter()
            .map(|(name, _)| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        known.join(", ")
    }
}

fn render_order(table: &Table, sort: &[SortKey]) -> String {
    let known: Vec<String> = sort
        .iter()
        .filter(|k| table.kind(&k.field).is_some())
        .map(|k| {
            // NULL ranks below every present value in both directions, so a
            // row missing an optional column (a bootcamp with no reviews yet)
            // never outranks a row that has one.
            let nulls = match k.direction {
                SortDirection::Asc => "NULLS FIRST",
                SortDirection::Desc => "NULLS LAST",
            };
            format!("\"{}\" {} {}", k.field, k.direction.to_sql(), nulls)
        })
        .collect();
    if known.is_empty() {
        String::new()
    } else {
        format!("ORDER BY {}", known.join(", "))
    }
}

fn render_where(
    table: &Table,
    conditions: &[Condition],
) -> Result<(String, Vec<BindValue>), DbError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<BindValue> = Vec::new();

    for condition in conditions {
        let Some(kind) = table.kind(&condition.field) else {
            // A field no row has matches nothing.
            clauses.push("FALSE".to_string());
            continue;
        };
        let column = format!("\"{}\"", condition.field);
        match condition.op {
            Comparison::In => {
                let values = list_values(condition)?;
                params.push(coerce_list(kind, &values, &condition.field)?);
                let n = params.len();
                if kind == ColumnKind::TextArray {
                    // Array column: match rows sharing at least one element.
                    clauses.push(format!("{} && ${}", column, n));
                } else {
                    clauses.push(format!("{} = ANY(${})", column, n));
                }
            }
            Comparison::Eq => {
                let raw = scalar_value(condition)?;
                if kind == ColumnKind::TextArray {
                    params.push(BindValue::Text(raw.to_string()));
                    clauses.push(format!("${} = ANY({})", params.len(), column));
                } else {
                    params.push(coerce_scalar(kind, raw, &condition.field)?);
                    clauses.push(format!("{} = ${}", column, params.len()));
                }
            }
            Comparison::Gt | Comparison::Gte | Comparison::Lt | Comparison::Lte => {
                if kind == ColumnKind::TextArray {
                    return Err(DbError::InvalidValue {
                        column: condition.field.clone(),
                    });
                }
                let raw = scalar_value(condition)?;
                params.push(coerce_scalar(kind, raw, &condition.field)?);
                let op = match condition.op {
                    Comparison::Gt => ">",
                    Comparison::Gte => ">=",
                    Comparison::Lt => "<",
                    _ => "<=",
                };
                clauses.push(format!("{} {} ${}", column, op, params.len()));
            }
        }
    }

    Ok((clauses.join(" AND "), params))
}

fn scalar_value(condition: &Condition) -> Result<&str, DbError> {
    match &condition.value {
        Value::String(s) => Ok(s),
        _ => Err(DbError::InvalidValue {
            column: condition.field.clone(),
        }),
    }
}

fn list_values(condition: &Condition) -> Result<Vec<String>, DbError> {
    match &condition.value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(DbError::InvalidValue {
                    column: condition.field.clone(),
                }),
            })
            .collect(),
        _ => Err(DbError::InvalidValue {
            column: condition.field.clone(),
        }),
    }
}

fn coerce_scalar(kind: ColumnKind, raw: &str, column: &str) -> Result<BindValue, DbError> {
    let invalid = || DbError::InvalidValue {
        column: column.to_string(),
    };
    match kind {
        ColumnKind::Text => Ok(BindValue::Text(raw.to_string())),
        ColumnKind::Int => raw.trim().parse().map(BindValue::Int).map_err(|_| invalid()),
        ColumnKind::Float => raw
            .trim()
            .parse()
            .map(BindValue::Float)
            .map_err(|_| invalid()),
        ColumnKind::Bool => raw
            .trim()
            .parse()
            .map(BindValue::Bool)
            .map_err(|_| invalid()),
        ColumnKind::Uuid => Uuid::parse_str(raw.trim())
            .map(BindValue::Uuid)
            .map_err(|_| invalid()),
        ColumnKind::Timestamp => parse_timestamp(raw).map(BindValue::Timestamp).ok_or_else(invalid),
        ColumnKind::TextArray => Ok(BindValue::Text(raw.to_string())),
    }
}

fn coerce_list(kind: ColumnKind, values: &[String], column: &str) -> Result<BindValue, DbError> {
    let invalid = || DbError::InvalidValue {
        column: column.to_string(),
    };
    match kind {
        ColumnKind::Text | ColumnKind::TextArray => Ok(BindValue::TextArray(values.to_vec())),
        ColumnKind::Int => values
            .iter()
            .map(|v| v.trim().parse().map_err(|_| invalid()))
            .collect::<Result<_, _>>()
            .map(BindValue::IntArray),
        ColumnKind::Float => values
            .iter()
            .map(|v| v.trim().parse().map_err(|_| invalid()))
            .collect::<Result<_, _>>()
            .map(BindValue::FloatArray),
        ColumnKind::Bool => values
            .iter()
            .map(|v| v.trim().parse().map_err(|_| invalid()))
            .collect::<Result<_, _>>()
            .map(BindValue::BoolArray),
        ColumnKind::Uuid => values
            .iter()
            .map(|v| Uuid::parse_str(v.trim()).map_err(|_| invalid()))
            .collect::<Result<_, _>>()
            .map(BindValue::UuidArray),
        ColumnKind::Timestamp => values
            .iter()
            .map(|v| parse_timestamp(v).ok_or_else(invalid))
            .collect::<Result<_, _>>()
            .map(BindValue::TimestampArray),
    }
}

/// RFC 3339, with a plain-date fallback read as midnight UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<chrono::NaiveDate>()
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

pub(crate) fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q BindValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        BindValue::Text(s) => q.bind(s),
        BindValue::Int(i) => q.bind(*i),
        BindValue::Float(f) => q.bind(*f),
        BindValue::Bool(b) => q.bind(*b),
        BindValue::Uuid(u) => q.bind(*u),
        BindValue::Timestamp(t) => q.bind(*t),
        BindValue::TextArray(v) => q.bind(v),
        BindValue::IntArray(v) => q.bind(v),
        BindValue::FloatArray(v) => q.bind(v),
        BindValue::BoolArray(v) => q.bind(v),
        BindValue::UuidArray(v) => q.bind(v),
        BindValue::TimestampArray(v) => q.bind(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryPlan;

    static FIXTURE: Table = Table {
        name: "listings",
        columns: &[
            ("id", ColumnKind::Uuid),
            ("name", ColumnKind::Text),
            ("tuition", ColumnKind::Float),
            ("seats", ColumnKind::Int),
            ("housing", ColumnKind::Bool),
            ("careers", ColumnKind::TextArray),
            ("rating", ColumnKind::Float),
            ("created_at", ColumnKind::Timestamp),
        ],
    };

    #[test]
    fn plain_listing_wraps_rows_and_windows() {
        let plan = QueryPlan::from_query("");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert_eq!(
            q.sql,
            "SELECT row_to_json(t) AS row FROM (SELECT \"id\", \"name\", \"tuition\", \
             \"seats\", \"housing\", \"careers\", \"rating\", \"created_at\" \
             FROM \"listings\" ORDER BY \"created_at\" DESC NULLS LAST LIMIT 10 OFFSET 0) t"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn sorts_rank_missing_values_lowest() {
        let plan = QueryPlan::from_query("sort=-rating,name");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q
            .sql
            .contains("ORDER BY \"rating\" DESC NULLS LAST, \"name\" ASC NULLS FIRST"));
    }

    #[test]
    fn default_user_listing_never_projects_the_password_hash() {
        use crate::db::models::user::USERS;

        for query in ["", "select=", "select=bogus", "role=publisher&sort=-created_at"] {
            let plan = QueryPlan::from_query(query);
            let q = render_select(&USERS, &plan).unwrap();
            assert!(
                !q.sql.contains("password_hash") && !q.sql.contains('*'),
                "hash reachable via {:?}: {}",
                query,
                q.sql
            );
        }
        let q = render_select(&USERS, &QueryPlan::from_query("")).unwrap();
        assert!(q.sql.contains("SELECT \"id\", \"name\", \"email\", \"role\", \"created_at\" FROM \"users\""));
    }

    #[test]
    fn projection_quotes_known_columns_only() {
        let plan = QueryPlan::from_query("select=name,tuition,bogus&sort=name");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q.sql.contains("SELECT \"name\", \"tuition\" FROM \"listings\""));
        assert!(q.sql.contains("ORDER BY \"name\" ASC"));
    }

    #[test]
    fn conditions_number_parameters_in_order() {
        let plan = QueryPlan::from_query("tuition[lte]=10000&housing=true&seats[gt]=5");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q
            .sql
            .contains("WHERE \"tuition\" <= $1 AND \"housing\" = $2 AND \"seats\" > $3"));
        assert_eq!(
            q.params,
            vec![
                BindValue::Float(10000.0),
                BindValue::Bool(true),
                BindValue::Int(5),
            ]
        );
    }

    #[test]
    fn unknown_field_matches_nothing() {
        let plan = QueryPlan::from_query("phantom=1&name=real");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q.sql.contains("WHERE FALSE AND \"name\" = $1"));
        assert_eq!(q.params, vec![BindValue::Text("real".to_string())]);
    }

    #[test]
    fn in_on_scalar_uses_any() {
        let plan = QueryPlan::from_query("seats[in]=5,10,15");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q.sql.contains("\"seats\" = ANY($1)"));
        assert_eq!(q.params, vec![BindValue::IntArray(vec![5, 10, 15])]);
    }

    #[test]
    fn in_on_array_column_uses_overlap() {
        let plan = QueryPlan::from_query("careers[in]=Business,Data+Science");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q.sql.contains("\"careers\" && $1"));
        assert_eq!(
            q.params,
            vec![BindValue::TextArray(vec![
                "Business".to_string(),
                "Data Science".to_string(),
            ])]
        );
    }

    #[test]
    fn equality_on_array_column_tests_membership() {
        let plan = QueryPlan::from_query("careers=Business");
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert!(q.sql.contains("$1 = ANY(\"careers\")"));
    }

    #[test]
    fn uncoercible_value_is_rejected() {
        let plan = QueryPlan::from_query("seats[gt]=lots");
        let err = render_select(&FIXTURE, &plan).unwrap_err();
        assert!(matches!(err, DbError::InvalidValue { column } if column == "seats"));
    }

    #[test]
    fn range_on_array_column_is_rejected() {
        let plan = QueryPlan::from_query("careers[gte]=Business");
        assert!(render_select(&FIXTURE, &plan).is_err());
    }

    #[test]
    fn count_shares_where_and_numbering() {
        let plan = QueryPlan::from_query("tuition[gte]=4000&housing=true&page=3&limit=2");
        let q = render_count(&FIXTURE, &plan).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) AS count FROM \"listings\" WHERE \"tuition\" >= $1 AND \"housing\" = $2"
        );
        assert_eq!(q.params.len(), 2);
        assert!(!q.sql.contains("LIMIT"));
    }

    #[test]
    fn timestamps_accept_dates_and_rfc3339() {
        let plan = QueryPlan::from_query("created_at[gte]=2024-01-15");
        let q = render_select(&FIXTURE, &plan).unwrap();
        match &q.params[0] {
            BindValue::Timestamp(t) => assert_eq!(t.to_rfc3339(), "2024-01-15T00:00:00+00:00"),
            other => panic!("expected timestamp, got {:?}", other),
        }

        let plan = QueryPlan::from_query("created_at[lt]=2024-01-15T10:30:00Z");
        assert!(render_select(&FIXTURE, &plan).is_ok());

        let plan = QueryPlan::from_query("created_at[lt]=not-a-date");
        assert!(render_select(&FIXTURE, &plan).is_err());
    }

    #[test]
    fn uuid_filters_coerce() {
        let id = Uuid::new_v4();
        let plan = QueryPlan::from_query(&format!("id={}", id));
        let q = render_select(&FIXTURE, &plan).unwrap();
        assert_eq!(q.params, vec![BindValue::Uuid(id)]);
    }
}
