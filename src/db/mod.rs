pub mod models;
pub mod pool;
pub mod repository;
pub mod select;

pub use pool::{connect, health_check, migrate, DbError};
pub use repository::Page;
pub use select::{BindValue, ColumnKind, SqlQuery, Table};
