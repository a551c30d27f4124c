// Query translation: raw query-string parameters -> storage-neutral query plan.
//
// List endpoints hand their raw query string to `QueryPlan::from_query`, fetch
// a page through the storage layer, then attach `QueryPlan::paginate(total)`
// to the response envelope. Parsing is liberal: malformed pagination input
// falls back to defaults and unusable filter pairs are dropped, never errors.
pub mod pagination;
pub mod plan;
pub mod request;

pub use pagination::{PageRef, Pagination};
pub use plan::{PageWindow, QueryPlan, SortDirection, SortKey};
pub use request::{Comparison, Condition, FilterRequest};

/// Column-safe identifier check shared by field, selection and sort parsing.
/// Anything else is dropped before it can reach a SQL fragment.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("average_cost"));
        assert!(is_identifier("_hidden"));
        assert!(is_identifier("a1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("name; DROP TABLE users"));
        assert!(!is_identifier("na-me"));
    }
}
