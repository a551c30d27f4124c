use super::is_identifier;
use super::pagination::Pagination;
use super::request::{Condition, FilterRequest};
use crate::config::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Sort applied when the request carries no `sort` key at all.
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Page window with liberal parsing: anything that is not a positive integer
/// falls back to the defaults. `limit` has no ceiling unless
/// `QUERY_MAX_LIMIT` is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_LIMIT: i64 = 10;

    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(Self::DEFAULT_PAGE);
        let mut limit = parse_positive(limit).unwrap_or(Self::DEFAULT_LIMIT);
        if let Some(max) = config().query.max_limit {
            limit = limit.min(max);
        }
        Self { page, limit }
    }

    /// Rows to skip before this page. Saturating so absurd client numbers
    /// degrade instead of overflowing.
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
}

/// Storage-neutral description of one list query: what to match, which
/// columns to return, how to order, and which page to fetch.
///
/// Construction is infallible and side-effect free; the same query string
/// always yields the same plan. The storage layer renders it to SQL, and
/// `paginate` turns the resulting total into the response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub conditions: Vec<Condition>,
    pub selection: Vec<String>,
    pub sort: Vec<SortKey>,
    pub window: PageWindow,
}

impl QueryPlan {
    pub fn from_query(raw_query: &str) -> Self {
        Self::from_request(&FilterRequest::parse(raw_query))
    }

    pub fn from_request(request: &FilterRequest) -> Self {
        Self {
            conditions: request.conditions(),
            selection: parse_selection(request.control("select")),
            sort: parse_sort(request.control("sort")),
            window: PageWindow::parse(request.control("page"), request.control("limit")),
        }
    }

    pub fn paginate(&self, total: i64) -> Pagination {
        Pagination::compute(self.window, total)
    }
}

/// `select=name,email` in request order; empty means every column. Entries
/// that are not identifiers are dropped.
fn parse_selection(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(list) => list
            .split(',')
            .filter(|f| is_identifier(f))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// `sort=-rating,name`: leading `-` means descending. Only an *absent* key
/// gets the default; a present-but-unusable one sorts by nothing.
fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    match raw {
        Some(list) => list
            .split(',')
            .filter_map(|entry| {
                let (field, direction) = match entry.strip_prefix('-') {
                    Some(rest) => (rest, SortDirection::Desc),
                    None => (entry, SortDirection::Asc),
                };
                is_identifier(field).then(|| SortKey {
                    field: field.to_string(),
                    direction,
                })
            })
            .collect(),
        None => vec![SortKey {
            field: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Desc,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Comparison, PageRef};

    #[test]
    fn empty_query_uses_all_defaults() {
        let plan = QueryPlan::from_query("");
        assert!(plan.conditions.is_empty());
        assert!(plan.selection.is_empty());
        assert_eq!(
            plan.sort,
            vec![SortKey {
                field: "created_at".to_string(),
                direction: SortDirection::Desc,
            }]
        );
        assert_eq!(plan.window, PageWindow { page: 1, limit: 10 });
    }

    #[test]
    fn non_numeric_and_non_positive_paging_fall_back() {
        for raw in [
            "page=abc&limit=xyz",
            "page=0&limit=0",
            "page=-3&limit=-1",
            "page=&limit=",
            "page=2.5&limit=7.9",
        ] {
            let plan = QueryPlan::from_query(raw);
            assert_eq!(plan.window, PageWindow { page: 1, limit: 10 }, "input {raw:?}");
        }
    }

    #[test]
    fn explicit_paging_is_respected_without_a_ceiling() {
        let plan = QueryPlan::from_query("page=4&limit=500");
        assert_eq!(plan.window, PageWindow { page: 4, limit: 500 });
        assert_eq!(plan.window.skip(), 1500);
    }

    #[test]
    fn selection_preserves_order_and_drops_junk() {
        let plan = QueryPlan::from_query("select=name,email,,1bad,phone");
        assert_eq!(plan.selection, vec!["name", "email", "phone"]);
    }

    #[test]
    fn sort_parses_direction_prefix() {
        let plan = QueryPlan::from_query("sort=-rating,name");
        assert_eq!(
            plan.sort,
            vec![
                SortKey {
                    field: "rating".to_string(),
                    direction: SortDirection::Desc,
                },
                SortKey {
                    field: "name".to_string(),
                    direction: SortDirection::Asc,
                },
            ]
        );
    }

    #[test]
    fn present_but_unusable_sort_means_no_ordering() {
        let plan = QueryPlan::from_query("sort=");
        assert!(plan.sort.is_empty());
        let plan = QueryPlan::from_query("sort=-,9bad");
        assert!(plan.sort.is_empty());
    }

    #[test]
    fn identical_input_builds_identical_plans() {
        let raw = "careers[in]=Business,Data&averageCost[lte]=10000&select=name&sort=-rating&page=3&limit=2";
        assert_eq!(QueryPlan::from_query(raw), QueryPlan::from_query(raw));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let plan = QueryPlan::from_query(&format!("page={}&limit=10", i64::MAX));
        assert_eq!(plan.window.skip(), i64::MAX);
        let p = plan.paginate(5);
        assert!(p.next.is_none());
        assert!(p.prev.is_some());
    }

    #[test]
    fn listing_scenario_second_page_of_twelve() {
        let plan = QueryPlan::from_query("select=name&sort=-rating&page=2&limit=5");

        assert_eq!(plan.selection, vec!["name"]);
        assert_eq!(
            plan.sort,
            vec![SortKey {
                field: "rating".to_string(),
                direction: SortDirection::Desc,
            }]
        );
        assert_eq!(plan.window.skip(), 5);
        assert_eq!(plan.window.limit, 5);
        assert!(plan.conditions.is_empty());

        let pagination = plan.paginate(12);
        assert_eq!(pagination.prev, Some(PageRef { page: 1, limit: 5 }));
        assert_eq!(pagination.next, Some(PageRef { page: 3, limit: 5 }));
    }

    #[test]
    fn filters_and_controls_combine() {
        let plan = QueryPlan::from_query("housing=true&tuition[gte]=4000&page=2");
        assert_eq!(plan.conditions.len(), 2);
        assert_eq!(plan.conditions[1].op, Comparison::Gte);
        assert_eq!(plan.window.page, 2);
        assert_eq!(plan.window.limit, 10);
    }
}
