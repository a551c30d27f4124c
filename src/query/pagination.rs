use serde::Serialize;

use super::plan::PageWindow;

/// Pointer to an adjacent result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// Adjacent-page envelope for list responses. Absent sides serialize away,
/// so page 1 of a short collection renders as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    /// `next` exists iff the window's end is before `total`; `prev` exists
    /// iff anything was skipped. Saturating arithmetic keeps absurd page
    /// numbers from panicking.
    pub fn compute(window: PageWindow, total: i64) -> Self {
        let skip = window.skip();
        let next = (skip.saturating_add(window.limit) < total).then(|| PageRef {
            page: window.page.saturating_add(1),
            limit: window.limit,
        });
        let prev = (skip > 0).then(|| PageRef {
            page: window.page - 1,
            limit: window.limit,
        });
        Self { next, prev }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window(page: i64, limit: i64) -> PageWindow {
        PageWindow { page, limit }
    }

    #[test]
    fn first_page_of_large_collection_has_only_next() {
        let p = Pagination::compute(window(1, 10), 25);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn last_page_has_only_prev() {
        let p = Pagination::compute(window(3, 10), 25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn single_page_collection_has_neither() {
        let p = Pagination::compute(window(1, 10), 10);
        assert_eq!(p, Pagination::default());
        assert_eq!(serde_json::to_value(p).unwrap(), json!({}));
    }

    #[test]
    fn empty_collection_has_neither() {
        let p = Pagination::compute(window(1, 10), 0);
        assert_eq!(p, Pagination::default());
    }

    #[test]
    fn boundary_skip_plus_limit_equal_total_drops_next() {
        // skip = 10, 10 + 10 = 20, not < 20
        let p = Pagination::compute(window(2, 10), 20);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 1, limit: 10 }));
    }

    #[test]
    fn middle_page_has_both_sides() {
        let p = Pagination::compute(window(2, 5), 12);
        assert_eq!(p.next, Some(PageRef { page: 3, limit: 5 }));
        assert_eq!(p.prev, Some(PageRef { page: 1, limit: 5 }));
        assert_eq!(
            serde_json::to_value(p).unwrap(),
            json!({"next": {"page": 3, "limit": 5}, "prev": {"page": 1, "limit": 5}})
        );
    }
}
