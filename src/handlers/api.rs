use serde::{Deserialize, Serialize};

/// Paginated list response for API endpoints.
#[derive(Serialize, Debug)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// `page` / `per_page` query parameters shared by list endpoints.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(25).clamp(1, 100)
    }
}

/// Cut one page out of an already-filtered list.
pub fn paginate<T, U, F>(items: Vec<T>, query: PageQuery, map: F) -> PaginatedResponse<U>
where
    U: Serialize,
    F: FnMut(T) -> U,
{
    let page = query.page();
    let per_page = query.per_page();
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let offset = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
    let take = usize::try_from(per_page).unwrap_or(100);
    let items = items.into_iter().skip(offset).take(take).map(map).collect();
    PaginatedResponse {
        items,
        page,
        per_page,
        total,
    }
}

/// Optional remarks carried by reject / return / override calls.
#[derive(Deserialize, Debug, Default)]
pub struct RemarksBody {
    pub remarks: Option<String>,
}
