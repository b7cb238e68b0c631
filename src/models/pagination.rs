//! Page-number pagination shared by the location and user listings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Raw `?page=&perPage=` query.
///
/// Values are kept as strings so that garbage falls back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn per_page(&self) -> u64 {
        parse_positive(self.per_page.as_deref()).unwrap_or(DEFAULT_PER_PAGE)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u64)
}

/// The window actually served after counting and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub pages: u64,
    pub per_page: u64,
    pub count: u64,
}

impl PageWindow {
    /// `pages` is never below 1 and a requested page past the end is
    /// clamped to the last page.
    pub fn resolve(requested_page: u64, per_page: u64, count: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = count.div_ceil(per_page).max(1);
        let page = requested_page.clamp(1, pages);
        Self {
            page,
            pages,
            per_page,
            count,
        }
    }

    pub fn offset(&self) -> i64 {
        to_sql_int((self.page - 1).saturating_mul(self.per_page))
    }

    pub fn limit(&self) -> i64 {
        to_sql_int(self.per_page)
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            page: self.page,
            pages: self.pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Serialized listing envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub pages: u64,
    pub count: u64,
    pub per_page: u64,
}
