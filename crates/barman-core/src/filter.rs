//! # Sale Filters & Report Shapes
//!
//! Filter, pagination, and summary types shared by the summary aggregator
//! and the query gateway.
//!
//! ## Single Source of Truth
//! The same `SaleFilter` value feeds both the paginated listing and the
//! summary totals of one query, so the two always describe the same logical
//! set of sales. Totals are recomputed from committed sales on every query -
//! never memoized.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Sale;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Named Periods
// =============================================================================

/// A named relative reporting window.
///
/// Resolved against a caller-supplied `now` so resolution stays a pure
/// function (the db layer passes `Utc::now()` at query time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Last24Hours,
    Last7Days,
    Last30Days,
}

impl Period {
    /// Returns the inclusive start of this window, counted back from `now`.
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Last24Hours => now - Duration::hours(24),
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => now - Duration::days(30),
        }
    }
}

// =============================================================================
// Sale Filter
// =============================================================================

/// Constraints for sale queries: date range, named period, and/or customer.
///
/// An empty filter matches every committed sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleFilter {
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
    /// Named relative window; only ever tightens the start bound.
    pub period: Option<Period>,
    /// Restrict to sales on this customer's tab.
    pub customer_id: Option<String>,
}

impl SaleFilter {
    /// Resolves the effective time window at query time.
    ///
    /// A named period is combined with an explicit `start` by taking the
    /// later of the two, so a period can only narrow the window.
    pub fn window(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let period_start = self.period.map(|p| p.start_from(now));
        let start = match (self.start, period_start) {
            (Some(explicit), Some(relative)) => Some(explicit.max(relative)),
            (explicit, relative) => explicit.or(relative),
        };
        (start, self.end)
    }

    /// Filter for a single customer, no time bounds.
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        SaleFilter {
            customer_id: Some(customer_id.into()),
            ..SaleFilter::default()
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A bounded page request (1-based page number).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    /// Creates a page request, clamping the size to `1..=MAX_PAGE_SIZE` and
    /// the page number to at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Page {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset for this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Row limit for this page.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, DEFAULT_PAGE_SIZE)
    }
}

// =============================================================================
// Summary & Page Results
// =============================================================================

/// Paid/pending totals over a filtered set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_done_kobo: i64,
    pub total_pending_kobo: i64,
}

impl SalesSummary {
    /// Paid total as Money.
    #[inline]
    pub fn total_done(&self) -> Money {
        Money::from_kobo(self.total_done_kobo)
    }

    /// Pending total as Money.
    #[inline]
    pub fn total_pending(&self) -> Money {
        Money::from_kobo(self.total_pending_kobo)
    }
}

/// One page of matching sales plus the totals for the *same* filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    /// Total number of sales matching the filter (not just this page).
    pub count: i64,
    pub summary: SalesSummary,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_period_start() {
        let now = at(1_000_000_000);
        assert_eq!(Period::Last24Hours.start_from(now), now - Duration::hours(24));
        assert_eq!(Period::Last7Days.start_from(now), now - Duration::days(7));
    }

    #[test]
    fn test_window_period_tightens_start() {
        let now = at(1_000_000_000);
        let filter = SaleFilter {
            start: Some(now - Duration::days(30)),
            end: None,
            period: Some(Period::Last7Days),
            customer_id: None,
        };
        let (start, end) = filter.window(now);
        assert_eq!(start, Some(now - Duration::days(7)));
        assert_eq!(end, None);

        // An explicit start inside the period wins instead.
        let filter = SaleFilter {
            start: Some(now - Duration::days(2)),
            period: Some(Period::Last7Days),
            ..SaleFilter::default()
        };
        let (start, _) = filter.window(now);
        assert_eq!(start, Some(now - Duration::days(2)));
    }

    #[test]
    fn test_empty_filter_window() {
        let (start, end) = SaleFilter::default().window(at(0));
        assert_eq!(start, None);
        assert_eq!(end, None);
    }

    #[test]
    fn test_page_clamping_and_offset() {
        let page = Page::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.offset(), 0);

        let page = Page::new(3, 5);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 5);

        let page = Page::new(1, 10_000);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_default_page_matches_sales_screen() {
        let page = Page::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }
}
