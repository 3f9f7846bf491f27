//! # Sale Repository
//!
//! Committed sales: payment status transitions, customer allocation,
//! summary totals, and paginated search.
//!
//! ## One Filter, Two Answers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   SaleFilter (dates, period, customer)                              │
//! │        │                                                            │
//! │        ├──► list     LIMIT/OFFSET page of matching sales            │
//! │        ├──► count    total matching rows                            │
//! │        └──► summarize paid/pending totals over ALL matching rows    │
//! │                                                                     │
//! │   search() runs all three with the same filter and the same `now`, │
//! │   so the page, the count, and the totals describe one logical set.  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Summary totals are recomputed by SQL aggregation on every call. With a
//! handful of staff terminals over SQLite this is cheap, and it can never
//! drift the way an incrementally-maintained counter can.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult, EngineError};
use crate::repository::customer::CustomerRepository;
use barman_core::{
    check_credit_room, CoreError, Money, Page, PaymentStatus, Sale, SaleFilter, SalePage,
    SalesSummary,
};

const SALE_COLUMNS: &str = "id, item_id, item_name, quantity, unit_cost_kobo, total_kobo, \
                            customer_id, payment_status, recorded_by, created_at";

/// Repository for committed sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Sets a sale's payment status.
    ///
    /// Both directions are allowed and setting the current status again is a
    /// no-op success. Flipping back to pending is a payment-tracking
    /// correction: it restores the amount to the customer's tab (by virtue of
    /// the derived balance) but never re-checks the limit and never touches
    /// inventory. The balance may legitimately sit above the limit afterward.
    pub async fn set_payment_status(&self, sale_id: &str, status: PaymentStatus) -> DbResult<()> {
        debug!(id = %sale_id, status = ?status, "Setting payment status");

        let result = sqlx::query("UPDATE sales SET payment_status = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        // SQLite counts a same-value UPDATE as affected, so zero rows can
        // only mean the sale does not exist.
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    /// Moves a sale onto a customer's tab after the fact.
    ///
    /// Covers the walk-in who opens a tab mid-evening, or a sale rung up on
    /// the wrong tab. If the sale is pending, the target customer's credit
    /// room is checked inside the same transaction that reassigns it; a paid
    /// sale moves freely since it never counts against a tab.
    ///
    /// Like a batch commit, a write conflict restarts the whole decision
    /// once against fresh state before surfacing to the caller.
    pub async fn allocate_to_customer(
        &self,
        sale_id: &str,
        customer_id: &str,
    ) -> Result<(), EngineError> {
        match self.try_allocate(sale_id, customer_id).await {
            Err(EngineError::Conflict) => {
                warn!(
                    sale = %sale_id,
                    "Allocation hit a write conflict, retrying once"
                );
                self.try_allocate(sale_id, customer_id).await
            }
            outcome => outcome,
        }
    }

    async fn try_allocate(&self, sale_id: &str, customer_id: &str) -> Result<(), EngineError> {
        debug!(sale = %sale_id, customer = %customer_id, "Allocating sale to customer");

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| EngineError::Db(DbError::not_found("Sale", sale_id)))?;

        let customer = CustomerRepository::fetch_tx(&mut *tx, customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

        if sale.payment_status == PaymentStatus::Pending {
            // Exclude the sale itself so re-allocating to the same tab
            // doesn't count it twice.
            let balance: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(total_kobo), 0) FROM sales \
                 WHERE customer_id = ?1 AND payment_status = 'pending' AND id != ?2",
            )
            .bind(customer_id)
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;

            check_credit_room(&customer, Money::from_kobo(balance), sale.total())?;
        }

        sqlx::query("UPDATE sales SET customer_id = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Paid/pending totals over every sale matching the filter.
    pub async fn summarize(&self, filter: &SaleFilter) -> DbResult<SalesSummary> {
        self.summarize_at(filter, Utc::now()).await
    }

    /// One page of matching sales, newest first.
    pub async fn list(&self, filter: &SaleFilter, page: Page) -> DbResult<Vec<Sale>> {
        self.list_at(filter, page, Utc::now()).await
    }

    /// Number of sales matching the filter.
    pub async fn count(&self, filter: &SaleFilter) -> DbResult<i64> {
        self.count_at(filter, Utc::now()).await
    }

    /// One page of sales plus the count and summary for the same filter,
    /// all resolved against a single `now` so named periods agree.
    pub async fn search(&self, filter: &SaleFilter, page: Page) -> DbResult<SalePage> {
        let now = Utc::now();

        let sales = self.list_at(filter, page, now).await?;
        let count = self.count_at(filter, now).await?;
        let summary = self.summarize_at(filter, now).await?;

        Ok(SalePage {
            sales,
            count,
            summary,
        })
    }

    async fn summarize_at(&self, filter: &SaleFilter, now: DateTime<Utc>) -> DbResult<SalesSummary> {
        let mut query = QueryBuilder::new(
            "SELECT \
             COALESCE(SUM(CASE WHEN payment_status = 'done' THEN total_kobo ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN payment_status = 'pending' THEN total_kobo ELSE 0 END), 0) \
             FROM sales",
        );
        push_filter(&mut query, filter, now);

        let (total_done_kobo, total_pending_kobo): (i64, i64) =
            query.build_query_as().fetch_one(&self.pool).await?;

        Ok(SalesSummary {
            total_done_kobo,
            total_pending_kobo,
        })
    }

    async fn list_at(
        &self,
        filter: &SaleFilter,
        page: Page,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let mut query = QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        push_filter(&mut query, filter, now);

        // Secondary key on id keeps the order total when timestamps collide
        // (batch lines share one created_at).
        query.push(" ORDER BY created_at DESC, id DESC");
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let sales = query
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    async fn count_at(&self, filter: &SaleFilter, now: DateTime<Utc>) -> DbResult<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM sales");
        push_filter(&mut query, filter, now);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations (used by the batch engine)
    // =========================================================================

    /// Inserts one sale row inside an open transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sales \
             (id, item_id, item_name, quantity, unit_cost_kobo, total_kobo, \
              customer_id, payment_status, recorded_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&sale.id)
        .bind(&sale.item_id)
        .bind(&sale.item_name)
        .bind(sale.quantity)
        .bind(sale.unit_cost_kobo)
        .bind(sale.total_kobo)
        .bind(&sale.customer_id)
        .bind(sale.payment_status)
        .bind(&sale.recorded_by)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}

/// Appends WHERE clauses for the filter's resolved window and customer.
fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter, now: DateTime<Utc>) {
    let (start, end) = filter.window(now);

    query.push(" WHERE 1 = 1");
    if let Some(start) = start {
        query.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = end {
        query.push(" AND created_at <= ").push_bind(end);
    }
    if let Some(customer_id) = &filter.customer_id {
        query.push(" AND customer_id = ").push_bind(customer_id.clone());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use barman_core::{Customer, InventoryItem, Period};
    use chrono::Duration;
    use uuid::Uuid;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, name: &str, cost_kobo: i64) -> String {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cost_kobo,
            quantity: 100,
            low_stock_threshold: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.items().insert(&item).await.unwrap();
        item.id
    }

    async fn seed_customer(db: &Database, name: &str, limit_kobo: i64) -> String {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone_number: None,
            tab_limit_kobo: limit_kobo,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await.unwrap();
        customer.id
    }

    async fn seed_sale(
        db: &Database,
        item_id: &str,
        total_kobo: i64,
        customer_id: Option<&str>,
        status: PaymentStatus,
        created_at: DateTime<Utc>,
    ) -> String {
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            item_name: "Star Lager".to_string(),
            quantity: 1,
            unit_cost_kobo: total_kobo,
            total_kobo,
            customer_id: customer_id.map(str::to_string),
            payment_status: status,
            recorded_by: "staff-1".to_string(),
            created_at,
        };
        let mut conn = db.pool().acquire().await.unwrap();
        SaleRepository::insert_tx(&mut conn, &sale).await.unwrap();
        sale.id
    }

    #[tokio::test]
    async fn test_payment_status_flips_are_idempotent() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let sale_id =
            seed_sale(&db, &item_id, 50_000, None, PaymentStatus::Pending, Utc::now()).await;
        let repo = db.sales();

        repo.set_payment_status(&sale_id, PaymentStatus::Done)
            .await
            .unwrap();
        // Same status again: no-op success.
        repo.set_payment_status(&sale_id, PaymentStatus::Done)
            .await
            .unwrap();

        let sale = repo.get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Done);

        // Correction back to pending is allowed.
        repo.set_payment_status(&sale_id, PaymentStatus::Pending)
            .await
            .unwrap();
        let sale = repo.get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Pending);

        assert!(matches!(
            repo.set_payment_status("missing", PaymentStatus::Done).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_flip_moves_summary_buckets() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let sale_id =
            seed_sale(&db, &item_id, 50_000, None, PaymentStatus::Pending, Utc::now()).await;
        seed_sale(&db, &item_id, 30_000, None, PaymentStatus::Done, Utc::now()).await;
        let repo = db.sales();

        let summary = repo.summarize(&SaleFilter::default()).await.unwrap();
        assert_eq!(summary.total_pending_kobo, 50_000);
        assert_eq!(summary.total_done_kobo, 30_000);

        repo.set_payment_status(&sale_id, PaymentStatus::Done)
            .await
            .unwrap();
        let summary = repo.summarize(&SaleFilter::default()).await.unwrap();
        assert_eq!(summary.total_pending_kobo, 0);
        assert_eq!(summary.total_done_kobo, 80_000);

        // Flip back restores the original split exactly.
        repo.set_payment_status(&sale_id, PaymentStatus::Pending)
            .await
            .unwrap();
        let summary = repo.summarize(&SaleFilter::default()).await.unwrap();
        assert_eq!(summary.total_pending_kobo, 50_000);
        assert_eq!(summary.total_done_kobo, 30_000);
    }

    #[tokio::test]
    async fn test_filters_by_customer_and_period() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let ada = seed_customer(&db, "Ada", 1_000_000).await;
        let now = Utc::now();

        seed_sale(&db, &item_id, 10_000, Some(&ada), PaymentStatus::Pending, now).await;
        seed_sale(&db, &item_id, 20_000, None, PaymentStatus::Done, now).await;
        // Outside the 24-hour window.
        seed_sale(
            &db,
            &item_id,
            40_000,
            Some(&ada),
            PaymentStatus::Pending,
            now - Duration::days(2),
        )
        .await;

        let repo = db.sales();

        let by_customer = repo.summarize(&SaleFilter::for_customer(&ada)).await.unwrap();
        assert_eq!(by_customer.total_pending_kobo, 50_000);
        assert_eq!(by_customer.total_done_kobo, 0);

        let recent = SaleFilter {
            period: Some(Period::Last24Hours),
            ..SaleFilter::default()
        };
        let summary = repo.summarize(&recent).await.unwrap();
        assert_eq!(summary.total_pending_kobo, 10_000);
        assert_eq!(summary.total_done_kobo, 20_000);
        assert_eq!(repo.count(&recent).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_pages_newest_first() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let base = Utc::now() - Duration::hours(1);

        for i in 0..7 {
            seed_sale(
                &db,
                &item_id,
                1_000 * (i + 1),
                None,
                PaymentStatus::Done,
                base + Duration::minutes(i),
            )
            .await;
        }

        let repo = db.sales();
        let filter = SaleFilter::default();

        let first = repo.search(&filter, Page::new(1, 5)).await.unwrap();
        assert_eq!(first.count, 7);
        assert_eq!(first.sales.len(), 5);
        // Newest (largest total, minted last) comes first.
        assert_eq!(first.sales[0].total_kobo, 7_000);

        let second = repo.search(&filter, Page::new(2, 5)).await.unwrap();
        assert_eq!(second.count, 7);
        assert_eq!(second.sales.len(), 2);
        assert_eq!(second.sales[1].total_kobo, 1_000);

        // The page's summary covers all matches, not just the page.
        assert_eq!(
            first.summary.total_done_kobo,
            (1..=7).map(|i| i * 1_000).sum::<i64>()
        );
        assert_eq!(first.summary, second.summary);
    }

    #[tokio::test]
    async fn test_allocate_pending_sale_checks_credit() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let ada = seed_customer(&db, "Ada", 100_000).await;
        let sale_id =
            seed_sale(&db, &item_id, 80_000, None, PaymentStatus::Pending, Utc::now()).await;
        let over =
            seed_sale(&db, &item_id, 30_000, None, PaymentStatus::Pending, Utc::now()).await;
        let repo = db.sales();

        repo.allocate_to_customer(&sale_id, &ada).await.unwrap();
        let sale = repo.get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some(ada.as_str()));
        assert_eq!(db.customers().tab_balance(&ada).await.unwrap().kobo(), 80_000);

        // 80k on the tab + 30k sale > 100k limit.
        let err = repo.allocate_to_customer(&over, &ada).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::TabLimitExceeded {
                required_limit_kobo: 110_000,
                ..
            })
        ));

        // Re-allocating to the same tab doesn't double-count the sale.
        repo.allocate_to_customer(&sale_id, &ada).await.unwrap();
    }

    #[tokio::test]
    async fn test_allocate_paid_sale_skips_credit_check() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let broke = seed_customer(&db, "Emeka", 0).await;
        let sale_id =
            seed_sale(&db, &item_id, 80_000, None, PaymentStatus::Done, Utc::now()).await;
        let repo = db.sales();

        repo.allocate_to_customer(&sale_id, &broke).await.unwrap();
        assert!(db.customers().tab_balance(&broke).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_allocate_unknown_sale_or_customer() {
        let db = db().await;
        let item_id = seed_item(&db, "Star Lager", 50_000).await;
        let ada = seed_customer(&db, "Ada", 100_000).await;
        let sale_id =
            seed_sale(&db, &item_id, 10_000, None, PaymentStatus::Pending, Utc::now()).await;
        let repo = db.sales();

        assert!(matches!(
            repo.allocate_to_customer("missing", &ada).await.unwrap_err(),
            EngineError::Db(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.allocate_to_customer(&sale_id, "missing").await.unwrap_err(),
            EngineError::Rejected(CoreError::CustomerNotFound(_))
        ));
    }
}
