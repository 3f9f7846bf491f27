//! # Sale Batch Processor
//!
//! Commits a batch of sale lines as one atomic unit: every line lands or
//! none do, across both ledgers.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  submit(request)                                                    │
//! │     │                                                               │
//! │     ├── shape validation (no ledger reads)                          │
//! │     │                                                               │
//! │     └── attempt ──conflict──► attempt (once more) ──► EngineError   │
//! │            │                                                        │
//! │            ▼  BEGIN IMMEDIATE (via first write)                     │
//! │     fetch item snapshots ──► BatchPlan::build                       │
//! │            │                                                        │
//! │            ▼                                                        │
//! │     guarded stock decrements   ← serializes racing batches          │
//! │            │                                                        │
//! │            ▼                                                        │
//! │     fresh tab balance ──► check_credit_room   (pending + customer)  │
//! │            │                                                        │
//! │            ▼                                                        │
//! │     insert sale rows, COMMIT                                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Stock decrements come *before* the credit check. The decrements take the
//! database write lock, so the balance read that follows cannot be
//! interleaved with another batch's inserts: the credit decision always sees
//! the balance that will hold at commit. A rejection after the decrements
//! just rolls the transaction back; nothing was published.
//!
//! ## Retry
//! A write conflict (busy database, or a guarded decrement that matched
//! zero rows) aborts the attempt and restarts validation from scratch once.
//! The second attempt sees fresh snapshots; a second conflict surfaces as
//! [`EngineError::Conflict`] for the caller to retry.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::repository::customer::CustomerRepository;
use crate::repository::item::InventoryRepository;
use crate::repository::sale::SaleRepository;
use barman_core::{
    check_credit_room, validate_batch, BatchPlan, BatchReceipt, BatchRequest, CoreError,
    InventoryItem, PaymentStatus, Sale,
};

/// Commits sale batches atomically against the inventory and credit ledgers.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    pool: SqlitePool,
}

impl BatchProcessor {
    /// Creates a new BatchProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        BatchProcessor { pool }
    }

    /// Validates and commits a batch.
    ///
    /// ## Errors
    /// - [`EngineError::Rejected`] - shape, stock, unknown id, or credit
    ///   failure; no ledger was touched
    /// - [`EngineError::Conflict`] - concurrent writes defeated the built-in
    ///   retry; the identical request may be resubmitted
    pub async fn submit(&self, request: &BatchRequest) -> Result<BatchReceipt, EngineError> {
        validate_batch(request).map_err(CoreError::from)?;

        match self.attempt(request).await {
            Err(EngineError::Conflict) => {
                warn!(
                    lines = request.lines.len(),
                    "Batch hit a write conflict, retrying once"
                );
                self.attempt(request).await
            }
            outcome => outcome,
        }
    }

    /// One full validate-and-commit pass inside a single transaction.
    async fn attempt(&self, request: &BatchRequest) -> Result<BatchReceipt, EngineError> {
        let mut tx = self.pool.begin().await?;

        // Snapshot every distinct item the batch touches. Missing ids are
        // simply absent from the snapshot; the plan reports them precisely.
        let mut items: Vec<InventoryItem> = Vec::new();
        for line in &request.lines {
            if items.iter().any(|item| item.id == line.item_id) {
                continue;
            }
            if let Some(item) = InventoryRepository::fetch_tx(&mut *tx, &line.item_id).await? {
                items.push(item);
            }
        }

        let plan = BatchPlan::build(&request.lines, &items)?;

        // Reserve stock. The guarded decrements acquire the write lock, so
        // everything read after this point is stable until commit.
        for reservation in &plan.reservations {
            InventoryRepository::decrement_stock_tx(
                &mut *tx,
                &reservation.item_id,
                reservation.requested,
            )
            .await?;
        }

        // Credit check: only a pending batch on a tab consumes credit room.
        // An immediate cash payment (Done) skips it even for a named
        // customer, matching how a tab customer pays cash for a round.
        if let Some(customer_id) = &request.customer_id {
            let customer = CustomerRepository::fetch_tx(&mut *tx, customer_id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;

            if request.payment_status == PaymentStatus::Pending {
                let balance = CustomerRepository::tab_balance_tx(&mut *tx, customer_id).await?;
                check_credit_room(&customer, balance, plan.total())?;
            }
        }

        // One sale row per input line, all sharing a single commit instant.
        let now = Utc::now();
        let mut sale_ids = Vec::with_capacity(plan.lines.len());
        for planned in &plan.lines {
            let sale = Sale {
                id: Uuid::new_v4().to_string(),
                item_id: planned.item_id.clone(),
                item_name: planned.item_name.clone(),
                quantity: planned.quantity,
                unit_cost_kobo: planned.unit_cost_kobo,
                total_kobo: planned.total_kobo,
                customer_id: request.customer_id.clone(),
                payment_status: request.payment_status,
                recorded_by: request.recorded_by.clone(),
                created_at: now,
            };
            SaleRepository::insert_tx(&mut *tx, &sale).await?;
            sale_ids.push(sale.id);
        }

        tx.commit().await?;

        info!(
            sales = sale_ids.len(),
            total_kobo = plan.total_kobo,
            customer = request.customer_id.as_deref().unwrap_or("-"),
            "Batch committed"
        );
        debug!(ids = ?sale_ids, "Batch sale ids");

        Ok(BatchReceipt {
            sale_ids,
            total_kobo: plan.total_kobo,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use barman_core::{Customer, SaleFilter, SaleLine, ValidationError};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, name: &str, cost_kobo: i64, quantity: i64) -> String {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cost_kobo,
            quantity,
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

    fn line(item_id: &str, quantity: i64) -> SaleLine {
        SaleLine {
            item_id: item_id.to_string(),
            quantity,
        }
    }

    fn cash_batch(lines: Vec<SaleLine>) -> BatchRequest {
        BatchRequest {
            lines,
            customer_id: None,
            payment_status: PaymentStatus::Done,
            recorded_by: "staff-1".to_string(),
        }
    }

    fn tab_batch(lines: Vec<SaleLine>, customer_id: &str) -> BatchRequest {
        BatchRequest {
            lines,
            customer_id: Some(customer_id.to_string()),
            payment_status: PaymentStatus::Pending,
            recorded_by: "staff-1".to_string(),
        }
    }

    async fn quantity_of(db: &Database, item_id: &str) -> i64 {
        db.items().get_by_id(item_id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_cash_batch_commits_and_decrements() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 50, 10).await;
        let b = seed_item(&db, "Suya", 100, 10).await;

        let receipt = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 2), line(&b, 1)]))
            .await
            .unwrap();

        assert_eq!(receipt.sale_ids.len(), 2);
        assert_eq!(receipt.total_kobo, 200);
        assert_eq!(quantity_of(&db, &a).await, 8);
        assert_eq!(quantity_of(&db, &b).await, 9);

        // Receipt ids resolve, in line order, with frozen unit costs.
        let first = db.sales().get_by_id(&receipt.sale_ids[0]).await.unwrap().unwrap();
        assert_eq!(first.item_id, a);
        assert_eq!(first.unit_cost_kobo, 50);
        assert_eq!(first.total_kobo, 100);
        assert_eq!(first.payment_status, PaymentStatus::Done);
        assert_eq!(first.recorded_by, "staff-1");
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_batch() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 50, 10).await;
        let b = seed_item(&db, "Suya", 100, 2).await;

        let err = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 2), line(&b, 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));

        // Nothing moved: both stocks intact, no sales created.
        assert_eq!(quantity_of(&db, &a).await, 10);
        assert_eq!(quantity_of(&db, &b).await, 2);
        assert_eq!(db.sales().count(&SaleFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_item_lines_aggregate() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 5).await;

        // 3 + 4 = 7 > 5, rejected even though each line alone fits.
        let err = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 3), line(&a, 4)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InsufficientStock {
                available: 5,
                requested: 7,
                ..
            })
        ));

        // 2 + 3 = 5 fits exactly and stays two separate sales.
        let receipt = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 2), line(&a, 3)]))
            .await
            .unwrap();
        assert_eq!(receipt.sale_ids.len(), 2);
        assert_eq!(quantity_of(&db, &a).await, 0);
    }

    #[tokio::test]
    async fn test_tab_batch_enforces_credit_room() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 50).await;
        let ada = seed_customer(&db, "Ada", 1_000).await;
        let batches = db.batches();

        // Run the balance up to 800.
        batches.submit(&tab_batch(vec![line(&a, 8)], &ada)).await.unwrap();
        assert_eq!(db.customers().tab_balance(&ada).await.unwrap().kobo(), 800);

        // 800 + 300 > 1000: rejected with the limit that would have worked.
        let err = batches
            .submit(&tab_batch(vec![line(&a, 3)], &ada))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::TabLimitExceeded {
                balance_kobo: 800,
                limit_kobo: 1_000,
                required_limit_kobo: 1_100,
                ..
            })
        ));
        // Rejection released the reservation.
        assert_eq!(quantity_of(&db, &a).await, 42);

        // Raise the limit to exactly what was reported and resubmit.
        db.customers().update_limit(&ada, 1_100).await.unwrap();
        batches.submit(&tab_batch(vec![line(&a, 3)], &ada)).await.unwrap();
        assert_eq!(db.customers().tab_balance(&ada).await.unwrap().kobo(), 1_100);
        assert_eq!(quantity_of(&db, &a).await, 39);
    }

    #[tokio::test]
    async fn test_paid_batch_skips_credit_check() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 10).await;
        let broke = seed_customer(&db, "Emeka", 0).await;

        // A zero-limit customer can still pay cash for a round.
        let mut request = tab_batch(vec![line(&a, 5)], &broke);
        request.payment_status = PaymentStatus::Done;
        db.batches().submit(&request).await.unwrap();

        assert!(db.customers().tab_balance(&broke).await.unwrap().is_zero());
        assert_eq!(quantity_of(&db, &a).await, 5);
    }

    #[tokio::test]
    async fn test_unknown_item_and_customer_rejected() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 10).await;
        let batches = db.batches();

        let err = batches
            .submit(&cash_batch(vec![line("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::ItemNotFound(id)) if id == "ghost"
        ));

        let err = batches
            .submit(&tab_batch(vec![line(&a, 1)], "nobody"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::CustomerNotFound(id)) if id == "nobody"
        ));
        // The customer lookup failed after the decrement; rollback restored it.
        assert_eq!(quantity_of(&db, &a).await, 10);
    }

    #[tokio::test]
    async fn test_soft_deleted_item_cannot_be_sold() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 10).await;
        db.items().soft_delete(&a).await.unwrap();

        let err = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_shape_validation_runs_first() {
        let db = db().await;
        let batches = db.batches();

        let err = batches.submit(&cash_batch(vec![])).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::Validation(ValidationError::EmptyBatch))
        ));

        let err = batches
            .submit(&cash_batch(vec![line("a", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unit_cost_frozen_at_commit() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 50_000, 10).await;

        let receipt = db
            .batches()
            .submit(&cash_batch(vec![line(&a, 1)]))
            .await
            .unwrap();

        // Reprice the item afterward.
        let mut item = db.items().get_by_id(&a).await.unwrap().unwrap();
        item.cost_kobo = 60_000;
        db.items().update(&item).await.unwrap();

        let sale = db.sales().get_by_id(&receipt.sale_ids[0]).await.unwrap().unwrap();
        assert_eq!(sale.unit_cost_kobo, 50_000);
        assert_eq!(sale.total_kobo, 50_000);
    }

    #[tokio::test]
    async fn test_pending_without_customer_never_checks_credit() {
        let db = db().await;
        let a = seed_item(&db, "Star Lager", 100, 10).await;

        // Anonymous pending sale: allowed, counts against no tab.
        let mut request = cash_batch(vec![line(&a, 1)]);
        request.payment_status = PaymentStatus::Pending;
        let receipt = db.batches().submit(&request).await.unwrap();

        let sale = db.sales().get_by_id(&receipt.sale_ids[0]).await.unwrap().unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Pending);
        assert!(sale.customer_id.is_none());
        assert!(!sale.counts_against_tab());
    }
}
