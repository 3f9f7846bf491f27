//! # Inventory Repository
//!
//! Database operations for the inventory ledger.
//!
//! ## Reservation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  How a Batch Touches Stock                          │
//! │                                                                     │
//! │  reserve   = BatchPlan stock check against a snapshot fetched       │
//! │              inside the batch transaction (barman-core)             │
//! │  commit    = decrement_stock_tx: guarded UPDATE inside the same     │
//! │              transaction (quantity = quantity - n ... AND           │
//! │              quantity >= n)                                         │
//! │  release   = transaction rollback (nothing to undo)                 │
//! │                                                                     │
//! │  The guard means two batches racing for the last units can never    │
//! │  both decrement: the loser matches zero rows and the engine         │
//! │  restarts validation.                                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, EngineError};
use barman_core::validation::{
    validate_kobo_amount, validate_name, validate_restock_delta, validate_stock_level,
};
use barman_core::{CoreError, InventoryItem};

const ITEM_COLUMNS: &str =
    "id, name, cost_kobo, quantity, low_stock_threshold, is_active, created_at, updated_at";

/// Repository for inventory ledger operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets an item by its ID (active or soft-deleted).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_tx(&mut conn, id).await
    }

    /// Lists active items, sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists active items at or below their low-stock threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE is_active = 1 AND quantity <= low_stock_threshold \
             ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new item.
    ///
    /// Input is validated before any SQL runs, so a malformed name or a
    /// negative cost/stock comes back as a rejection rather than a CHECK
    /// constraint failure from the database.
    pub async fn insert(&self, item: &InventoryItem) -> Result<(), EngineError> {
        validate_name(&item.name).map_err(CoreError::from)?;
        validate_kobo_amount("cost_kobo", item.cost_kobo).map_err(CoreError::from)?;
        validate_stock_level(item.quantity).map_err(CoreError::from)?;

        debug!(id = %item.id, name = %item.name, "Inserting inventory item");

        sqlx::query(
            "INSERT INTO inventory_items \
             (id, name, cost_kobo, quantity, low_stock_threshold, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.cost_kobo)
        .bind(item.quantity)
        .bind(item.low_stock_threshold)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an item's catalog fields (name, cost, threshold).
    ///
    /// Stock moves through `restock` and committed batches, never here.
    /// Historical sales keep their frozen unit cost regardless of cost
    /// edits made here.
    pub async fn update(&self, item: &InventoryItem) -> Result<(), EngineError> {
        validate_name(&item.name).map_err(CoreError::from)?;
        validate_kobo_amount("cost_kobo", item.cost_kobo).map_err(CoreError::from)?;

        debug!(id = %item.id, "Updating inventory item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_items SET \
             name = ?2, cost_kobo = ?3, low_stock_threshold = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.cost_kobo)
        .bind(item.low_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id).into());
        }

        Ok(())
    }

    /// Adds stock (delivery/restock). A non-positive `delta` is a
    /// validation rejection.
    pub async fn restock(&self, id: &str, delta: i64) -> Result<(), EngineError> {
        validate_restock_delta(delta).map_err(CoreError::from)?;

        debug!(id = %id, delta = %delta, "Restocking item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_items SET quantity = quantity + ?2, updated_at = ?3 \
             WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id).into());
        }

        Ok(())
    }

    /// Soft-deletes an item by setting is_active = false.
    ///
    /// Historical sales still reference the row, so it is never removed
    /// physically.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting item");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE inventory_items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    // =========================================================================
    // Transaction-scoped operations (used by the batch engine)
    // =========================================================================

    /// Fetches one item inside an open transaction.
    pub async fn fetch_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(item)
    }

    /// Commits one reservation: a guarded decrement inside the batch
    /// transaction.
    ///
    /// Zero rows affected means the snapshot the plan was built on has
    /// moved underneath us; reported as a write conflict so the engine
    /// restarts validation instead of partially applying.
    pub async fn decrement_stock_tx(
        conn: &mut SqliteConnection,
        item_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_items SET quantity = quantity - ?2, updated_at = ?3 \
             WHERE id = ?1 AND is_active = 1 AND quantity >= ?2",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::WriteConflict(format!(
                "stock changed under batch for item {item_id}"
            )));
        }

        Ok(())
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
