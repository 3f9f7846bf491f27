//! # Batch Planning
//!
//! Pure planning math for the sale batch processor: per-item aggregation,
//! the stock check, frozen-cost line totals, and the credit-room check.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              Batch Commit (barman-db::batch)                        │
//! │                                                                     │
//! │   BEGIN TRANSACTION                                                 │
//! │        │                                                            │
//! │        ▼                                                            │
//! │   fetch item snapshots ──► BatchPlan::build(..)  ← THIS MODULE     │
//! │        │                        │                                   │
//! │        │                        ├── aggregate lines per item        │
//! │        │                        ├── stock check (first failure)     │
//! │        │                        └── freeze unit costs, sum total    │
//! │        ▼                                                            │
//! │   guarded decrements (reserve)                                      │
//! │        │                                                            │
//! │        ▼                                                            │
//! │   fresh tab balance ──► check_credit_room(..)    ← THIS MODULE     │
//! │        │                                                            │
//! │        ▼                                                            │
//! │   insert sales, COMMIT                                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is a pure function of the snapshots handed in. The db
//! layer owns making those snapshots consistent (one transaction).

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, InventoryItem, SaleLine};

// =============================================================================
// Plan Shapes
// =============================================================================

/// Aggregated stock demand for one distinct item in a batch.
///
/// Multiple lines referencing the same item are summed into one reservation
/// before the stock check, so an oversell split across lines is still caught
/// and reported as a single precise error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub item_id: String,
    pub item_name: String,
    /// Quantity on hand when the snapshot was taken.
    pub available: i64,
    /// Total quantity requested across all lines of the batch.
    pub requested: i64,
}

/// One sale-to-be, with the unit cost frozen from the item snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSale {
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub unit_cost_kobo: i64,
    pub total_kobo: i64,
}

/// A validated batch, ready to commit.
///
/// `reservations` drive the inventory decrement (one per distinct item);
/// `lines` drive sale-row creation (one per input line, original order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub reservations: Vec<Reservation>,
    pub lines: Vec<PlannedSale>,
    /// Batch total = Σ line totals. The credit check uses this, never
    /// per-line amounts: a batch is atomic for credit purposes too.
    pub total_kobo: i64,
}

impl BatchPlan {
    /// Builds a plan from the request lines and the item snapshots fetched
    /// inside the batch transaction.
    ///
    /// ## Errors
    /// - `ItemNotFound` - a line references an id missing from `items` or a
    ///   soft-deleted item
    /// - `InsufficientStock` - the first distinct item (in line order) whose
    ///   aggregated request exceeds its available quantity
    ///
    /// Lines are assumed to be shape-validated already (non-empty batch,
    /// positive quantities); see [`crate::validation::validate_batch`].
    pub fn build(lines: &[SaleLine], items: &[InventoryItem]) -> CoreResult<BatchPlan> {
        let by_id: HashMap<&str, &InventoryItem> = items
            .iter()
            .map(|item| (item.id.as_str(), item))
            .collect();

        // Aggregate requested quantity per item, keeping first-seen order so
        // the failure report is deterministic.
        let mut order: Vec<&str> = Vec::new();
        let mut requested: HashMap<&str, i64> = HashMap::new();
        for line in lines {
            let item = by_id
                .get(line.item_id.as_str())
                .filter(|item| item.is_active)
                .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;
            let entry = requested.entry(item.id.as_str()).or_insert(0);
            if *entry == 0 {
                order.push(item.id.as_str());
            }
            *entry += line.quantity;
        }

        let mut reservations = Vec::with_capacity(order.len());
        for item_id in order {
            let item = by_id[item_id];
            let total_requested = requested[item_id];
            if item.quantity < total_requested {
                return Err(CoreError::InsufficientStock {
                    item_name: item.name.clone(),
                    available: item.quantity,
                    requested: total_requested,
                });
            }
            reservations.push(Reservation {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                available: item.quantity,
                requested: total_requested,
            });
        }

        let mut total = Money::zero();
        let mut planned = Vec::with_capacity(lines.len());
        for line in lines {
            let item = by_id[line.item_id.as_str()];
            let line_total = item.cost().multiply_quantity(line.quantity);
            total += line_total;
            planned.push(PlannedSale {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                quantity: line.quantity,
                unit_cost_kobo: item.cost_kobo,
                total_kobo: line_total.kobo(),
            });
        }

        Ok(BatchPlan {
            reservations,
            lines: planned,
            total_kobo: total.kobo(),
        })
    }

    /// Returns the batch total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }
}

// =============================================================================
// Credit Room
// =============================================================================

/// Checks whether `additional` fits within the customer's remaining tab room.
///
/// `balance` must be the customer's outstanding pending balance recomputed
/// fresh from committed sales inside the deciding transaction - never a
/// cached counter that could drift under concurrent status flips.
///
/// On failure the error carries `required_limit = balance + additional`, the
/// minimum limit that would have allowed the batch. Raising the limit is a
/// separate, explicit administrative operation; the engine only reports.
pub fn check_credit_room(customer: &Customer, balance: Money, additional: Money) -> CoreResult<()> {
    let required = balance.saturating_add(additional);
    if required > customer.tab_limit() {
        return Err(CoreError::TabLimitExceeded {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            balance_kobo: balance.kobo(),
            limit_kobo: customer.tab_limit_kobo,
            required_limit_kobo: required.kobo(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
