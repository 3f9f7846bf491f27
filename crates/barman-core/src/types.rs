//! # Domain Types
//!
//! Core domain types used throughout the BarMan sale engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐        │
//! │  │ InventoryItem  │  │    Customer    │  │      Sale      │        │
//! │  │ ────────────── │  │ ────────────── │  │ ────────────── │        │
//! │  │ id (UUID)      │  │ id (UUID)      │  │ id (UUID)      │        │
//! │  │ name           │  │ name           │  │ item_id (FK)   │        │
//! │  │ cost_kobo      │  │ phone_number   │  │ unit_cost_kobo │        │
//! │  │ quantity       │  │ tab_limit_kobo │  │ total_kobo     │        │
//! │  └────────────────┘  └────────────────┘  │ payment_status │        │
//! │                                          └────────────────┘        │
//! │                                                                     │
//! │  Batch DTOs: SaleLine → BatchRequest → BatchReceipt                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `Sale` captures `item_name` and `unit_cost_kobo` at commit time.
//! Later catalog edits never retroactively alter historical sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Inventory Item
// =============================================================================

/// A catalog item with its stock level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to staff and in reports.
    pub name: String,

    /// Unit cost in kobo (frozen onto each sale at commit time).
    pub cost_kobo: i64,

    /// Quantity on hand. Never negative, including mid-batch.
    pub quantity: i64,

    /// Stock level at or below which the item counts as low stock.
    pub low_stock_threshold: i64,

    /// Whether the item is active (soft delete). Inactive items cannot be
    /// sold but stay referenced by historical sales.
    pub is_active: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Returns the unit cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_kobo(self.cost_kobo)
    }

    /// Checks if current stock covers the requested quantity.
    pub fn can_cover(&self, requested: i64) -> bool {
        self.is_active && self.quantity >= requested
    }

    /// Checks if the item is at or below its low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may run a credit tab.
///
/// The tab limit is mutated only by an explicit administrative operation;
/// the engine reports what limit would be sufficient but never raises it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
    /// Maximum outstanding pending balance permitted, in kobo.
    pub tab_limit_kobo: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the tab limit as Money.
    #[inline]
    pub fn tab_limit(&self) -> Money {
        Money::from_kobo(self.tab_limit_kobo)
    }
}

/// A customer together with their live outstanding balance.
///
/// The balance is always computed from committed pending sales at read time,
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerTab {
    pub customer_id: String,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub tab_limit_kobo: i64,
    /// Sum of pending sale totals for this customer, in kobo.
    pub balance_kobo: i64,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state of a committed sale.
///
/// Both transitions are allowed (a mis-marked payment can be corrected) and
/// setting the current status again is a no-op success. A flip back to
/// pending is a payment-tracking correction, not a sale reversal: inventory
/// is never restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Unpaid; counts against the customer's tab if one is assigned.
    Pending,
    /// Paid; never counts against a tab.
    Done,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale line, created only by a successful batch commit.
///
/// Immutable once created except for `payment_status` and (separately)
/// `customer_id` via explicit allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub item_id: String,
    /// Item name at time of sale (frozen).
    pub item_name: String,
    /// Quantity sold (≥ 1).
    pub quantity: i64,
    /// Unit cost in kobo at time of sale (frozen).
    pub unit_cost_kobo: i64,
    /// Total amount = quantity × unit_cost_kobo.
    pub total_kobo: i64,
    /// Customer on whose tab the sale sits, if any.
    pub customer_id: Option<String>,
    pub payment_status: PaymentStatus,
    /// Actor who recorded the sale (from the external auth layer).
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the frozen unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_kobo(self.unit_cost_kobo)
    }

    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }

    /// Whether this sale counts against a customer's tab right now.
    pub fn counts_against_tab(&self) -> bool {
        self.customer_id.is_some() && self.payment_status == PaymentStatus::Pending
    }
}

// =============================================================================
// Batch DTOs
// =============================================================================

/// One (item, quantity) pair within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub item_id: String,
    pub quantity: i64,
}

/// A batch of sale lines submitted and committed as one atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub lines: Vec<SaleLine>,
    /// Customer whose tab the batch goes on, if any.
    pub customer_id: Option<String>,
    /// Status every created sale starts with. `Done` means immediate cash
    /// payment and skips the credit check entirely.
    pub payment_status: PaymentStatus,
    /// Actor identity from the external auth layer - explicit input, never
    /// ambient state.
    pub recorded_by: String,
}

/// The result of a successful batch commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// One sale id per submitted line, in line order.
    pub sale_ids: Vec<String>,
    /// Batch total in kobo.
    pub total_kobo: i64,
}

impl BatchReceipt {
    /// Returns the batch total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, is_active: bool) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: "item-1".to_string(),
            name: "Star Lager".to_string(),
            cost_kobo: 50_000,
            quantity,
            low_stock_threshold: 6,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_cover() {
        assert!(item(5, true).can_cover(5));
        assert!(!item(5, true).can_cover(6));
        assert!(!item(5, false).can_cover(1));
    }

    #[test]
    fn test_low_stock() {
        assert!(item(6, true).is_low_stock());
        assert!(!item(7, true).is_low_stock());
    }

    #[test]
    fn test_payment_status_default() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_counts_against_tab() {
        let now = Utc::now();
        let mut sale = Sale {
            id: "s1".to_string(),
            item_id: "item-1".to_string(),
            item_name: "Star Lager".to_string(),
            quantity: 2,
            unit_cost_kobo: 50_000,
            total_kobo: 100_000,
            customer_id: Some("c1".to_string()),
            payment_status: PaymentStatus::Pending,
            recorded_by: "staff-1".to_string(),
            created_at: now,
        };
        assert!(sale.counts_against_tab());

        sale.payment_status = PaymentStatus::Done;
        assert!(!sale.counts_against_tab());

        sale.payment_status = PaymentStatus::Pending;
        sale.customer_id = None;
        assert!(!sale.counts_against_tab());
    }
}
