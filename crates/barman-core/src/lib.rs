//! # barman-core: Pure Business Logic for the BarMan Sale Engine
//!
//! This crate is the **heart** of the BarMan sale-recording engine. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      BarMan Architecture                            │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │          External collaborators (UI, auth, catalog)         │   │
//! │  └──────────────────────────────┬──────────────────────────────┘   │
//! │                                 │ submit / set status / search     │
//! │  ┌──────────────────────────────▼──────────────────────────────┐   │
//! │  │                 barman-db (engine + ledgers)                │   │
//! │  │   BatchProcessor, repositories, SQLite transactions         │   │
//! │  └──────────────────────────────┬──────────────────────────────┘   │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼──────────────────────────────┐   │
//! │  │               ★ barman-core (THIS CRATE) ★                  │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────────┐     │   │
//! │  │   │  types  │ │  money  │ │  batch   │ │ validation │     │   │
//! │  │   │  Sale   │ │  Money  │ │ BatchPlan│ │   rules    │     │   │
//! │  │   │Customer │ │  (kobo) │ │ tab room │ │   checks   │     │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────────┘     │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, Customer, Sale, batch DTOs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`batch`] - Batch planning: stock aggregation and the credit-room check
//! - [`filter`] - Sale filters, named periods, pagination, summary shapes
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every decision is deterministic - same input = same output
//! 2. **No I/O**: Database, network, and clock access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in kobo (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod error;
pub mod filter;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use barman_core::Money` instead of
// `use barman_core::money::Money`

pub use batch::{check_credit_room, BatchPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{Page, Period, SaleFilter, SalePage, SalesSummary};
pub use money::Money;
pub use types::*;
pub use validation::validate_batch;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single batch.
///
/// ## Business Reason
/// Prevents runaway submissions and keeps a batch reviewable at the bar.
pub const MAX_BATCH_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Default page size for sale listings.
///
/// Matches what the sales screen requests per page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Maximum page size the query gateway will serve.
pub const MAX_PAGE_SIZE: u32 = 100;
