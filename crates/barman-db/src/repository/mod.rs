//! # Repository Module
//!
//! Database repository implementations for the BarMan sale engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                             │
//! │    │  db.sales().search(&filter, page)                              │
//! │    ▼                                                                │
//! │  SaleRepository                                                     │
//! │    │  SQL isolated here                                             │
//! │    ▼                                                                │
//! │  SQLite Database                                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository also exposes `*_tx` associated functions taking a raw
//! `SqliteConnection`, so the batch engine can compose them inside one
//! transaction. The pool-based methods are thin wrappers over those.
//!
//! ## Available Repositories
//!
//! - [`item::InventoryRepository`] - Inventory ledger (stock, catalog)
//! - [`customer::CustomerRepository`] - Customer credit ledger (tab limits,
//!   derived balances)
//! - [`sale::SaleRepository`] - Committed sales: payment status, summaries,
//!   paginated search

pub mod customer;
pub mod item;
pub mod sale;
