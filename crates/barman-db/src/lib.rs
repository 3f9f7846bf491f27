//! # barman-db: Database Layer for the BarMan Sale Engine
//!
//! This crate provides SQLite persistence and the transactional batch
//! engine for BarMan. The pure business rules live in `barman-core`; this
//! crate makes them atomic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BarMan Data Flow                                 │
//! │                                                                         │
//! │  Caller (API / UI collaborator)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     barman-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    Batch     │  │   │
//! │  │   │   (pool.rs)   │    │ item/customer │    │  Processor   │  │   │
//! │  │   │               │    │ /sale         │    │  (batch.rs)  │  │   │
//! │  │   │ SqlitePool    │◄───│ SQL isolated  │◄───│ one atomic   │  │   │
//! │  │   │ WAL + timeout │    │ per entity    │    │ transaction  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (barman.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Repository implementations (item, customer, sale)
//! - [`batch`] - The atomic sale batch processor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barman_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/barman.db")).await?;
//!
//! // Commit a batch against both ledgers atomically
//! let receipt = db.batches().submit(&request).await?;
//!
//! // Query committed sales
//! let page = db.sales().search(&filter, Page::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use batch::BatchProcessor;
pub use error::{DbError, DbResult, EngineError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::item::InventoryRepository;
pub use repository::sale::SaleRepository;
