//! # stockroom-db: Persistence Layer for Stockroom
//!
//! This crate provides database access for the Stockroom engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Data Flow                               │
//! │                                                                         │
//! │  Caller (API handler, CLI, report job)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   stockroom-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │   Executor    │    │ Repositories │    │    │
//! │  │   │   (pool.rs)   │    │ (executor.rs) │    │ (stock, ...) │    │    │
//! │  │   │               │    │               │    │              │    │    │
//! │  │   │ SqlitePool    │◄───│ lock → apply  │◄───│ StockRepo    │    │    │
//! │  │   │ Migrations    │    │ → ledger →    │    │ LedgerRepo   │    │    │
//! │  │   │ Management    │    │ persist       │    │ SaleRepo ... │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  │   Balance arithmetic itself lives in stockroom-core; this       │    │
//! │  │   crate wraps it in transactions and rows.                      │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database                             │    │
//! │  │   ./data/stockroom.db (WAL mode)                                │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`executor`] - The transactional write path for stock
//! - [`repository`] - Repository implementations (stock, ledger, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/stockroom.db");
//! let db = Database::new(config).await?;
//!
//! // Post a purchase (atomically: header, lines, ledger, balances)
//! let receipt = db.executor().post_purchase(&draft).await?;
//!
//! // Read a product's movement history
//! let history = db.ledger().query(&MovementFilter::for_product("P-1")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod executor;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use executor::{MovementExecutor, PostingError, PostingResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::conversion::UnitConversionRepository;
pub use repository::ledger::MovementLedgerRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockAccountRepository;
