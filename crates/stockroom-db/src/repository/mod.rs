//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.ledger().query(&MovementFilter::for_product("P-1"))         │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  MovementLedgerRepository                                               │
//! │  ├── append(&self, conn, record)                                        │
//! │  └── query(&self, filter)                                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • Easy to test against an in-memory database                           │
//! │  • SQL is isolated in one place                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction-Scoped Methods
//!
//! Methods taking `conn: &mut SqliteConnection` participate in a caller's
//! transaction (the executor's posting flow). Methods taking `&self` only
//! read through the shared pool.
//!
//! ## Available Repositories
//!
//! - [`stock::StockAccountRepository`] - Balance rows and stock reports
//! - [`conversion::UnitConversionRepository`] - Per-product unit configuration
//! - [`ledger::MovementLedgerRepository`] - Append-only movement history
//! - [`sale::SaleRepository`] - Posted sale documents
//! - [`purchase::PurchaseRepository`] - Posted purchase documents

pub mod conversion;
pub mod ledger;
pub mod purchase;
pub mod sale;
pub mod stock;
