//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It contains the stock
//! reconciliation logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Calling Flows                                │   │
//! │  │    Sale posting ──► Purchase posting ──► Stock adjustment       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ stockroom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ movement  │  │   error   │  │ validation│  │   │
//! │  │   │ StockAcct │  │ borrowing │  │ CoreError │  │   rules   │  │   │
//! │  │   │  Ledger   │  │ arithmetic│  │ taxonomy  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  │       SQLite repositories, movement executor, migrations        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockAccount, UnitConversion, MovementRecord, ...)
//! - [`movement`] - Balance arithmetic incl. the cross-unit borrowing algorithm
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: Stock is counted in whole units (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::{StockAccount, UnitConversion};
//!
//! let conversion = UnitConversion::new("P-1", "EACH", "PACK", 12);
//! let mut account = StockAccount::new("P-1", 2, 3, 0);
//!
//! // Sell 20 PACK: 3 come from derived stock, the remaining 17 are
//! // covered by converting 2 base units (24 PACK), banking the leftover.
//! let moved = account.issue_derived(20, &conversion).unwrap();
//! assert_eq!(moved.base_converted, 2);
//! assert_eq!((account.base_qty, account.derived_qty), (0, 7));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod movement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockroom_core::StockAccount` instead of
// `use stockroom_core::types::StockAccount`

pub use error::{CoreError, CoreResult, ValidationError};
pub use movement::{AppliedMovement, UnitKind};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted for a single movement or adjustment target.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., scanning a barcode into the
/// quantity field). Can be made configurable in future versions.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Maximum line items allowed in a single sale or purchase document.
///
/// ## Business Reason
/// Keeps the per-document transaction (and the locks it holds) bounded.
pub const MAX_DOCUMENT_LINES: usize = 100;

/// Maximum length of a free-text remark on a ledger record.
pub const MAX_REMARK_LENGTH: usize = 500;
