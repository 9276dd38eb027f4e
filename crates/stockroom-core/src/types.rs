//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockAccount   │   │ UnitConversion  │   │ MovementRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  product_id     │   │  id (UUID)      │       │
//! │  │  base_qty       │   │  base_unit      │   │  reference_no   │       │
//! │  │  derived_qty    │   │  derive_unit    │   │  in_qty/out_qty │       │
//! │  │  reorder_level  │   │  factor         │   │  movement_type  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Sale/Purchase  │   │  MovementType   │   │ MovementDirection│      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  header + lines │   │  Debit (in)     │   │  Inflow         │       │
//! │  │  total_cents    │   │  Credit (out)   │   │  Outflow        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Balance Identity Pattern
//! A stock account tracks two separately-spendable balances per product:
//! - `base_qty`: whole base units on hand
//! - `derived_qty`: derived units on hand (one base unit = `factor` derived)
//!
//! Neither balance alone is "the stock"; their factor-weighted sum is.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Stock Account
// =============================================================================

/// The current-balance record for one product.
///
/// Mutated exclusively by the movement executor; every mutation is paired
/// with exactly one [`MovementRecord`] in the same transaction. Both
/// balances are invariantly non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAccount {
    /// Product this account belongs to (1:1).
    pub product_id: String,

    /// Units on hand counted in the base unit.
    pub base_qty: i64,

    /// Units on hand counted in the derived unit.
    pub derived_qty: i64,

    /// Informational replenishment threshold, in base units.
    pub reorder_level: i64,

    /// When the account was created (product onboarding).
    pub created_at: DateTime<Utc>,

    /// When the balances were last touched.
    pub updated_at: DateTime<Utc>,
}

impl StockAccount {
    /// Creates a new account with the given opening balances.
    pub fn new(
        product_id: impl Into<String>,
        base_qty: i64,
        derived_qty: i64,
        reorder_level: i64,
    ) -> Self {
        let now = Utc::now();
        StockAccount {
            product_id: product_id.into(),
            base_qty,
            derived_qty,
            reorder_level,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the base balance has fallen to the reorder threshold.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.base_qty <= self.reorder_level
    }
}

// =============================================================================
// Unit Conversion
// =============================================================================

/// The unit-of-measure configuration for one product.
///
/// One whole base unit converts into `factor` derived units (e.g. base
/// "EACH" with factor 12 splits into 12 derived "PACK"). Read-only from
/// the executor's perspective; administered separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UnitConversion {
    /// Product this conversion belongs to (1:1).
    pub product_id: String,

    /// Name of the base unit, stored uppercase.
    pub base_unit: String,

    /// Name of the derived unit, stored uppercase.
    pub derive_unit: String,

    /// Derived units obtained from one base unit. Always >= 1.
    pub factor: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UnitConversion {
    /// Creates a conversion, normalizing unit names to uppercase.
    pub fn new(
        product_id: impl Into<String>,
        base_unit: &str,
        derive_unit: &str,
        factor: i64,
    ) -> Self {
        let now = Utc::now();
        UnitConversion {
            product_id: product_id.into(),
            base_unit: base_unit.trim().to_ascii_uppercase(),
            derive_unit: derive_unit.trim().to_ascii_uppercase(),
            factor,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Ledger tag for a movement: inflows are debits, outflows are credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock came in (purchase receipt, positive adjustment).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DEBIT"))]
    Debit,
    /// Stock went out (sale, consumption, negative adjustment).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CREDIT"))]
    Credit,
}

impl MovementType {
    /// The string stored in the ledger and shown in reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Debit => "DEBIT",
            MovementType::Credit => "CREDIT",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Movement Direction
// =============================================================================

/// Which way a requested movement flows. Not persisted; requests carry a
/// direction, the ledger stores the resulting [`MovementType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    /// Receipt into stock (purchases). Ledgered as `DEBIT`.
    Inflow,
    /// Issue out of stock (sales, consumption). Ledgered as `CREDIT`.
    Outflow,
}

impl MovementDirection {
    /// The ledger tag this direction produces.
    #[inline]
    pub const fn movement_type(&self) -> MovementType {
        match self {
            MovementDirection::Inflow => MovementType::Debit,
            MovementDirection::Outflow => MovementType::Credit,
        }
    }
}

// =============================================================================
// Movement Record
// =============================================================================

/// One immutable ledger entry describing a single stock mutation.
///
/// Exactly one of `in_qty`/`out_qty` is non-zero; the constructors below
/// are the only way this crate builds records, so the invariant holds by
/// construction. Records are never updated or deleted; corrections are
/// appended as compensating records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovementRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product whose account this movement touched (many:1).
    pub product_id: String,

    /// Free-text correlation to the parent document and line,
    /// e.g. `"{sale_id}-3"` or `"ADJ-{uuid}"`.
    pub reference_no: String,

    /// Quantity received. Zero for outflows.
    pub in_qty: i64,

    /// Quantity issued. Zero for inflows.
    pub out_qty: i64,

    /// Unit the quantity is expressed in (the product's base or derived
    /// unit name, canonical uppercase form).
    pub uom: String,

    /// `DEBIT` for inflows, `CREDIT` for outflows.
    pub movement_type: MovementType,

    /// Human-readable description of the movement.
    pub remark: String,

    /// Immutable append timestamp.
    pub created_at: DateTime<Utc>,
}

impl MovementRecord {
    /// Builds a `DEBIT` record for a receipt of `qty` units.
    pub fn inflow(
        product_id: impl Into<String>,
        qty: i64,
        uom: impl Into<String>,
        reference_no: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        MovementRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            reference_no: reference_no.into(),
            in_qty: qty,
            out_qty: 0,
            uom: uom.into(),
            movement_type: MovementType::Debit,
            remark: remark.into(),
            created_at: Utc::now(),
        }
    }

    /// Builds a `CREDIT` record for an issue of `qty` units.
    pub fn outflow(
        product_id: impl Into<String>,
        qty: i64,
        uom: impl Into<String>,
        reference_no: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        MovementRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            reference_no: reference_no.into(),
            in_qty: 0,
            out_qty: qty,
            uom: uom.into(),
            movement_type: MovementType::Credit,
            remark: remark.into(),
            created_at: Utc::now(),
        }
    }

    /// Builds the `DEBIT`-tagged record for an absolute-set adjustment.
    ///
    /// The signed `delta` (target minus previous balance) lands in
    /// `in_qty` when positive and `out_qty` when negative. Callers must
    /// not pass zero; a zero-delta adjustment appends nothing.
    pub fn adjustment(
        product_id: impl Into<String>,
        delta: i64,
        uom: impl Into<String>,
        reference_no: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        let (in_qty, out_qty) = if delta >= 0 { (delta, 0) } else { (0, -delta) };
        MovementRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            reference_no: reference_no.into(),
            in_qty,
            out_qty,
            uom: uom.into(),
            movement_type: MovementType::Debit,
            remark: remark.into(),
            created_at: Utc::now(),
        }
    }

    /// Signed quantity of this record: positive in, negative out.
    #[inline]
    pub fn net_qty(&self) -> i64 {
        self.in_qty - self.out_qty
    }
}

// =============================================================================
// Movement Request
// =============================================================================

/// A single requested stock movement, as handed to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub product_id: String,
    /// Requested quantity, expressed in `uom`. Must be positive.
    pub qty: i64,
    /// Unit of measure; matched case-insensitively against the product's
    /// configured base/derived unit names.
    pub uom: String,
    pub direction: MovementDirection,
    /// Correlation to the parent document and line.
    pub reference_no: String,
    pub remark: String,
}

/// Criteria for reading the movement ledger back. Empty filter matches
/// every record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub movement_type: Option<MovementType>,
}

impl MovementFilter {
    /// Matches every ledger record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one product's history.
    pub fn for_product(product_id: impl Into<String>) -> Self {
        MovementFilter {
            product_id: Some(product_id.into()),
            movement_type: None,
        }
    }

    /// Restricts to one movement type across all products.
    pub fn of_type(movement_type: MovementType) -> Self {
        MovementFilter {
            product_id: None,
            movement_type: Some(movement_type),
        }
    }

    /// Further restricts an existing filter to one movement type.
    pub fn and_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }
}

// =============================================================================
// Sale / Purchase Documents
// =============================================================================

/// A posted sale document header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A line item of a posted sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// 1-based position within the document.
    pub line_no: i64,
    pub product_id: String,
    pub qty: i64,
    pub uom: String,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A posted purchase document header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub purchase_date: NaiveDate,
    pub supplier_name: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A line item of a posted purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLine {
    pub id: String,
    pub purchase_id: String,
    /// 1-based position within the document.
    pub line_no: i64,
    pub product_id: String,
    pub qty: i64,
    pub uom: String,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Document Drafts (executor input)
// =============================================================================

/// One line of a draft document before posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub product_id: String,
    pub qty: i64,
    pub uom: String,
    /// Price per unit in cents.
    pub unit_price_cents: i64,
}

impl DocumentLine {
    /// Line total in cents (`qty * unit_price_cents`).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.qty * self.unit_price_cents
    }
}

/// A sale to be posted: header metadata plus lines in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub lines: Vec<DocumentLine>,
}

/// A purchase to be posted: header metadata plus lines in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDraft {
    pub purchase_date: NaiveDate,
    pub supplier_name: String,
    pub lines: Vec<DocumentLine>,
}

// =============================================================================
// Posting Results (executor output)
// =============================================================================

/// Everything a committed sale produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    /// One ledger record per line, in document order.
    pub movements: Vec<MovementRecord>,
}

/// Everything a committed purchase produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub lines: Vec<PurchaseLine>,
    /// One ledger record per line, in document order.
    pub movements: Vec<MovementRecord>,
}

// =============================================================================
// Manual Adjustment
// =============================================================================

/// Which balance an absolute-set adjustment targets, and the value to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustmentTarget {
    /// Set `base_qty` to this value.
    Base(i64),
    /// Set `derived_qty` to this value.
    Derived(i64),
}

impl AdjustmentTarget {
    /// The absolute value being set.
    #[inline]
    pub const fn value(&self) -> i64 {
        match self {
            AdjustmentTarget::Base(v) | AdjustmentTarget::Derived(v) => *v,
        }
    }
}

/// A stock-count correction: set one balance to an absolute value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub product_id: String,
    pub target: AdjustmentTarget,
    pub remark: String,
}

// =============================================================================
// Read-Side Rows
// =============================================================================

/// One row of the stock listing: account balances joined with the
/// product's unit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockOverview {
    pub product_id: String,
    pub base_unit: String,
    pub base_qty: i64,
    pub derive_unit: String,
    pub derived_qty: i64,
    pub reorder_level: i64,
    pub factor: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_normalizes_unit_names() {
        let conv = UnitConversion::new("P-1", " each ", "pack", 12);
        assert_eq!(conv.base_unit, "EACH");
        assert_eq!(conv.derive_unit, "PACK");
        assert_eq!(conv.factor, 12);
    }

    #[test]
    fn test_movement_type_strings() {
        assert_eq!(MovementType::Debit.as_str(), "DEBIT");
        assert_eq!(MovementType::Credit.to_string(), "CREDIT");
        assert_eq!(
            MovementDirection::Inflow.movement_type(),
            MovementType::Debit
        );
        assert_eq!(
            MovementDirection::Outflow.movement_type(),
            MovementType::Credit
        );
    }

    #[test]
    fn test_record_constructors_set_one_side() {
        let rec = MovementRecord::inflow("P-1", 50, "EACH", "PO-1-1", "receipt");
        assert_eq!((rec.in_qty, rec.out_qty), (50, 0));
        assert_eq!(rec.movement_type, MovementType::Debit);
        assert_eq!(rec.net_qty(), 50);

        let rec = MovementRecord::outflow("P-1", 20, "PACK", "SO-1-1", "sale");
        assert_eq!((rec.in_qty, rec.out_qty), (0, 20));
        assert_eq!(rec.movement_type, MovementType::Credit);
        assert_eq!(rec.net_qty(), -20);
    }

    #[test]
    fn test_adjustment_record_splits_on_sign() {
        let up = MovementRecord::adjustment("P-1", 7, "EACH", "ADJ-x", "count");
        assert_eq!((up.in_qty, up.out_qty), (7, 0));
        assert_eq!(up.movement_type, MovementType::Debit);

        let down = MovementRecord::adjustment("P-1", -4, "EACH", "ADJ-y", "count");
        assert_eq!((down.in_qty, down.out_qty), (0, 4));
        assert_eq!(down.movement_type, MovementType::Debit);
    }

    #[test]
    fn test_needs_reorder() {
        let account = StockAccount::new("P-1", 5, 0, 5);
        assert!(account.needs_reorder());

        let account = StockAccount::new("P-1", 6, 0, 5);
        assert!(!account.needs_reorder());
    }

    #[test]
    fn test_line_total() {
        let line = DocumentLine {
            product_id: "P-1".to_string(),
            qty: 3,
            uom: "EACH".to_string(),
            unit_price_cents: 250,
        };
        assert_eq!(line.line_total_cents(), 750);
    }

    #[test]
    fn test_adjustment_target_value() {
        assert_eq!(AdjustmentTarget::Base(10).value(), 10);
        assert_eq!(AdjustmentTarget::Derived(3).value(), 3);
    }
}
