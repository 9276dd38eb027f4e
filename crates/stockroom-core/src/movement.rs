//! # Movement Module
//!
//! Balance arithmetic for stock accounts, including the cross-unit
//! borrowing algorithm.
//!
//! ## The Cross-Unit Borrowing Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TWO BALANCES, ONE STOCK                                                │
//! │                                                                         │
//! │  A product is stocked in two units at once:                             │
//! │    base_qty    = 2   (whole base units, e.g. cartons)                   │
//! │    derived_qty = 3   (loose derived units; 1 base = factor derived)     │
//! │    factor      = 12                                                     │
//! │                                                                         │
//! │  A request for 20 derived units cannot be served from derived_qty      │
//! │  alone. We BORROW from the base balance:                                │
//! │                                                                         │
//! │    shortage        = 20 - 3          = 17 derived units                 │
//! │    base_to_convert = ceil(17 / 12)   = 2 whole base units               │
//! │    leftover        = 2 × 12 - 17     = 7 derived units banked back     │
//! │                                                                         │
//! │  Result: base_qty 2 → 0, derived_qty 3 → 7.                             │
//! │  Partial base units cannot be split, so covering a shortage may        │
//! │  convert one base unit too many; the surplus stays spendable as        │
//! │  derived stock.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::{StockAccount, UnitConversion};
//!
//! let conversion = UnitConversion::new("P-1", "EACH", "PACK", 12);
//! let mut account = StockAccount::new("P-1", 2, 3, 0);
//!
//! let moved = account.issue_derived(20, &conversion).unwrap();
//! assert_eq!(moved.base_converted, 2);
//! assert_eq!((account.base_qty, account.derived_qty), (0, 7));
//! ```
//!
//! All functions here are pure state transitions on in-memory values.
//! Locking, persistence, and ledger appends live in the database layer.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{MovementDirection, StockAccount, UnitConversion};
use crate::MAX_MOVEMENT_QUANTITY;

// =============================================================================
// Unit Kind
// =============================================================================

/// Which of the product's two configured units a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// The product's base unit.
    Base,
    /// The product's derived unit.
    Derived,
}

// =============================================================================
// Applied Movement
// =============================================================================

/// Outcome of one balance mutation, as signed deltas per tier.
///
/// The executor uses this to cross-check the ledger record it appends:
/// `base_delta * factor + derived_delta` is the net change in
/// derived-unit terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMovement {
    /// Signed change applied to `base_qty`.
    pub base_delta: i64,

    /// Signed change applied to `derived_qty`.
    pub derived_delta: i64,

    /// Whole base units converted into derived stock to cover a
    /// shortfall. Zero unless the request borrowed across units.
    pub base_converted: i64,

    /// Which unit tier the request was classified as. The executor
    /// records the ledger row under this tier's canonical name.
    pub unit_kind: UnitKind,
}

// =============================================================================
// Unit Conversion Arithmetic
// =============================================================================

impl UnitConversion {
    /// Matches a requested unit name against the configured units,
    /// case-insensitively.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::{UnitConversion, movement::UnitKind};
    ///
    /// let conv = UnitConversion::new("P-1", "EACH", "PACK", 12);
    /// assert_eq!(conv.classify("each"), Some(UnitKind::Base));
    /// assert_eq!(conv.classify("Pack"), Some(UnitKind::Derived));
    /// assert_eq!(conv.classify("CRATE"), None);
    /// ```
    pub fn classify(&self, uom: &str) -> Option<UnitKind> {
        let uom = uom.trim();
        if uom.eq_ignore_ascii_case(&self.base_unit) {
            Some(UnitKind::Base)
        } else if uom.eq_ignore_ascii_case(&self.derive_unit) {
            Some(UnitKind::Derived)
        } else {
            None
        }
    }

    /// Canonical (stored) name of the given unit tier.
    pub fn canonical_name(&self, kind: UnitKind) -> &str {
        match kind {
            UnitKind::Base => &self.base_unit,
            UnitKind::Derived => &self.derive_unit,
        }
    }

    /// Whole base units needed to cover `shortage` derived units,
    /// rounded up (partial base units cannot be split).
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::UnitConversion;
    ///
    /// let conv = UnitConversion::new("P-1", "EACH", "PACK", 12);
    /// assert_eq!(conv.base_units_to_cover(17), 2); // 2 × 12 = 24 >= 17
    /// assert_eq!(conv.base_units_to_cover(24), 2);
    /// assert_eq!(conv.base_units_to_cover(25), 3);
    /// ```
    #[inline]
    pub const fn base_units_to_cover(&self, shortage: i64) -> i64 {
        (shortage + self.factor - 1) / self.factor
    }
}

// =============================================================================
// Stock Account Arithmetic
// =============================================================================

impl StockAccount {
    /// Total stock expressible in derived units:
    /// `derived_qty + base_qty * factor`.
    ///
    /// This is exactly the largest derived-unit request the account can
    /// satisfy, and the figure reported as `available` when a
    /// derived-unit issue fails.
    #[inline]
    pub fn coverable_derived(&self, conversion: &UnitConversion) -> i64 {
        self.derived_qty + self.base_qty * conversion.factor
    }

    /// Dispatches a requested movement to the right balance mutation.
    ///
    /// ## Arguments
    /// * `conversion` - the product's unit configuration
    /// * `direction` - inflow (receipt) or outflow (issue)
    /// * `qty` - requested quantity, expressed in `uom`
    /// * `uom` - requested unit name, matched case-insensitively
    ///
    /// ## Returns
    /// The applied deltas, or the rejection reason. On any error the
    /// account is left untouched.
    ///
    /// Derived-unit inflows are rejected `InvalidUnit`: receipts land in
    /// base-unit stock only, and silently crediting the wrong balance
    /// would corrupt the account.
    pub fn apply_movement(
        &mut self,
        conversion: &UnitConversion,
        direction: MovementDirection,
        qty: i64,
        uom: &str,
    ) -> CoreResult<AppliedMovement> {
        let kind = conversion.classify(uom).ok_or_else(|| {
            CoreError::invalid_unit(
                &self.product_id,
                uom,
                &[&conversion.base_unit, &conversion.derive_unit],
            )
        })?;

        match (direction, kind) {
            (MovementDirection::Inflow, UnitKind::Base) => self.receive_base(qty),
            (MovementDirection::Inflow, UnitKind::Derived) => Err(CoreError::invalid_unit(
                &self.product_id,
                uom,
                &[&conversion.base_unit],
            )),
            (MovementDirection::Outflow, UnitKind::Base) => self.issue_base(qty, conversion),
            (MovementDirection::Outflow, UnitKind::Derived) => self.issue_derived(qty, conversion),
        }
    }

    /// Receives `qty` base units into stock.
    ///
    /// Never fails for sufficiency reasons; inflows only grow the
    /// balance.
    pub fn receive_base(&mut self, qty: i64) -> CoreResult<AppliedMovement> {
        require_positive_qty(qty)?;

        self.base_qty += qty;
        Ok(AppliedMovement {
            base_delta: qty,
            derived_delta: 0,
            base_converted: 0,
            unit_kind: UnitKind::Base,
        })
    }

    /// Issues `qty` base units out of stock.
    ///
    /// Fails `InsufficientStock` when the base balance cannot cover the
    /// request. Base-unit issues never borrow from the derived balance.
    pub fn issue_base(
        &mut self,
        qty: i64,
        conversion: &UnitConversion,
    ) -> CoreResult<AppliedMovement> {
        require_positive_qty(qty)?;

        if qty > self.base_qty {
            return Err(CoreError::insufficient_stock(
                &self.product_id,
                &conversion.base_unit,
                qty,
                self.base_qty,
            ));
        }

        self.base_qty -= qty;
        Ok(AppliedMovement {
            base_delta: -qty,
            derived_delta: 0,
            base_converted: 0,
            unit_kind: UnitKind::Base,
        })
    }

    /// Issues `qty` derived units, borrowing from the base balance when
    /// the derived balance runs short.
    ///
    /// ## Algorithm
    /// ```text
    /// need <= derived_qty ?
    ///      │
    ///      ├── yes → derived_qty -= need
    ///      │
    ///      └── no  → shortage        = need - derived_qty
    ///                base_to_convert = ceil(shortage / factor)
    ///                      │
    ///                      ├── base_to_convert > base_qty
    ///                      │        → InsufficientStock, nothing changed
    ///                      │
    ///                      └── base_qty    -= base_to_convert
    ///                          derived_qty  = base_to_convert × factor
    ///                                         - shortage
    /// ```
    /// The leftover from the last converted base unit is banked back as
    /// derived stock for future issues.
    pub fn issue_derived(
        &mut self,
        qty: i64,
        conversion: &UnitConversion,
    ) -> CoreResult<AppliedMovement> {
        require_positive_qty(qty)?;

        let need = qty;
        if need <= self.derived_qty {
            self.derived_qty -= need;
            return Ok(AppliedMovement {
                base_delta: 0,
                derived_delta: -need,
                base_converted: 0,
                unit_kind: UnitKind::Derived,
            });
        }

        let shortage = need - self.derived_qty;
        let base_to_convert = conversion.base_units_to_cover(shortage);
        if base_to_convert > self.base_qty {
            return Err(CoreError::insufficient_stock(
                &self.product_id,
                &conversion.derive_unit,
                need,
                self.coverable_derived(conversion),
            ));
        }

        let leftover = base_to_convert * conversion.factor - shortage;
        let derived_delta = leftover - self.derived_qty;
        self.base_qty -= base_to_convert;
        self.derived_qty = leftover;
        Ok(AppliedMovement {
            base_delta: -base_to_convert,
            derived_delta,
            base_converted: base_to_convert,
            unit_kind: UnitKind::Derived,
        })
    }

    /// Sets `base_qty` to an absolute value (stock-count correction).
    ///
    /// Returns the delta applied, so the caller can ledger it.
    pub fn set_base(&mut self, target: i64) -> CoreResult<AppliedMovement> {
        require_valid_target(target)?;

        let delta = target - self.base_qty;
        self.base_qty = target;
        Ok(AppliedMovement {
            base_delta: delta,
            derived_delta: 0,
            base_converted: 0,
            unit_kind: UnitKind::Base,
        })
    }

    /// Sets `derived_qty` to an absolute value (stock-count correction).
    pub fn set_derived(&mut self, target: i64) -> CoreResult<AppliedMovement> {
        require_valid_target(target)?;

        let delta = target - self.derived_qty;
        self.derived_qty = target;
        Ok(AppliedMovement {
            base_delta: 0,
            derived_delta: delta,
            base_converted: 0,
            unit_kind: UnitKind::Derived,
        })
    }
}

// =============================================================================
// Guards
// =============================================================================

fn require_positive_qty(qty: i64) -> CoreResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        }
        .into());
    }
    Ok(())
}

fn require_valid_target(target: i64) -> CoreResult<()> {
    if !(0..=MAX_MOVEMENT_QUANTITY).contains(&target) {
        return Err(ValidationError::OutOfRange {
            field: "target".to_string(),
            min: 0,
            max: MAX_MOVEMENT_QUANTITY,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(factor: i64) -> UnitConversion {
        UnitConversion::new("P-1", "EACH", "PACK", factor)
    }

    fn account(base: i64, derived: i64) -> StockAccount {
        StockAccount::new("P-1", base, derived, 0)
    }

    #[test]
    fn test_receive_base() {
        let mut acct = account(0, 0);
        let moved = acct.receive_base(50).unwrap();
        assert_eq!(acct.base_qty, 50);
        assert_eq!(moved.base_delta, 50);
        assert_eq!(moved.derived_delta, 0);
    }

    #[test]
    fn test_issue_base_sufficient() {
        let mut acct = account(10, 0);
        let moved = acct.issue_base(4, &conv(12)).unwrap();
        assert_eq!(acct.base_qty, 6);
        assert_eq!(moved.base_delta, -4);
    }

    #[test]
    fn test_issue_base_insufficient() {
        let mut acct = account(3, 99);
        let err = acct.issue_base(5, &conv(12)).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                uom,
                requested,
                available,
                ..
            } => {
                assert_eq!(uom, "EACH");
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        // Base issues never borrow from the derived balance.
        assert_eq!((acct.base_qty, acct.derived_qty), (3, 99));
    }

    #[test]
    fn test_issue_derived_from_derived_balance() {
        let mut acct = account(2, 10);
        let moved = acct.issue_derived(7, &conv(12)).unwrap();
        assert_eq!((acct.base_qty, acct.derived_qty), (2, 3));
        assert_eq!(moved.base_converted, 0);
        assert_eq!(moved.derived_delta, -7);
    }

    /// Borrowing vectors for factor 12, starting at base 2 / derived 3.
    #[test]
    fn test_issue_derived_borrowing_vectors() {
        let conversion = conv(12);
        let cases: &[(i64, (i64, i64))] = &[
            (20, (0, 7)),
            (21, (0, 6)),
            (22, (0, 5)),
            (25, (0, 2)),
            (27, (0, 0)),
        ];
        for &(need, expected) in cases {
            let mut acct = account(2, 3);
            acct.issue_derived(need, &conversion).unwrap();
            assert_eq!(
                (acct.base_qty, acct.derived_qty),
                expected,
                "need {need}"
            );
        }
    }

    #[test]
    fn test_issue_derived_insufficient_leaves_balances_untouched() {
        let conversion = conv(12);
        let mut acct = account(2, 3);
        let err = acct.issue_derived(28, &conversion).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                uom,
                requested,
                available,
                ..
            } => {
                assert_eq!(uom, "PACK");
                assert_eq!(requested, 28);
                assert_eq!(available, 27);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!((acct.base_qty, acct.derived_qty), (2, 3));
    }

    #[test]
    fn test_issue_derived_no_base_to_borrow() {
        // factor 10, base 0, derived 5: a request of 6 needs one base
        // unit that isn't there.
        let conversion = conv(10);
        let mut acct = account(0, 5);
        let err = acct.issue_derived(6, &conversion).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!((acct.base_qty, acct.derived_qty), (0, 5));
    }

    #[test]
    fn test_issue_derived_factor_one() {
        // factor 1: base and derived units are interchangeable 1:1,
        // borrowing banks no leftover.
        let conversion = conv(1);
        let mut acct = account(5, 2);
        acct.issue_derived(6, &conversion).unwrap();
        assert_eq!((acct.base_qty, acct.derived_qty), (1, 0));
    }

    #[test]
    fn test_apply_movement_dispatch() {
        let conversion = conv(12);

        let mut acct = account(0, 0);
        acct.apply_movement(&conversion, MovementDirection::Inflow, 50, "each")
            .unwrap();
        assert_eq!(acct.base_qty, 50);

        let moved = acct
            .apply_movement(&conversion, MovementDirection::Outflow, 10, "EACH")
            .unwrap();
        assert_eq!(moved.base_delta, -10);

        let moved = acct
            .apply_movement(&conversion, MovementDirection::Outflow, 15, "pack")
            .unwrap();
        assert_eq!(moved.base_converted, 2);
        assert_eq!(moved.unit_kind, UnitKind::Derived);
        assert_eq!((acct.base_qty, acct.derived_qty), (38, 9));
    }

    #[test]
    fn test_apply_movement_unknown_unit() {
        let conversion = conv(12);
        let mut acct = account(10, 10);
        let err = acct
            .apply_movement(&conversion, MovementDirection::Outflow, 1, "CRATE")
            .unwrap_err();
        match err {
            CoreError::InvalidUnit { uom, expected, .. } => {
                assert_eq!(uom, "CRATE");
                assert_eq!(expected, vec!["EACH", "PACK"]);
            }
            other => panic!("expected InvalidUnit, got {other:?}"),
        }
        assert_eq!((acct.base_qty, acct.derived_qty), (10, 10));
    }

    #[test]
    fn test_apply_movement_rejects_derived_inflow() {
        let conversion = conv(12);
        let mut acct = account(10, 10);
        let err = acct
            .apply_movement(&conversion, MovementDirection::Inflow, 5, "PACK")
            .unwrap_err();
        match err {
            CoreError::InvalidUnit { expected, .. } => {
                assert_eq!(expected, vec!["EACH"]);
            }
            other => panic!("expected InvalidUnit, got {other:?}"),
        }
        assert_eq!((acct.base_qty, acct.derived_qty), (10, 10));
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        let conversion = conv(12);
        let mut acct = account(10, 10);
        assert!(acct.receive_base(0).is_err());
        assert!(acct.receive_base(-5).is_err());
        assert!(acct.issue_base(0, &conversion).is_err());
        assert!(acct.issue_derived(-1, &conversion).is_err());
        assert_eq!((acct.base_qty, acct.derived_qty), (10, 10));
    }

    #[test]
    fn test_set_base_and_derived() {
        let mut acct = account(10, 4);
        let moved = acct.set_base(25).unwrap();
        assert_eq!(moved.base_delta, 15);
        assert_eq!(acct.base_qty, 25);

        let moved = acct.set_derived(1).unwrap();
        assert_eq!(moved.derived_delta, -3);
        assert_eq!(acct.derived_qty, 1);

        // Setting to the current value is a zero delta.
        let moved = acct.set_base(25).unwrap();
        assert_eq!(moved.base_delta, 0);
    }

    #[test]
    fn test_set_rejects_negative_target() {
        let mut acct = account(10, 4);
        assert!(acct.set_base(-1).is_err());
        assert!(acct.set_derived(-10).is_err());
        assert_eq!((acct.base_qty, acct.derived_qty), (10, 4));
    }

    #[test]
    fn test_coverable_derived() {
        let conversion = conv(12);
        assert_eq!(account(2, 3).coverable_derived(&conversion), 27);
        assert_eq!(account(0, 5).coverable_derived(&conversion), 5);
        assert_eq!(account(0, 0).coverable_derived(&conversion), 0);
    }

    // =========================================================================
    // Property Tests
    // =========================================================================

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn balance_strategy() -> impl Strategy<Value = i64> {
            0i64..=10_000
        }

        fn factor_strategy() -> impl Strategy<Value = i64> {
            1i64..=1_000
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            /// Issuing derived units either conserves factor-weighted
            /// stock exactly, or fails leaving the account untouched.
            #[test]
            fn prop_issue_derived_conserves_stock(
                base in balance_strategy(),
                derived in balance_strategy(),
                factor in factor_strategy(),
                need in 1i64..=50_000,
            ) {
                let conversion = conv(factor);
                let mut acct = StockAccount::new("P-1", base, derived, 0);
                let before = acct.coverable_derived(&conversion);

                match acct.issue_derived(need, &conversion) {
                    Ok(moved) => {
                        let after = acct.coverable_derived(&conversion);
                        prop_assert_eq!(before - after, need);
                        prop_assert_eq!(
                            moved.base_delta * factor + moved.derived_delta,
                            -need
                        );
                    }
                    Err(_) => {
                        prop_assert_eq!(acct.base_qty, base);
                        prop_assert_eq!(acct.derived_qty, derived);
                        prop_assert!(need > before);
                    }
                }
            }

            /// Balances never go negative, whatever is requested.
            #[test]
            fn prop_balances_never_negative(
                base in balance_strategy(),
                derived in balance_strategy(),
                factor in factor_strategy(),
                need in 1i64..=50_000,
            ) {
                let conversion = conv(factor);
                let mut acct = StockAccount::new("P-1", base, derived, 0);
                let _ = acct.issue_derived(need, &conversion);
                prop_assert!(acct.base_qty >= 0);
                prop_assert!(acct.derived_qty >= 0);

                let _ = acct.issue_base(need, &conversion);
                prop_assert!(acct.base_qty >= 0);
                prop_assert!(acct.derived_qty >= 0);
            }

            /// A request within the coverable total always succeeds.
            #[test]
            fn prop_coverable_requests_succeed(
                base in balance_strategy(),
                derived in balance_strategy(),
                factor in factor_strategy(),
            ) {
                let conversion = conv(factor);
                let mut acct = StockAccount::new("P-1", base, derived, 0);
                let coverable = acct.coverable_derived(&conversion);
                prop_assume!(coverable > 0);

                prop_assert!(acct.issue_derived(coverable, &conversion).is_ok());
                prop_assert_eq!(acct.coverable_derived(&conversion), 0);
            }

            /// Receiving then issuing the same base quantity is a no-op.
            #[test]
            fn prop_receive_issue_roundtrip(
                base in balance_strategy(),
                qty in 1i64..=10_000,
            ) {
                let conversion = conv(12);
                let mut acct = StockAccount::new("P-1", base, 0, 0);
                acct.receive_base(qty).unwrap();
                acct.issue_base(qty, &conversion).unwrap();
                prop_assert_eq!(acct.base_qty, base);
            }
        }
    }
}
