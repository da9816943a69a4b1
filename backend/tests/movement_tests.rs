//! Stock movement tests
//!
//! Tests for quantity-changing ledger operations including:
//! - Property 1: Ledger Sum Consistency
//! - Property 2: Non-Negative Stock
//! - Property 3: Contended Write Retry Bound

use proptest::prelude::*;
use shared::{apply_movement, ChangeType, MovementError};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test a realistic restock-and-sell day
    #[test]
    fn test_restock_and_sell_sequence() {
        let mut quantity = 12;

        quantity = apply_movement(ChangeType::Inbound, quantity, 48).unwrap();
        assert_eq!(quantity, 60);

        quantity = apply_movement(ChangeType::Outbound, quantity, 15).unwrap();
        assert_eq!(quantity, 45);

        quantity = apply_movement(ChangeType::Outbound, quantity, 45).unwrap();
        assert_eq!(quantity, 0);
    }

    /// Test overselling is refused with the available amount reported
    #[test]
    fn test_outbound_cannot_exceed_available() {
        let result = apply_movement(ChangeType::Outbound, 7, 8);
        assert_eq!(
            result,
            Err(MovementError::InsufficientStock {
                available: 7,
                requested: 8
            })
        );
    }

    /// Test a physical recount replaces the stored quantity outright
    #[test]
    fn test_recount_sets_absolute_quantity() {
        assert_eq!(apply_movement(ChangeType::Adjustment, 120, 97), Ok(97));
        assert_eq!(apply_movement(ChangeType::Adjustment, 3, 250), Ok(250));
        // Counting down to nothing is a valid recount
        assert_eq!(apply_movement(ChangeType::Adjustment, 3, 0), Ok(0));
    }

    /// Test zero and negative delta amounts are rejected
    #[test]
    fn test_delta_amounts_must_be_positive() {
        for change in [ChangeType::Inbound, ChangeType::Outbound] {
            assert_eq!(
                apply_movement(change, 10, 0),
                Err(MovementError::NonPositiveAmount)
            );
            assert_eq!(
                apply_movement(change, 10, -4),
                Err(MovementError::NonPositiveAmount)
            );
        }
    }

    /// Test which change types the movement endpoint accepts
    #[test]
    fn test_stock_movement_type_matrix() {
        assert!(ChangeType::Inbound.is_stock_movement());
        assert!(ChangeType::Outbound.is_stock_movement());
        assert!(ChangeType::Adjustment.is_stock_movement());

        assert!(!ChangeType::NameEdit.is_stock_movement());
        assert!(!ChangeType::DescriptionEdit.is_stock_movement());
        assert!(!ChangeType::PriceEdit.is_stock_movement());
        assert!(!ChangeType::Deletion.is_stock_movement());
    }

    /// Test edit types cannot be smuggled through the quantity path
    #[test]
    fn test_edit_types_never_move_stock() {
        for change in [
            ChangeType::NameEdit,
            ChangeType::DescriptionEdit,
            ChangeType::PriceEdit,
            ChangeType::Deletion,
        ] {
            assert_eq!(
                apply_movement(change, 10, 5),
                Err(MovementError::NotAQuantityChange(change))
            );
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for movement types the stock endpoint accepts
    fn movement_type_strategy() -> impl Strategy<Value = ChangeType> {
        prop_oneof![
            Just(ChangeType::Inbound),
            Just(ChangeType::Outbound),
            Just(ChangeType::Adjustment),
        ]
    }

    /// Strategy for requested amounts, including invalid ones
    fn amount_strategy() -> impl Strategy<Value = i64> {
        -100i64..=500
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property 2: Non-Negative Stock
        /// No accepted movement sequence ever drives a quantity below zero
        #[test]
        fn prop_accepted_movements_never_go_negative(
            initial in 0i64..=200,
            moves in prop::collection::vec((movement_type_strategy(), amount_strategy()), 1..30)
        ) {
            let mut quantity = initial;

            for (change, amount) in moves {
                if let Ok(next) = apply_movement(change, quantity, amount) {
                    quantity = next;
                }
                prop_assert!(quantity >= 0);
            }
        }

        /// Property 2: A rejected movement leaves the quantity untouched
        #[test]
        fn prop_rejected_movement_changes_nothing(
            quantity in 0i64..=200,
            amount in amount_strategy(),
            change in movement_type_strategy()
        ) {
            let before = quantity;
            let after = match apply_movement(change, quantity, amount) {
                Ok(next) => next,
                Err(_) => quantity,
            };

            if apply_movement(change, before, amount).is_err() {
                prop_assert_eq!(after, before);
            }
        }

        /// Property 1: Ledger Sum Consistency
        /// Final quantity = initial + sum of signed deltas over recorded entries
        #[test]
        fn prop_ledger_sum_matches_final_quantity(
            initial in 0i64..=200,
            moves in prop::collection::vec((movement_type_strategy(), amount_strategy()), 1..30)
        ) {
            let mut quantity = initial;
            let mut entries: Vec<(i64, i64)> = Vec::new();

            for (change, amount) in moves {
                if let Ok(next) = apply_movement(change, quantity, amount) {
                    entries.push((quantity, next));
                    quantity = next;
                }
            }

            let delta_sum: i64 = entries.iter().map(|(prev, new)| new - prev).sum();
            prop_assert_eq!(initial + delta_sum, quantity);

            // Entries chain: each one starts where the previous ended
            let mut cursor = initial;
            for (prev, new) in &entries {
                prop_assert_eq!(*prev, cursor);
                cursor = *new;
            }
        }

        /// Property: Outbound never withdraws more than is available
        #[test]
        fn prop_outbound_bounded_by_available(
            quantity in 0i64..=200,
            amount in 1i64..=300
        ) {
            match apply_movement(ChangeType::Outbound, quantity, amount) {
                Ok(next) => {
                    prop_assert!(amount <= quantity);
                    prop_assert_eq!(next, quantity - amount);
                }
                Err(MovementError::InsufficientStock { available, requested }) => {
                    prop_assert_eq!(available, quantity);
                    prop_assert_eq!(requested, amount);
                    prop_assert!(amount > quantity);
                }
                Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
            }
        }

        /// Property: Repeating the same recount is a no-op
        #[test]
        fn prop_recount_is_idempotent(
            quantity in 0i64..=200,
            target in 0i64..=200
        ) {
            let once = apply_movement(ChangeType::Adjustment, quantity, target).unwrap();
            let twice = apply_movement(ChangeType::Adjustment, once, target).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}

// ============================================================================
// Integration Test Helpers (for use with actual database)
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    /// Writes retry on a stale compare-and-set up to this many times
    const MAX_ATTEMPTS: u32 = 3;

    /// One recorded ledger line: the quantity before and after a change
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LedgerLine {
        pub previous_quantity: i64,
        pub new_quantity: i64,
    }

    /// Simulate applying a movement and recording the resulting ledger line
    pub fn simulate_ledgered_movement(
        current: i64,
        change: ChangeType,
        amount: i64,
    ) -> Result<LedgerLine, MovementError> {
        let next = apply_movement(change, current, amount)?;
        Ok(LedgerLine {
            previous_quantity: current,
            new_quantity: next,
        })
    }

    /// Property 3: Contended Write Retry Bound
    ///
    /// Simulate the optimistic write loop: `collisions[i]` says whether a
    /// concurrent writer invalidated attempt `i`. Returns the attempt that
    /// succeeded, or an error once the bound is exhausted.
    pub fn simulate_contended_write(collisions: &[bool]) -> Result<u32, &'static str> {
        for attempt in 1..=MAX_ATTEMPTS {
            let collided = collisions
                .get((attempt - 1) as usize)
                .copied()
                .unwrap_or(false);
            if !collided {
                return Ok(attempt);
            }
        }
        Err("conflicting writes, gave up")
    }

    #[test]
    fn test_ledger_line_records_transition() {
        let line = simulate_ledgered_movement(50, ChangeType::Inbound, 20).unwrap();
        assert_eq!(line.previous_quantity, 50);
        assert_eq!(line.new_quantity, 70);
    }

    #[test]
    fn test_rejected_movement_records_nothing() {
        let result = simulate_ledgered_movement(5, ChangeType::Outbound, 6);
        assert!(result.is_err());
    }

    #[test]
    fn test_uncontended_write_succeeds_first_try() {
        assert_eq!(simulate_contended_write(&[]), Ok(1));
        assert_eq!(simulate_contended_write(&[false]), Ok(1));
    }

    #[test]
    fn test_contended_write_retries_then_succeeds() {
        assert_eq!(simulate_contended_write(&[true, false]), Ok(2));
        assert_eq!(simulate_contended_write(&[true, true, false]), Ok(3));
    }

    #[test]
    fn test_contended_write_gives_up_after_bound() {
        assert!(simulate_contended_write(&[true, true, true]).is_err());
        assert!(simulate_contended_write(&[true, true, true, false]).is_err());
    }
}
