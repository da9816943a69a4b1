//! Stock ledger vocabulary and movement arithmetic.
//!
//! Every mutation of a product or stock component is recorded as a ledger
//! entry carrying the quantity before and after the change. The functions
//! here decide what a movement does to a quantity; persistence and retry
//! live in the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// What a ledger entry records. Movement types change the stored quantity,
/// edit types snapshot a descriptive change with `previous == new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Inbound,
    Outbound,
    Adjustment,
    NameEdit,
    DescriptionEdit,
    PriceEdit,
    Deletion,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Inbound => "inbound",
            ChangeType::Outbound => "outbound",
            ChangeType::Adjustment => "adjustment",
            ChangeType::NameEdit => "name_edit",
            ChangeType::DescriptionEdit => "description_edit",
            ChangeType::PriceEdit => "price_edit",
            ChangeType::Deletion => "deletion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inbound" => Some(ChangeType::Inbound),
            "outbound" => Some(ChangeType::Outbound),
            "adjustment" => Some(ChangeType::Adjustment),
            "name_edit" => Some(ChangeType::NameEdit),
            "description_edit" => Some(ChangeType::DescriptionEdit),
            "price_edit" => Some(ChangeType::PriceEdit),
            "deletion" => Some(ChangeType::Deletion),
            _ => None,
        }
    }

    /// Types a client may request through the stock movement endpoint.
    /// Edits and deletions are recorded by their own operations.
    pub fn is_stock_movement(&self) -> bool {
        matches!(
            self,
            ChangeType::Inbound | ChangeType::Outbound | ChangeType::Adjustment
        )
    }
}

/// What kind of entity a ledger entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Product,
    Component,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Product => "product",
            SubjectKind::Component => "component",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(SubjectKind::Product),
            "component" => Some(SubjectKind::Component),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MovementError {
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },
    #[error("movement amount must be greater than zero")]
    NonPositiveAmount,
    #[error("adjusted quantity cannot be negative")]
    NegativeTarget,
    #[error("resulting quantity exceeds the storable range")]
    QuantityOverflow,
    #[error("change type {0:?} does not move stock")]
    NotAQuantityChange(ChangeType),
}

/// Compute the quantity after applying a movement to `previous`.
///
/// Inbound and outbound amounts are deltas and must be positive; outbound
/// never drives a quantity below zero. An adjustment amount is the absolute
/// quantity to set, so zero is allowed.
pub fn apply_movement(
    change: ChangeType,
    previous: i64,
    amount: i64,
) -> Result<i64, MovementError> {
    match change {
        ChangeType::Inbound => {
            if amount <= 0 {
                return Err(MovementError::NonPositiveAmount);
            }
            previous
                .checked_add(amount)
                .ok_or(MovementError::QuantityOverflow)
        }
        ChangeType::Outbound => {
            if amount <= 0 {
                return Err(MovementError::NonPositiveAmount);
            }
            if amount > previous {
                return Err(MovementError::InsufficientStock {
                    available: previous,
                    requested: amount,
                });
            }
            Ok(previous - amount)
        }
        ChangeType::Adjustment => {
            if amount < 0 {
                return Err(MovementError::NegativeTarget);
            }
            Ok(amount)
        }
        other => Err(MovementError::NotAQuantityChange(other)),
    }
}

/// A ledger entry as the reporting fold sees it. `subject_id` is `None`
/// once the subject has been deleted; `subject_name` keeps the entry
/// readable after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRecord {
    pub subject_id: Option<Uuid>,
    pub subject_kind: SubjectKind,
    pub subject_name: Option<String>,
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub description: Option<String>,
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MovementRecord {
    pub fn signed_delta(&self) -> i64 {
        self.new_quantity - self.previous_quantity
    }

    /// Moved quantity regardless of direction. Zero for descriptive edits.
    pub fn magnitude(&self) -> i64 {
        self.signed_delta().abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_adds_to_previous() {
        assert_eq!(apply_movement(ChangeType::Inbound, 10, 5), Ok(15));
        assert_eq!(apply_movement(ChangeType::Inbound, 0, 1), Ok(1));
    }

    #[test]
    fn test_inbound_rejects_non_positive_amounts() {
        assert_eq!(
            apply_movement(ChangeType::Inbound, 10, 0),
            Err(MovementError::NonPositiveAmount)
        );
        assert_eq!(
            apply_movement(ChangeType::Inbound, 10, -5),
            Err(MovementError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_inbound_rejects_overflowing_amounts() {
        assert_eq!(
            apply_movement(ChangeType::Inbound, i64::MAX, 1),
            Err(MovementError::QuantityOverflow)
        );
        assert_eq!(
            apply_movement(ChangeType::Inbound, i64::MAX - 1, 1),
            Ok(i64::MAX)
        );
    }

    #[test]
    fn test_outbound_subtracts_and_guards_zero_floor() {
        assert_eq!(apply_movement(ChangeType::Outbound, 10, 4), Ok(6));
        assert_eq!(apply_movement(ChangeType::Outbound, 10, 10), Ok(0));
        assert_eq!(
            apply_movement(ChangeType::Outbound, 10, 11),
            Err(MovementError::InsufficientStock {
                available: 10,
                requested: 11
            })
        );
    }

    #[test]
    fn test_adjustment_sets_absolute_quantity() {
        assert_eq!(apply_movement(ChangeType::Adjustment, 10, 3), Ok(3));
        assert_eq!(apply_movement(ChangeType::Adjustment, 10, 0), Ok(0));
        assert_eq!(apply_movement(ChangeType::Adjustment, 0, 250), Ok(250));
        assert_eq!(
            apply_movement(ChangeType::Adjustment, 10, -1),
            Err(MovementError::NegativeTarget)
        );
    }

    #[test]
    fn test_descriptive_types_do_not_move_stock() {
        for change in [
            ChangeType::NameEdit,
            ChangeType::DescriptionEdit,
            ChangeType::PriceEdit,
            ChangeType::Deletion,
        ] {
            assert!(!change.is_stock_movement());
            assert_eq!(
                apply_movement(change, 10, 5),
                Err(MovementError::NotAQuantityChange(change))
            );
        }
    }

    #[test]
    fn test_change_type_round_trips_through_str() {
        for change in [
            ChangeType::Inbound,
            ChangeType::Outbound,
            ChangeType::Adjustment,
            ChangeType::NameEdit,
            ChangeType::DescriptionEdit,
            ChangeType::PriceEdit,
            ChangeType::Deletion,
        ] {
            assert_eq!(ChangeType::parse(change.as_str()), Some(change));
        }
        assert_eq!(ChangeType::parse("entrada"), None);
    }
}
