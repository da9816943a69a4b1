//! Composite product recipes and availability math.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One recipe line of a composite product: how much of a component is on
/// hand and how much a single unit of the product consumes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecipeLine {
    pub available: i64,
    pub required_per_unit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("required quantity per unit must be at least 1")]
    NonPositiveRequirement,
}

/// How many units of a composite product can be assembled right now: the
/// minimum over all recipe lines of `available / required_per_unit`
/// (integer division). A product with no recipe lines yields zero.
pub fn assemblable_units(lines: &[RecipeLine]) -> Result<i64, RecipeError> {
    if lines.is_empty() {
        return Ok(0);
    }

    let mut units = i64::MAX;
    for line in lines {
        if line.required_per_unit <= 0 {
            return Err(RecipeError::NonPositiveRequirement);
        }
        units = units.min(line.available / line.required_per_unit);
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(available: i64, required_per_unit: i64) -> RecipeLine {
        RecipeLine {
            available,
            required_per_unit,
        }
    }

    #[test]
    fn test_scarcest_component_limits_assembly() {
        // 10/5 = 2 units from the first line, 41/23 = 1 from the second
        let lines = [line(10, 5), line(41, 23)];
        assert_eq!(assemblable_units(&lines), Ok(1));
    }

    #[test]
    fn test_exact_division() {
        let lines = [line(12, 3), line(8, 2)];
        assert_eq!(assemblable_units(&lines), Ok(4));
    }

    #[test]
    fn test_empty_recipe_yields_zero() {
        assert_eq!(assemblable_units(&[]), Ok(0));
    }

    #[test]
    fn test_depleted_component_blocks_assembly() {
        let lines = [line(0, 1), line(100, 1)];
        assert_eq!(assemblable_units(&lines), Ok(0));
    }

    #[test]
    fn test_non_positive_requirement_is_rejected() {
        assert_eq!(
            assemblable_units(&[line(10, 0)]),
            Err(RecipeError::NonPositiveRequirement)
        );
        assert_eq!(
            assemblable_units(&[line(10, -2)]),
            Err(RecipeError::NonPositiveRequirement)
        );
    }

    proptest! {
        /// The computed unit count is feasible (no line is overdrawn) and
        /// maximal (one more unit would overdraw some line).
        #[test]
        fn prop_assemblable_units_is_max_feasible(
            lines in prop::collection::vec((0i64..10_000, 1i64..50), 1..10)
        ) {
            let lines: Vec<RecipeLine> = lines
                .into_iter()
                .map(|(available, required_per_unit)| RecipeLine { available, required_per_unit })
                .collect();

            let units = assemblable_units(&lines).unwrap();
            prop_assert!(units >= 0);
            for l in &lines {
                prop_assert!(units * l.required_per_unit <= l.available);
            }
            prop_assert!(lines
                .iter()
                .any(|l| (units + 1) * l.required_per_unit > l.available));
        }
    }
}
