//! Tests for composite product availability
//! Verifies Property 4: Scarcest Component Bound

use proptest::prelude::*;
use shared::{assemblable_units, RecipeError, RecipeLine};

fn line(available: i64, required_per_unit: i64) -> RecipeLine {
    RecipeLine {
        available,
        required_per_unit,
    }
}

// =============================================================================
// Property 4: Scarcest Component Bound
// Assemblable units = min over recipe lines of floor(available / required)
// =============================================================================

mod assembly_math {
    use super::*;

    #[test]
    fn two_component_recipe() {
        // 23 / 5 = 4 units from the first line, 41 / 10 = 4 from the second
        let recipe = [line(23, 5), line(41, 10)];
        assert_eq!(assemblable_units(&recipe), Ok(4));
    }

    #[test]
    fn scarcest_line_wins() {
        // 100 / 1 = 100, but 9 / 3 = 3 caps the result
        let recipe = [line(100, 1), line(9, 3)];
        assert_eq!(assemblable_units(&recipe), Ok(3));
    }

    #[test]
    fn division_floors_partial_units() {
        // 7 / 2 = 3.5 rounds down: a half-assembled unit does not count
        let recipe = [line(7, 2)];
        assert_eq!(assemblable_units(&recipe), Ok(3));
    }

    #[test]
    fn depleted_component_blocks_everything() {
        let recipe = [line(500, 1), line(0, 1)];
        assert_eq!(assemblable_units(&recipe), Ok(0));
    }

    #[test]
    fn recipe_without_lines_yields_zero() {
        assert_eq!(assemblable_units(&[]), Ok(0));
    }

    #[test]
    fn requirement_below_one_is_rejected() {
        assert_eq!(
            assemblable_units(&[line(10, 0)]),
            Err(RecipeError::NonPositiveRequirement)
        );
        assert_eq!(
            assemblable_units(&[line(10, -1)]),
            Err(RecipeError::NonPositiveRequirement)
        );
    }

    #[test]
    fn checking_availability_consumes_nothing() {
        // The computation reads component stock, it never reserves it
        let recipe = [line(23, 5), line(41, 10)];
        let first = assemblable_units(&recipe);
        let second = assemblable_units(&recipe);

        assert_eq!(first, Ok(4));
        assert_eq!(second, first);
    }
}

// =============================================================================
// Availability Properties
// =============================================================================

mod availability_properties {
    use super::*;

    fn recipe_strategy() -> impl Strategy<Value = Vec<RecipeLine>> {
        prop::collection::vec(
            (0i64..5_000, 1i64..40).prop_map(|(available, required_per_unit)| RecipeLine {
                available,
                required_per_unit,
            }),
            1..8,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every line can cover the reported unit count
        #[test]
        fn prop_units_feasible_for_every_line(recipe in recipe_strategy()) {
            let units = assemblable_units(&recipe).unwrap();

            prop_assert!(units >= 0);
            for l in &recipe {
                prop_assert!(units * l.required_per_unit <= l.available);
            }
        }

        /// Adding a recipe line never raises the unit count
        #[test]
        fn prop_extra_line_never_raises_units(
            recipe in recipe_strategy(),
            extra in (0i64..5_000, 1i64..40)
        ) {
            let base = assemblable_units(&recipe).unwrap();

            let mut extended = recipe.clone();
            extended.push(line(extra.0, extra.1));
            let with_extra = assemblable_units(&extended).unwrap();

            prop_assert!(with_extra <= base);
        }

        /// Restocking a component never lowers the unit count
        #[test]
        fn prop_restock_never_lowers_units(
            recipe in recipe_strategy(),
            slot in 0usize..8,
            restock in 1i64..1_000
        ) {
            let slot = slot % recipe.len();
            let base = assemblable_units(&recipe).unwrap();

            let mut restocked = recipe.clone();
            restocked[slot].available += restock;
            let after = assemblable_units(&restocked).unwrap();

            prop_assert!(after >= base);
        }

        /// Property 4: the result is maximal, one more unit would overdraw
        #[test]
        fn prop_one_more_unit_is_infeasible(recipe in recipe_strategy()) {
            let units = assemblable_units(&recipe).unwrap();

            prop_assert!(recipe
                .iter()
                .any(|l| (units + 1) * l.required_per_unit > l.available));
        }
    }
}

// =============================================================================
// Assembly Simulation (component stock bookkeeping)
// =============================================================================

// =============================================================================
// Deletion Guards (recipe references pin their components)
// =============================================================================

mod deletion_guards {
    /// Recipe line reference: which product (by area) uses which component
    /// (by area). Mirrors the checks run before a component, stock area or
    /// sector is deleted.
    #[derive(Clone, Copy)]
    struct RecipeRef {
        product_area: u32,
        component_area: u32,
    }

    /// A single component may go only when nothing references it.
    fn component_delete_allowed(refs: &[RecipeRef], component_area: u32) -> bool {
        !refs.iter().any(|r| r.component_area == component_area)
    }

    /// A whole area may go only when no surviving recipe references a
    /// contained component. Deleting an area removes its own products too,
    /// so their recipes do not pin it.
    fn area_delete_allowed(refs: &[RecipeRef], area: u32) -> bool {
        !refs
            .iter()
            .any(|r| r.component_area == area && r.product_area != area)
    }

    #[test]
    fn referenced_component_blocks_deletion() {
        let refs = [RecipeRef {
            product_area: 1,
            component_area: 2,
        }];

        assert!(!component_delete_allowed(&refs, 2));
        assert!(component_delete_allowed(&refs, 3));
    }

    #[test]
    fn area_with_outside_recipe_references_cannot_be_deleted() {
        // A product in area 1 consumes a component stored in area 2:
        // removing area 2 would silently change that product's availability
        let refs = [RecipeRef {
            product_area: 1,
            component_area: 2,
        }];

        assert!(!area_delete_allowed(&refs, 2));
    }

    #[test]
    fn self_contained_area_can_be_deleted() {
        // Product and its components live in the same area; both go together
        let refs = [RecipeRef {
            product_area: 1,
            component_area: 1,
        }];

        assert!(area_delete_allowed(&refs, 1));
    }

    #[test]
    fn unrelated_references_do_not_block() {
        let refs = [RecipeRef {
            product_area: 1,
            component_area: 2,
        }];

        assert!(area_delete_allowed(&refs, 3));
    }
}

mod assembly_simulation {
    use super::*;

    /// Deduct the components needed for `units` assembled products.
    /// Returns the remaining stock per line, or None if any line runs short.
    pub fn simulate_assembly(recipe: &[RecipeLine], units: i64) -> Option<Vec<i64>> {
        let mut remaining = Vec::with_capacity(recipe.len());
        for l in recipe {
            let needed = units * l.required_per_unit;
            if needed > l.available {
                return None;
            }
            remaining.push(l.available - needed);
        }
        Some(remaining)
    }

    #[test]
    fn assembling_reported_units_is_feasible() {
        let recipe = [line(23, 5), line(41, 10)];
        let units = assemblable_units(&recipe).unwrap();

        let remaining = simulate_assembly(&recipe, units).unwrap();
        assert_eq!(remaining, vec![3, 1]);
    }

    #[test]
    fn assembling_one_more_unit_runs_short() {
        let recipe = [line(23, 5), line(41, 10)];
        let units = assemblable_units(&recipe).unwrap();

        assert!(simulate_assembly(&recipe, units + 1).is_none());
    }

    #[test]
    fn assembling_zero_units_changes_nothing() {
        let recipe = [line(23, 5), line(41, 10)];
        let remaining = simulate_assembly(&recipe, 0).unwrap();
        assert_eq!(remaining, vec![23, 41]);
    }
}
