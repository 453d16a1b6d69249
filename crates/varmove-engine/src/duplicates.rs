//! Duplicate resolution: which candidates may move, which collide.

use std::collections::HashSet;

use varmove_document::Variable;

/// Outcome of partitioning a candidate set against a destination's names.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Candidates whose names are free in the destination, in input order.
    pub movable: Vec<Variable>,
    /// Candidates whose names already exist in the destination, in input
    /// order. Reported, never mutated.
    pub blocked: Vec<Variable>,
}

/// Partition candidates into movable vs. name-colliding.
///
/// A candidate is blocked iff its exact name is present in
/// `destination_names`; no case folding, no renaming to disambiguate.
/// Collisions are resolved by exclusion only; a blocked variable never
/// proceeds into a move.
pub fn partition(candidates: Vec<Variable>, destination_names: &HashSet<String>) -> Partition {
    let mut result = Partition::default();
    for candidate in candidates {
        if destination_names.contains(&candidate.name) {
            result.blocked.push(candidate);
        } else {
            result.movable.push(candidate);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use varmove_document::{CollectionId, ResolvedType, Variable, VariableId};

    fn variable(name: &str) -> Variable {
        Variable {
            id: VariableId::new(format!("var:{name}")),
            name: name.to_string(),
            collection_id: CollectionId::new("col:1"),
            resolved_type: ResolvedType::Color,
            description: String::new(),
            hidden_from_publishing: false,
            scopes: Vec::new(),
            code_syntax: BTreeMap::new(),
            values_by_mode: Vec::new(),
        }
    }

    #[test]
    fn blocks_exact_name_collisions_only() {
        let candidates = vec![variable("primary"), variable("secondary")];
        let names = HashSet::from(["primary".to_string()]);

        let result = partition(candidates, &names);

        assert_eq!(result.movable.len(), 1);
        assert_eq!(result.movable[0].name, "secondary");
        assert_eq!(result.blocked.len(), 1);
        assert_eq!(result.blocked[0].name, "primary");
    }

    #[test]
    fn no_case_folding() {
        let candidates = vec![variable("Primary")];
        let names = HashSet::from(["primary".to_string()]);

        let result = partition(candidates, &names);

        assert_eq!(result.movable.len(), 1);
        assert!(result.blocked.is_empty());
    }

    #[test]
    fn preserves_input_order_in_both_outputs() {
        let candidates = vec![
            variable("a"),
            variable("x"),
            variable("b"),
            variable("y"),
            variable("c"),
        ];
        let names = HashSet::from(["x".to_string(), "y".to_string()]);

        let result = partition(candidates, &names);

        let movable: Vec<&str> = result.movable.iter().map(|v| v.name.as_str()).collect();
        let blocked: Vec<&str> = result.blocked.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(movable, vec!["a", "b", "c"]);
        assert_eq!(blocked, vec!["x", "y"]);
    }

    proptest! {
        // With no collisions, everything moves.
        #[test]
        fn all_movable_without_collisions(names in prop::collection::hash_set("[a-z]{1,8}", 0..20)) {
            let candidates: Vec<Variable> = names.iter().map(|n| variable(n)).collect();
            let result = partition(candidates.clone(), &HashSet::new());
            prop_assert_eq!(result.movable.len(), candidates.len());
            prop_assert!(result.blocked.is_empty());
        }

        // With every name colliding, nothing moves.
        #[test]
        fn all_blocked_with_full_collision(names in prop::collection::hash_set("[a-z]{1,8}", 0..20)) {
            let candidates: Vec<Variable> = names.iter().map(|n| variable(n)).collect();
            let destination: HashSet<String> = names.iter().cloned().collect();
            let result = partition(candidates.clone(), &destination);
            prop_assert!(result.movable.is_empty());
            prop_assert_eq!(result.blocked.len(), candidates.len());
        }

        // Partition never drops or invents candidates.
        #[test]
        fn partition_is_exhaustive(
            names in prop::collection::vec("[a-z]{1,8}", 0..20),
            destination in prop::collection::hash_set("[a-z]{1,8}", 0..20),
        ) {
            let candidates: Vec<Variable> = names.iter().map(|n| variable(n)).collect();
            let total = candidates.len();
            let result = partition(candidates, &destination);
            prop_assert_eq!(result.movable.len() + result.blocked.len(), total);
        }
    }
}
