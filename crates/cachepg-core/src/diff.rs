use crate::parameter::{Parameter, ParameterSet};

/// The changes needed to move a group from an old parameter set to a new one.
///
/// Membership compares the full (name, value) pair, so changing only a value
/// shows up as one removal plus one addition. Removals are reset to the
/// engine default; additions are set explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDiff {
    pub to_remove: Vec<Parameter>,
    pub to_add: Vec<Parameter>,
}

impl ParameterDiff {
    pub fn between(old: &ParameterSet, new: &ParameterSet) -> Self {
        Self {
            to_remove: old.difference(new),
            to_add: new.difference(old),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> ParameterSet {
        pairs.iter().map(|(n, v)| Parameter::new(n, *v)).collect()
    }

    #[test]
    fn remove_and_add() {
        let old = set(&[("a", "1"), ("b", "2")]);
        let new = set(&[("b", "2"), ("c", "3")]);

        let diff = ParameterDiff::between(&old, &new);
        assert_eq!(diff.to_remove, vec![Parameter::new("a", "1")]);
        assert_eq!(diff.to_add, vec![Parameter::new("c", "3")]);
    }

    #[test]
    fn value_change_is_remove_plus_add() {
        let old = set(&[("maxmemory-policy", "volatile-lru")]);
        let new = set(&[("maxmemory-policy", "allkeys-lru")]);

        let diff = ParameterDiff::between(&old, &new);
        assert_eq!(
            diff.to_remove,
            vec![Parameter::new("maxmemory-policy", "volatile-lru")]
        );
        assert_eq!(
            diff.to_add,
            vec![Parameter::new("maxmemory-policy", "allkeys-lru")]
        );
    }

    #[test]
    fn identical_sets_have_no_changes() {
        let old = set(&[("timeout", "300"), ("tcp-keepalive", "60")]);
        let diff = ParameterDiff::between(&old, &old.clone());
        assert!(diff.is_empty());
    }

    #[test]
    fn removals_and_additions_are_disjoint_and_cover_new() {
        let cases = [
            (set(&[]), set(&[("a", "1")])),
            (set(&[("a", "1")]), set(&[])),
            (set(&[("a", "1"), ("b", "2")]), set(&[("a", "2"), ("b", "2")])),
            (
                set(&[("a", "1"), ("b", "2"), ("c", "3")]),
                set(&[("c", "3"), ("d", "4"), ("A", "1")]),
            ),
        ];

        for (old, new) in &cases {
            let diff = ParameterDiff::between(old, new);

            for removed in &diff.to_remove {
                assert!(!diff.to_add.contains(removed), "{removed} in both halves");
                assert!(old.contains(removed));
                assert!(!new.contains(removed));
            }

            // old + additions must cover everything in new
            for p in new {
                assert!(old.contains(p) || diff.to_add.contains(p), "{p} not covered");
            }
        }
    }
}
