//! Deterministic node-id ordering.
//!
//! Resolved output ids are sorted before submission so that logging,
//! debugging, and test assertions are reproducible across runs with
//! identical inputs. The order has no effect on how the engine executes
//! the nodes inside one submission.

use std::cmp::Ordering;

use crate::types::NodeId;

/// Compare two node ids numerically when both parse as integers,
/// otherwise lexicographically.
///
/// Most graphs use decimal ids, where `"10"` should sort after `"9"`;
/// the string fallback keeps the comparator total for graphs that use
/// arbitrary ids.
pub fn compare_node_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.cmp(b),
    }
}

/// Sort node ids in place with [`compare_node_ids`].
pub fn sort_node_ids(ids: &mut Vec<NodeId>) {
    ids.sort_by(|a, b| compare_node_ids(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(ids: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        sort_node_ids(&mut v);
        v
    }

    #[test]
    fn numeric_ids_sort_numerically() {
        assert_eq!(sorted(&["10", "2", "1"]), vec!["1", "2", "10"]);
    }

    #[test]
    fn non_numeric_ids_sort_lexicographically() {
        assert_eq!(sorted(&["beta", "alpha"]), vec!["alpha", "beta"]);
    }

    #[test]
    fn mixed_ids_fall_back_to_string_order() {
        // "10" vs "node-a": one side fails to parse, so both compare as
        // strings.
        assert_eq!(compare_node_ids("10", "node-a"), Ordering::Less);
        assert_eq!(compare_node_ids("node-a", "10"), Ordering::Greater);
    }

    #[test]
    fn equal_ids_compare_equal() {
        assert_eq!(compare_node_ids("7", "7"), Ordering::Equal);
        assert_eq!(compare_node_ids("x", "x"), Ordering::Equal);
    }

    #[test]
    fn negative_ids_compare_numerically() {
        assert_eq!(compare_node_ids("-3", "2"), Ordering::Less);
    }

    #[test]
    fn sorting_is_deterministic_across_invocations() {
        let input = ["9", "100", "21", "3", "alpha", "10"];
        let first = sorted(&input);
        for _ in 0..10 {
            assert_eq!(sorted(&input), first);
        }
    }
}
