//! Set reconciliation for managed collections (natures, build commands).
//!
//! The same calculation runs for every managed aspect: given the current
//! workspace state, the state the build model wants, and the subset we
//! created last time, compute what to apply next and what we now own.
//! Elements only the user added are never removed.

/// Outcome of one merge calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult<T> {
    /// The state to apply: every model element first, in model order, then
    /// surviving user elements in their current order.
    pub next_elements: Vec<T>,
    /// The managed set to persist for the next pass.
    pub next_managed: Vec<T>,
}

/// Reconcile `current` against `model`, treating `managed` as the elements
/// this engine added on a previous pass.
///
/// An element in both `model` and `managed` but absent from `current` counts
/// as newly re-added and stays managed.
pub fn calculate<T: Clone + PartialEq>(
    current: &[T],
    model: &[T],
    managed: &[T],
) -> MergeResult<T> {
    let missing: Vec<T> = current
        .iter()
        .filter(|e| !model.contains(e))
        .cloned()
        .collect();
    let removed_now: Vec<T> = missing
        .iter()
        .filter(|e| managed.contains(e))
        .cloned()
        .collect();
    let kept_user: Vec<T> = missing
        .iter()
        .filter(|e| !removed_now.contains(e))
        .cloned()
        .collect();
    let added: Vec<T> = model
        .iter()
        .filter(|e| !current.contains(e))
        .cloned()
        .collect();

    let mut next_elements: Vec<T> = Vec::with_capacity(model.len() + kept_user.len());
    for element in model {
        if !next_elements.contains(element) {
            next_elements.push(element.clone());
        }
    }
    for element in kept_user {
        if !next_elements.contains(&element) {
            next_elements.push(element);
        }
    }

    let mut next_managed: Vec<T> = Vec::with_capacity(managed.len() + added.len());
    for element in managed.iter().chain(added.iter()) {
        if !removed_now.contains(element) && !next_managed.contains(element) {
            next_managed.push(element.clone());
        }
    }

    MergeResult {
        next_elements,
        next_managed,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn user_additions_survive_a_model_that_never_claimed_them() {
        let result = calculate(&s(&["java", "custom"]), &s(&["java"]), &s(&["java"]));
        assert_eq!(result.next_elements, s(&["java", "custom"]));
        assert_eq!(result.next_managed, s(&["java"]));
    }

    #[test]
    fn managed_elements_dropped_by_the_model_are_removed() {
        let result = calculate(&s(&["java", "old"]), &s(&["java"]), &s(&["java", "old"]));
        assert_eq!(result.next_elements, s(&["java"]));
        assert_eq!(result.next_managed, s(&["java"]));
    }

    #[test]
    fn new_model_elements_become_managed() {
        let result = calculate(&s(&["custom"]), &s(&["java", "groovy"]), &[]);
        assert_eq!(result.next_elements, s(&["java", "groovy", "custom"]));
        assert_eq!(result.next_managed, s(&["java", "groovy"]));
    }

    #[test]
    fn element_in_model_and_managed_but_not_current_is_re_added() {
        // The user removed it by hand, but the model still wants it.
        let result = calculate(&[], &s(&["java"]), &s(&["java"]));
        assert_eq!(result.next_elements, s(&["java"]));
        assert_eq!(result.next_managed, s(&["java"]));
    }

    #[test]
    fn model_order_takes_precedence_over_current_order() {
        let result = calculate(&s(&["b", "a", "user"]), &s(&["a", "b"]), &s(&["a", "b"]));
        assert_eq!(result.next_elements, s(&["a", "b", "user"]));
    }

    proptest! {
        #[test]
        fn output_always_contains_every_model_element(
            current in proptest::collection::vec("[a-d]", 0..6),
            model in proptest::collection::vec("[a-d]", 0..6),
            managed in proptest::collection::vec("[a-d]", 0..6),
        ) {
            let result = calculate(&current, &model, &managed);
            for element in &model {
                prop_assert!(result.next_elements.contains(element));
            }
        }

        #[test]
        fn pure_user_elements_are_never_removed(
            current in proptest::collection::vec("[a-d]", 0..6),
            model in proptest::collection::vec("[a-d]", 0..6),
            managed in proptest::collection::vec("[a-d]", 0..6),
        ) {
            let result = calculate(&current, &model, &managed);
            for element in &current {
                if !model.contains(element) && !managed.contains(element) {
                    prop_assert!(result.next_elements.contains(element));
                }
            }
        }

        #[test]
        fn recalculating_from_the_output_is_a_fixed_point(
            current in proptest::collection::vec("[a-d]", 0..6),
            model in proptest::collection::vec("[a-d]", 0..6),
            managed in proptest::collection::vec("[a-d]", 0..6),
        ) {
            let first = calculate(&current, &model, &managed);
            let second = calculate(&first.next_elements, &model, &first.next_managed);
            prop_assert_eq!(&second.next_elements, &first.next_elements);
            prop_assert_eq!(&second.next_managed, &first.next_managed);
        }
    }
}
