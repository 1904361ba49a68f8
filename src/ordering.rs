//! Dense sibling-ordering engine.
//!
//! Every ordered collection in the hierarchy (lists in a board, cards in a
//! list, checklists in a card, items in a checklist) keeps contiguous integer
//! `order` values starting at [`ORDER_BASE`]. This module computes the
//! reassignment plans that keep that invariant across inserts, moves,
//! deletes, and drag-and-drop bulk reorders. It is parent-agnostic and
//! storage-agnostic: callers pass the current `(id, order)` pairs and persist
//! the returned plan atomically.
//!
//! Every mutation renumbers the full affected range, so ties and gaps are
//! impossible by construction. Moves are O(n) in sibling count; collections
//! here are human-scale.

use crate::error::{BoardwalkError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// First order value of every sibling collection
pub const ORDER_BASE: usize = 0;

/// One `(id, order)` pair of a sibling collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibling<I> {
    pub id: I,
    pub order: usize,
}

impl<I> Sibling<I> {
    /// Create a sibling entry
    pub fn new(id: I, order: usize) -> Self {
        Self { id, order }
    }
}

/// One order rewrite in a reassignment plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment<I> {
    pub id: I,
    pub order: usize,
}

/// The two plans produced by a cross-parent move
#[derive(Debug, Clone)]
pub struct CrossParentMove<I> {
    /// Rewrites compacting the source collection after removal
    pub source: Vec<Reassignment<I>>,
    /// Rewrites for the destination, including the moved element
    pub dest: Vec<Reassignment<I>>,
    /// The moved element's order within the destination
    pub moved_order: usize,
}

/// Order value for appending at the end of `siblings`
pub fn append_end<I>(siblings: &[Sibling<I>]) -> usize {
    siblings
        .iter()
        .map(|s| s.order)
        .max()
        .map_or(ORDER_BASE, |max| max + 1)
}

/// Make room at `position` (clamped to `[0, len]`) for a new element.
///
/// Returns the new element's order and the shift plan for existing siblings.
pub fn insert_at<I: Clone>(siblings: &[Sibling<I>], position: usize) -> (usize, Vec<Reassignment<I>>) {
    let position = position.min(siblings.len());
    let plan = siblings
        .iter()
        .filter(|s| s.order >= position)
        .map(|s| Reassignment {
            id: s.id.clone(),
            order: s.order + 1,
        })
        .collect();
    (position, plan)
}

/// Move `moving_id` to `position` within its own collection.
///
/// Remove-then-splice-then-renumber: a plain shift would double-count the
/// element already present in the collection. The returned plan contains
/// every element whose order changes, the moved one included.
pub fn move_within<I>(
    siblings: &[Sibling<I>],
    moving_id: &I,
    position: usize,
) -> Result<Vec<Reassignment<I>>>
where
    I: Clone + Eq + Display,
{
    let mut ordered = sorted_ids(siblings);
    let from = ordered
        .iter()
        .position(|id| id == moving_id)
        .ok_or_else(|| BoardwalkError::not_found("sibling", moving_id.to_string()))?;
    ordered.remove(from);

    let position = position.min(ordered.len());
    ordered.insert(position, moving_id.clone());

    Ok(renumber(siblings, &ordered))
}

/// Move `moving_id` from `source` into `dest` at `position` (clamped).
///
/// The caller owns rewriting the moved element's parent key; the plans only
/// carry order values.
pub fn move_across<I>(
    source: &[Sibling<I>],
    dest: &[Sibling<I>],
    moving_id: &I,
    position: usize,
) -> Result<CrossParentMove<I>>
where
    I: Clone + Eq + Display,
{
    let mut source_ordered = sorted_ids(source);
    let from = source_ordered
        .iter()
        .position(|id| id == moving_id)
        .ok_or_else(|| BoardwalkError::not_found("sibling", moving_id.to_string()))?;
    if dest.iter().any(|s| &s.id == moving_id) {
        return Err(BoardwalkError::invalid_order(format!(
            "{} is already in the destination collection",
            moving_id
        )));
    }
    source_ordered.remove(from);

    let mut dest_ordered = sorted_ids(dest);
    let position = position.min(dest_ordered.len());
    dest_ordered.insert(position, moving_id.clone());

    Ok(CrossParentMove {
        source: renumber(source, &source_ordered),
        dest: renumber(dest, &dest_ordered),
        moved_order: position,
    })
}

/// Close the gap left by deleting `deleted_id`: every sibling whose order was
/// strictly greater shifts down by one.
pub fn delete_and_compact<I>(siblings: &[Sibling<I>], deleted_id: &I) -> Result<Vec<Reassignment<I>>>
where
    I: Clone + Eq + Display,
{
    let deleted = siblings
        .iter()
        .find(|s| &s.id == deleted_id)
        .ok_or_else(|| BoardwalkError::not_found("sibling", deleted_id.to_string()))?;
    Ok(siblings
        .iter()
        .filter(|s| s.order > deleted.order)
        .map(|s| Reassignment {
            id: s.id.clone(),
            order: s.order - 1,
        })
        .collect())
}

/// Replace the collection's order with the supplied permutation
/// (drag-and-drop end state): `order = index` for each id.
///
/// Rejects the payload unless it is exactly the current sibling id set - no
/// additions, no omissions, no duplicates.
pub fn bulk_replace<I>(siblings: &[Sibling<I>], new_ordered_ids: &[I]) -> Result<Vec<Reassignment<I>>>
where
    I: Clone + Eq + Hash + Display,
{
    if new_ordered_ids.len() != siblings.len() {
        return Err(BoardwalkError::invalid_order(format!(
            "expected {} ids, got {}",
            siblings.len(),
            new_ordered_ids.len()
        )));
    }

    let mut seen = HashSet::with_capacity(new_ordered_ids.len());
    for id in new_ordered_ids {
        if !seen.insert(id) {
            return Err(BoardwalkError::invalid_order(format!("duplicate id: {}", id)));
        }
    }

    let current: HashSet<&I> = siblings.iter().map(|s| &s.id).collect();
    for id in new_ordered_ids {
        if !current.contains(id) {
            return Err(BoardwalkError::invalid_order(format!("unknown id: {}", id)));
        }
    }

    Ok(renumber(siblings, new_ordered_ids))
}

/// Ids of `siblings` sorted ascending by current order
fn sorted_ids<I: Clone>(siblings: &[Sibling<I>]) -> Vec<I> {
    let mut sorted: Vec<&Sibling<I>> = siblings.iter().collect();
    sorted.sort_by_key(|s| s.order);
    sorted.into_iter().map(|s| s.id.clone()).collect()
}

/// Assign `order = index` along `ordered`, emitting only entries whose order
/// differs from the current value in `siblings` (or which are new to it).
fn renumber<I: Clone + Eq>(siblings: &[Sibling<I>], ordered: &[I]) -> Vec<Reassignment<I>> {
    ordered
        .iter()
        .enumerate()
        .filter(|(index, id)| {
            siblings
                .iter()
                .find(|s| &s.id == *id)
                .map_or(true, |s| s.order != ORDER_BASE + *index)
        })
        .map(|(index, id)| Reassignment {
            id: id.clone(),
            order: ORDER_BASE + index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siblings(ids: &[&str]) -> Vec<Sibling<String>> {
        ids.iter()
            .enumerate()
            .map(|(order, id)| Sibling::new((*id).to_string(), order))
            .collect()
    }

    /// Apply a plan to a collection and return (id, order) sorted by order
    fn apply(mut all: Vec<Sibling<String>>, plan: &[Reassignment<String>]) -> Vec<(String, usize)> {
        for r in plan {
            if let Some(s) = all.iter_mut().find(|s| s.id == r.id) {
                s.order = r.order;
            } else {
                all.push(Sibling::new(r.id.clone(), r.order));
            }
        }
        let mut result: Vec<(String, usize)> = all.into_iter().map(|s| (s.id, s.order)).collect();
        result.sort_by_key(|(_, order)| *order);
        result
    }

    fn assert_contiguous(entries: &[(String, usize)]) {
        for (index, (_, order)) in entries.iter().enumerate() {
            assert_eq!(*order, index, "gap or duplicate at index {}", index);
        }
    }

    #[test]
    fn test_append_end() {
        assert_eq!(append_end::<String>(&[]), 0);
        assert_eq!(append_end(&siblings(&["a", "b", "c"])), 3);
    }

    #[test]
    fn test_append_end_uses_max_not_len() {
        // A sparse collection (invariant already violated upstream) still
        // appends past the maximum rather than colliding
        let sparse = vec![Sibling::new("a".to_string(), 0), Sibling::new("b".to_string(), 5)];
        assert_eq!(append_end(&sparse), 6);
    }

    #[test]
    fn test_insert_at_middle_shifts_tail() {
        let all = siblings(&["a", "b", "c"]);
        let (order, plan) = insert_at(&all, 1);
        assert_eq!(order, 1);
        // b and c shift up, a is untouched
        assert_eq!(plan.len(), 2);
        let mut result = apply(all, &plan);
        result.push(("new".to_string(), order));
        result.sort_by_key(|(_, o)| *o);
        assert_contiguous(&result);
        assert_eq!(result[1].0, "new");
    }

    #[test]
    fn test_insert_at_clamps_past_end() {
        let all = siblings(&["a", "b"]);
        let (order, plan) = insert_at(&all, 99);
        assert_eq!(order, 2);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_insert_at_zero_shifts_everything() {
        let all = siblings(&["a", "b"]);
        let (order, plan) = insert_at(&all, 0);
        assert_eq!(order, 0);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_move_within_to_front() {
        // Board B has lists a(0), b(1), c(2); move c to position 0
        let all = siblings(&["a", "b", "c"]);
        let plan = move_within(&all, &"c".to_string(), 0).unwrap();
        let result = apply(all, &plan);
        assert_contiguous(&result);
        assert_eq!(result[0].0, "c");
        assert_eq!(result[1].0, "a");
        assert_eq!(result[2].0, "b");
    }

    #[test]
    fn test_move_within_to_end_clamped() {
        let all = siblings(&["a", "b", "c"]);
        let plan = move_within(&all, &"a".to_string(), 99).unwrap();
        let result = apply(all, &plan);
        assert_contiguous(&result);
        assert_eq!(result[2].0, "a");
    }

    #[test]
    fn test_move_within_same_position_is_empty_plan() {
        let all = siblings(&["a", "b", "c"]);
        let plan = move_within(&all, &"b".to_string(), 1).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_move_within_is_not_a_naive_shift() {
        // Moving b from 1 to 2 must swap b and c, not leave a gap at 1
        let all = siblings(&["a", "b", "c"]);
        let plan = move_within(&all, &"b".to_string(), 2).unwrap();
        let result = apply(all, &plan);
        assert_contiguous(&result);
        assert_eq!(result[1].0, "c");
        assert_eq!(result[2].0, "b");
    }

    #[test]
    fn test_move_within_unknown_id() {
        let all = siblings(&["a"]);
        let err = move_within(&all, &"ghost".to_string(), 0).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_move_within_outcome_independent_of_prior_position() {
        // Target position fully determines the end state
        for start in ["a", "b", "c", "d"] {
            let all = siblings(&["a", "b", "c", "d"]);
            let plan = move_within(&all, &start.to_string(), 2).unwrap();
            let result = apply(all, &plan);
            assert_contiguous(&result);
            assert_eq!(result[2].0, start);
        }
    }

    #[test]
    fn test_move_across() {
        let source = siblings(&["a", "b", "c"]);
        let dest = siblings(&["x", "y"]);
        let mv = move_across(&source, &dest, &"b".to_string(), 1).unwrap();

        assert_eq!(mv.moved_order, 1);
        // Source compacts: c moves from 2 to 1
        let source_after: Vec<Sibling<String>> = source
            .into_iter()
            .filter(|s| s.id != "b")
            .collect();
        let source_result = apply(source_after, &mv.source);
        assert_contiguous(&source_result);
        assert_eq!(source_result[1].0, "c");

        // Dest gains b at 1: x(0), b(1), y(2)
        let dest_result = apply(dest, &mv.dest);
        assert_contiguous(&dest_result);
        assert_eq!(dest_result[1].0, "b");
        assert_eq!(dest_result[2].0, "y");
    }

    #[test]
    fn test_move_across_into_empty() {
        let source = siblings(&["a"]);
        let mv = move_across(&source, &[], &"a".to_string(), 5).unwrap();
        assert_eq!(mv.moved_order, 0);
        assert!(mv.source.is_empty());
        assert_eq!(mv.dest, vec![Reassignment { id: "a".to_string(), order: 0 }]);
    }

    #[test]
    fn test_move_across_rejects_id_already_in_dest() {
        let source = siblings(&["a"]);
        let dest = siblings(&["a"]);
        assert!(move_across(&source, &dest, &"a".to_string(), 0).is_err());
    }

    #[test]
    fn test_delete_and_compact() {
        // List L has cards a(0), b(1), c(2); delete b -> a(0), c(1)
        let all = siblings(&["a", "b", "c"]);
        let plan = delete_and_compact(&all, &"b".to_string()).unwrap();
        assert_eq!(plan, vec![Reassignment { id: "c".to_string(), order: 1 }]);

        let remaining: Vec<Sibling<String>> =
            all.into_iter().filter(|s| s.id != "b").collect();
        let result = apply(remaining, &plan);
        assert_contiguous(&result);
    }

    #[test]
    fn test_delete_last_needs_no_rewrites() {
        let all = siblings(&["a", "b"]);
        let plan = delete_and_compact(&all, &"b".to_string()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_delete_unknown_id() {
        assert!(delete_and_compact(&siblings(&["a"]), &"ghost".to_string()).is_err());
    }

    #[test]
    fn test_bulk_replace_permutation() {
        let all = siblings(&["a", "b", "c"]);
        let new_order = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let plan = bulk_replace(&all, &new_order).unwrap();
        let result = apply(all, &plan);
        assert_contiguous(&result);
        assert_eq!(result[0].0, "c");
        assert_eq!(result[1].0, "a");
        assert_eq!(result[2].0, "b");
    }

    #[test]
    fn test_bulk_replace_identity_is_empty_plan() {
        let all = siblings(&["a", "b"]);
        let plan = bulk_replace(&all, &["a".to_string(), "b".to_string()]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_bulk_replace_rejects_wrong_count() {
        let all = siblings(&["a", "b"]);
        let err = bulk_replace(&all, &["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_bulk_replace_rejects_duplicates() {
        let all = siblings(&["a", "b"]);
        let err = bulk_replace(&all, &["a".to_string(), "a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_bulk_replace_rejects_foreign_id() {
        let all = siblings(&["a", "b"]);
        let err = bulk_replace(&all, &["a".to_string(), "z".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_contiguity_preserved_across_operation_sequence() {
        // insert, move, delete in sequence keep 0..n with no gaps
        let mut all = siblings(&["a", "b", "c"]);

        let (order, plan) = insert_at(&all, 1);
        for r in &plan {
            all.iter_mut().find(|s| s.id == r.id).unwrap().order = r.order;
        }
        all.push(Sibling::new("d".to_string(), order));

        let plan = move_within(&all, &"c".to_string(), 0).unwrap();
        for r in &plan {
            all.iter_mut().find(|s| s.id == r.id).unwrap().order = r.order;
        }

        let plan = delete_and_compact(&all, &"a".to_string()).unwrap();
        all.retain(|s| s.id != "a");
        for r in &plan {
            all.iter_mut().find(|s| s.id == r.id).unwrap().order = r.order;
        }

        all.sort_by_key(|s| s.order);
        let result: Vec<(String, usize)> = all.into_iter().map(|s| (s.id, s.order)).collect();
        assert_contiguous(&result);
        assert_eq!(result.len(), 3);
    }
}
