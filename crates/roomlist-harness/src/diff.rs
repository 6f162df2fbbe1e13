//! Window diffing for the simulated source.
//!
//! Turns two consecutive windows into the operation batch a sync engine
//! would emit. Prefers the narrow operations (`push_front`, `pop_back`,
//! `set`, moves as remove plus insert) so every variant gets exercised, and
//! falls back to `reset` when the windows have little in common.

use roomlist_core::{EditOperation, RawEntry};

/// Operations turning `old` into `new` when applied in order.
///
/// Windows never contain the same identifier twice, and no intermediate
/// state produced by the batch does either.
pub fn diff_windows(old: &[RawEntry], new: &[RawEntry]) -> Vec<EditOperation<RawEntry>> {
    if old == new {
        return Vec::new();
    }
    if new.is_empty() {
        return vec![EditOperation::Clear];
    }
    if old.is_empty() {
        return vec![EditOperation::Append(new.to_vec())];
    }
    if new.len() > old.len() && new.starts_with(old) {
        return vec![EditOperation::Append(new[old.len()..].to_vec())];
    }
    if new.len() < old.len() && old.starts_with(new) {
        return vec![shrink(old.len(), new.len())];
    }
    if new.len() == old.len() + 1 && new[1..] == *old {
        return vec![EditOperation::PushFront(new[0].clone())];
    }
    if old.len() == new.len() + 1 && old[1..] == *new {
        return vec![EditOperation::PopFront];
    }

    let ops = walk(old, new);
    if ops.len() > new.len() { vec![EditOperation::Reset(new.to_vec())] } else { ops }
}

fn shrink(from: usize, to: usize) -> EditOperation<RawEntry> {
    if from - to == 1 { EditOperation::PopBack } else { EditOperation::Truncate { length: to } }
}

fn walk(old: &[RawEntry], new: &[RawEntry]) -> Vec<EditOperation<RawEntry>> {
    let mut current = old.to_vec();
    let mut ops = Vec::new();

    for (i, wanted) in new.iter().enumerate() {
        if current.get(i) == Some(wanted) {
            continue;
        }

        let later = current.iter().skip(i + 1).position(|e| e == wanted).map(|p| p + i + 1);
        if let Some(from) = later {
            current.remove(from);
            ops.push(EditOperation::Remove { index: from });
            current.insert(i, wanted.clone());
            ops.push(EditOperation::Insert { index: i, value: wanted.clone() });
        } else if i == current.len() {
            current.push(wanted.clone());
            ops.push(EditOperation::PushBack(wanted.clone()));
        } else if new[i + 1..].contains(&current[i]) {
            current.insert(i, wanted.clone());
            ops.push(EditOperation::Insert { index: i, value: wanted.clone() });
        } else {
            current[i] = wanted.clone();
            ops.push(EditOperation::Set { index: i, value: wanted.clone() });
        }
    }

    if current.len() > new.len() {
        ops.push(shrink(current.len(), new.len()));
    }
    ops
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::model::{ModelList, model_room};

    fn rooms(ids: &[u8]) -> Vec<RawEntry> {
        ids.iter().copied().map(model_room).collect()
    }

    fn replay(old: &[RawEntry], ops: &[EditOperation<RawEntry>]) -> Vec<RawEntry> {
        let mut model = ModelList::new();
        model.apply(&EditOperation::Reset(old.to_vec()));
        for op in ops {
            model.apply(op);
        }
        model.entries().to_vec()
    }

    #[test]
    fn growth_is_append() {
        let ops = diff_windows(&rooms(&[1, 2]), &rooms(&[1, 2, 3]));
        assert_eq!(ops, vec![EditOperation::Append(rooms(&[3]))]);
    }

    #[test]
    fn new_head_is_push_front() {
        let ops = diff_windows(&rooms(&[1, 2]), &rooms(&[3, 1, 2]));
        assert_eq!(ops, vec![EditOperation::PushFront(model_room(3))]);
    }

    #[test]
    fn shrink_by_one_is_pop_back() {
        assert_eq!(diff_windows(&rooms(&[1, 2, 3]), &rooms(&[1, 2])), vec![EditOperation::PopBack]);
        assert_eq!(
            diff_windows(&rooms(&[1, 2, 3]), &rooms(&[1])),
            vec![EditOperation::Truncate { length: 1 }]
        );
    }

    #[test]
    fn bump_to_top_is_a_move() {
        let old = rooms(&[1, 2, 3, 4]);
        let new = rooms(&[3, 1, 2, 4]);
        let ops = diff_windows(&old, &new);
        assert_eq!(ops, vec![
            EditOperation::Remove { index: 2 },
            EditOperation::Insert { index: 0, value: model_room(3) },
        ]);
    }

    #[test]
    fn empty_window_is_clear() {
        assert_eq!(diff_windows(&rooms(&[1]), &[]), vec![EditOperation::Clear]);
        assert!(diff_windows(&[], &[]).is_empty());
    }

    proptest! {
        #[test]
        fn replaying_diff_reaches_new_window(
            old in prop::collection::btree_set(0u8..24, 0..12),
            new in prop::collection::btree_set(0u8..24, 0..12),
            rotate in 0usize..12,
        ) {
            let old: Vec<u8> = old.into_iter().collect();
            let mut new: Vec<u8> = new.into_iter().collect();
            if !new.is_empty() {
                let by = rotate % new.len();
                new.rotate_left(by);
            }
            let (old, new) = (rooms(&old), rooms(&new));

            let ops = diff_windows(&old, &new);
            prop_assert_eq!(replay(&old, &ops), new.clone());

            // No intermediate state repeats an identifier.
            let mut model = ModelList::new();
            model.apply(&EditOperation::Reset(old));
            for op in &ops {
                model.apply(op);
                let ids = model.ids();
                let unique: BTreeSet<_> = ids.iter().collect();
                prop_assert_eq!(unique.len(), ids.len());
            }
        }
    }
}
