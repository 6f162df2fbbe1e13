//! Fuzz target for edit scripts
//!
//! # Strategy
//!
//! - Arbitrary insertion and removal sets against an arbitrary list,
//!   including duplicate offsets and offsets past either end
//!
//! # Invariants
//!
//! - Conflicting scripts are rejected at construction
//! - Applying a valid script either fails cleanly or yields
//!   `len - removals + insertions` elements
//! - Applying never mutates the input list
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roomlist_core::{Change, EditScript};

#[derive(Debug, Arbitrary)]
struct Input {
    list: Vec<u8>,
    changes: Vec<FuzzChange>,
}

#[derive(Debug, Arbitrary)]
enum FuzzChange {
    Insert { offset: u8, element: u8 },
    Remove { offset: u8, element: u8 },
}

fuzz_target!(|input: Input| {
    let changes: Vec<Change<u8>> = input
        .changes
        .iter()
        .map(|change| match *change {
            FuzzChange::Insert { offset, element } => {
                Change::Insert { offset: usize::from(offset), element }
            },
            FuzzChange::Remove { offset, element } => {
                Change::Remove { offset: usize::from(offset), element }
            },
        })
        .collect();

    let Ok(script) = EditScript::new(changes) else {
        return;
    };

    let before = input.list.clone();
    if let Ok(after) = script.apply(&input.list) {
        let expected = before.len() - script.removals().len() + script.insertions().len();
        assert_eq!(after.len(), expected);
    }
    assert_eq!(before, input.list);
});
