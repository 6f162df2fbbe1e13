//! Fuzz target for the materialized list store
//!
//! # Strategy
//!
//! - Batches of arbitrary list operations over a small identifier space
//! - Indices past the end, pops on empty lists, duplicate identifiers
//!
//! # Invariants
//!
//! - The store agrees with a plain `Vec` model after every batch
//! - Only a pop on an empty list is fatal, and the list keeps its last
//!   good value
//! - One publish per operation that changed the list
//! - NEVER panic

#![no_main]

use libfuzzer_sys::fuzz_target;
use roomlist_core::{RawEntry, RoomListStore, Summary};
use roomlist_harness::{ListOp, ModelList, OperationResult};

fuzz_target!(|batches: Vec<Vec<ListOp>>| {
    let mut model = ModelList::new();
    let mut store = RoomListStore::new();

    for batch in batches {
        let mut expected_publishes = 0;
        let mut model_fatal = false;
        for op in &batch {
            match model.apply(&op.to_edit()) {
                OperationResult::Applied => expected_publishes += 1,
                OperationResult::Unchanged | OperationResult::Skipped => {},
                OperationResult::Fatal => {
                    model_fatal = true;
                    break;
                },
            }
        }

        let mut publishes = 0;
        let ops = batch.iter().map(ListOp::to_edit).collect();
        let result = store.apply_batch(ops, Summary::degraded, |_| publishes += 1);

        assert_eq!(result.is_err(), model_fatal, "fatal outcome diverged");
        if let Err(err) = &result {
            assert!(err.is_fatal());
        }
        assert_eq!(publishes, expected_publishes);

        let raw: Vec<RawEntry> = store.entries().iter().map(|e| e.raw.clone()).collect();
        assert_eq!(model.entries(), raw.as_slice());

        if model_fatal {
            break;
        }
    }
});
