//! Simulation harness for room list testing.
//!
//! A simulated sync engine ([`SimSource`]) that serves a filtered, paginated
//! window over a room catalog and answers enrichment lookups, with failure
//! injection for both.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference list with plain `Vec` semantics.
//! Operations are applied to both the model and the store, and their
//! observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! settled step of a session. Use [`InvariantRegistry::standard()`] for the
//! common set, and [`RandomSession`] to generate reproducible sessions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
pub mod invariants;
pub mod model;
pub mod session;
pub mod settle;
pub mod sim_filter;
pub mod sim_source;

pub use diff::diff_windows;
pub use invariants::{
    DegradedOnlyOnFailure, Invariant, InvariantRegistry, InvariantResult, ListMatchesSource,
    ProviderSnapshot, StateHistory, StateNeverRegresses, UniqueIdentifiers, Violation,
};
pub use model::{ListOp, ModelList, ModelRoomId, OperationResult, model_room};
pub use session::{RandomSession, SessionStep};
pub use settle::settle;
pub use sim_source::{SimRoom, SimSource};
