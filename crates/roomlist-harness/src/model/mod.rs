//! Reference model for model-based testing.
//!
//! [`ModelList`] applies [`ListOp`]s with plain `Vec` semantics. The store is
//! driven with the same operations and their observable states compared.

mod list;
mod operation;

pub use list::{ModelList, OperationResult};
pub use operation::{ListOp, ModelRoomId, model_room};
