//! Room list projection core
//!
//! Sans-IO building blocks for an incrementally synchronized room list: the
//! edit-operation algebra, the translator that turns operations into edit
//! scripts, the materialized list store, filter composition, viewport
//! throttling and loading-state mapping. Nothing here spawns tasks or reads
//! the clock, so the same code runs under the runtime and under simulation.
//!
//! # Components
//!
//! - [`EditOperation`] / [`translate`] / [`EditScript`]: list edits
//! - [`RoomListStore`]: ordered, serially mutated list of summaries
//! - [`Summary`]: displayable projection of a [`RawEntry`]
//! - [`compose_filter`]: [`FilterSpec`] to [`SourceFilter`]
//! - [`ViewportThrottler`]: visible range reports to paging and scope commands
//! - [`ProviderState`]: loading state with no regressions

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod entry;
pub mod env;
pub mod error;
pub mod filter;
pub mod operation;
pub mod preview;
pub mod script;
pub mod state;
pub mod store;
pub mod summary;
pub mod viewport;

pub use command::{SourceCommand, coalesce_commands};
pub use entry::{
    EventSender, LatestEvent, Membership, MessageContent, NotificationMode, RawEntry, RoomId,
    RoomInfo, UserProfile,
};
pub use env::Environment;
pub use error::{EnrichmentError, ListError};
pub use filter::{
    FilterConfig, FilterSpec, RoomCategory, RoomFilter, SearchMatching, SourceFilter,
    base_filters, compose_filter,
};
pub use operation::EditOperation;
pub use preview::{MessagePreview, Segment, SegmentStyle, render_preview};
pub use script::{Change, EditScript, translate};
pub use state::{ProviderState, SourceLoadingState};
pub use store::{BatchReport, ListEntry, RoomListStore};
pub use summary::{JoinRequest, LastMessageState, RoomDetails, Summary};
pub use viewport::{PageCommand, ViewportConfig, ViewportOutcome, ViewportRange, ViewportThrottler};
