//! Room list runtime
//!
//! Runs the sans-IO core against a live source: subscriptions are relayed
//! into a dedicated serial executor thread, enrichment is bridged
//! synchronously onto the tokio runtime, and filter, paging and scope
//! commands are pumped to the source in order.
//!
//! # Components
//!
//! - [`RoomSummaryProvider`]: the UI-facing entry point
//! - [`RoomListSource`] / [`EnrichmentGateway`]: external collaborators
//! - [`SummaryBuilder`]: blocking enrichment bridge
//! - [`FilterController`]: filter and paging commands
//! - [`Observable`]: replay-latest output slots

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod builder;
mod config;
mod controller;
mod error;
mod executor;
mod observable;
mod provider;
mod source;
mod system_env;
mod viewport;

pub use builder::SummaryBuilder;
pub use config::ProviderConfig;
pub use controller::FilterController;
pub use error::{ProviderError, SourceError};
pub use observable::{Observable, Subscriber};
pub use provider::RoomSummaryProvider;
pub use source::{
    EnrichmentGateway, EntriesSubscription, LoadingStateSubscription, RoomListSource,
};
pub use system_env::SystemEnv;
