//! Room list simulator.
//!
//! Builds a random room catalog, attaches a provider to it and plays a
//! seeded session of catalog churn, filter changes and scrolling, checking
//! the standard invariants at regular checkpoints.
//!
//! # Usage
//!
//! ```bash
//! # Reproduce a session
//! roomlist-sim --seed 42 --steps 500
//!
//! # Flaky enrichment, fuzzy search, verbose
//! roomlist-sim --failure-rate 0.05 --search eng --fuzzy --log-level debug
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use roomlist_app::{ProviderConfig, RoomSummaryProvider};
use roomlist_core::{FilterConfig, FilterSpec, SearchMatching, SourceLoadingState, ViewportConfig};
use roomlist_harness::{
    InvariantRegistry, ProviderSnapshot, RandomSession, SimSource, StateHistory, settle,
};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CHECKPOINT_EVERY: usize = 25;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Room list simulator
#[derive(Parser, Debug)]
#[command(name = "roomlist-sim")]
#[command(about = "Drive a room list provider through a seeded simulated session")]
#[command(version)]
struct Args {
    /// Session seed
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Session steps
    #[arg(long, default_value = "200")]
    steps: usize,

    /// Rooms in the initial catalog
    #[arg(long, default_value = "50")]
    rooms: usize,

    /// Entries per page
    #[arg(long, default_value = "20")]
    page_size: u32,

    /// Viewport debounce in milliseconds
    #[arg(long, default_value = "100")]
    debounce_ms: u64,

    /// Probability that a step makes enrichment of a room fail
    #[arg(long, default_value = "0.0")]
    failure_rate: f64,

    /// Initial search query
    #[arg(long)]
    search: Option<String>,

    /// Fuzzy rather than normalized search matching
    #[arg(long)]
    fuzzy: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Error, Debug)]
enum SimError {
    #[error("{0} invariant violations")]
    Violations(usize),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(seed = args.seed, steps = args.steps, rooms = args.rooms, "simulation starting");

    let source = Arc::new(SimSource::new());
    let mut session = RandomSession::new(args.seed).with_failure_rate(args.failure_rate);
    for _ in 0..args.rooms {
        source.add_room(session.room());
    }
    source.set_loading_state(SourceLoadingState::Loaded {
        maximum: u32::try_from(args.rooms).ok(),
    });

    let debounce = Duration::from_millis(args.debounce_ms);
    let config = ProviderConfig {
        name: format!("sim-{}", args.seed),
        page_size: args.page_size,
        filters: FilterConfig {
            search_matching: if args.fuzzy { SearchMatching::Fuzzy } else { SearchMatching::Normalized },
            ..FilterConfig::default()
        },
        viewport: ViewportConfig { debounce, ..ViewportConfig::default() },
        ..ProviderConfig::default()
    };

    let mut provider = RoomSummaryProvider::new(Arc::clone(&source), Arc::clone(&source), config)?;
    let history = StateHistory::record(&provider.state());
    provider.subscribe_if_necessary().await?;
    if let Some(query) = args.search {
        provider.set_filter(FilterSpec::SearchQuery(query));
    }

    let registry = InvariantRegistry::standard();
    let quiet = debounce * 2;
    let mut violations = 0;

    for step in 1..=args.steps {
        session.next_step(&source).apply(&source, &provider);
        if step % CHECKPOINT_EVERY != 0 && step != args.steps {
            continue;
        }

        if !settle(&provider, &source, quiet, SETTLE_TIMEOUT).await {
            tracing::warn!(step, "provider did not settle before checkpoint");
        }
        let snapshot = ProviderSnapshot::capture(&provider, &history).with_source(&source);
        if let Err(found) = registry.check_all(&snapshot) {
            for violation in &found {
                tracing::error!(step, %violation, "invariant violated");
            }
            violations += found.len();
        }

        let degraded = snapshot.list.iter().filter(|summary| summary.is_degraded).count();
        tracing::info!(
            step,
            entries = snapshot.list.len(),
            degraded,
            pages = provider.requested_pages(),
            state = ?snapshot.state,
            "checkpoint"
        );
    }

    provider.shutdown().await;
    tracing::info!(
        commands = source.commands().len(),
        enrichment_calls = source.enrichment_calls(),
        violations,
        "simulation finished"
    );

    if violations > 0 {
        return Err(SimError::Violations(violations).into());
    }
    Ok(())
}
