//! Provider configuration.

use std::time::Duration;

use roomlist_core::{FilterConfig, ViewportConfig};

/// Configuration for one [`RoomSummaryProvider`](crate::RoomSummaryProvider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Name used in logs and thread names.
    pub name: String,
    /// Entries per page requested from the source.
    pub page_size: u32,
    /// Upper bound on one enrichment lookup before degrading.
    pub enrichment_timeout: Duration,
    /// Filter settings.
    pub filters: FilterConfig,
    /// Viewport settings.
    pub viewport: ViewportConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "room_list".to_owned(),
            page_size: 200,
            enrichment_timeout: Duration::from_secs(1),
            filters: FilterConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}
