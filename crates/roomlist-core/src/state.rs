//! Provider loading state.

/// Loading state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderState {
    /// Nothing loaded yet.
    #[default]
    NotLoaded,
    /// The source reported its first page.
    Loaded {
        /// Total number of entries the source knows about.
        total: usize,
    },
}

impl ProviderState {
    /// True once loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Next state for a loading signal from the source.
    ///
    /// Returns `None` when the state does not change. A `NotLoaded` signal
    /// after `Loaded` is ignored: within one session the state never goes
    /// back. When the source does not know its maximum, the current list
    /// length stands in for the total.
    pub fn advance(self, signal: SourceLoadingState, list_len: usize) -> Option<Self> {
        let next = match signal {
            SourceLoadingState::NotLoaded if self.is_loaded() => {
                tracing::warn!(current = ?self, "ignoring loading state regression");
                return None;
            },
            SourceLoadingState::NotLoaded => Self::NotLoaded,
            SourceLoadingState::Loaded { maximum } => {
                Self::Loaded { total: maximum.map_or(list_len, |m| m as usize) }
            },
        };

        (next != self).then_some(next)
    }
}

/// Loading signal as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLoadingState {
    /// The source has not loaded anything.
    NotLoaded,
    /// The source has loaded at least one page.
    Loaded {
        /// Total entries on the server, when known.
        maximum: Option<u32>,
    },
}
