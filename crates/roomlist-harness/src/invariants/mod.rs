//! Invariant checking for simulated room list sessions.
//!
//! Invariants are properties that must hold after every settled step of a
//! session, whatever the operations, filters and failures that led there.
//!
//! # Architecture
//!
//! Observable provider state and the simulated source's ground truth are
//! captured into a [`ProviderSnapshot`], then every registered
//! [`Invariant`] runs against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = ProviderSnapshot::capture(&provider, &history).with_source(&source);
//! registry.assert_all(&snapshot, "after step 12");
//! ```

mod checks;
mod snapshot;

pub use checks::{DegradedOnlyOnFailure, ListMatchesSource, StateNeverRegresses, UniqueIdentifiers};
pub use snapshot::{ProviderSnapshot, StateHistory};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against a provider snapshot.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the snapshot.
    fn check(&self, state: &ProviderSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with every standard invariant:
    /// - [`UniqueIdentifiers`]: no identifier appears twice
    /// - [`StateNeverRegresses`]: no `NotLoaded` after `Loaded`
    /// - [`ListMatchesSource`]: settled list mirrors the source window
    /// - [`DegradedOnlyOnFailure`]: degraded summaries have a cause
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(UniqueIdentifiers);
        registry.add(StateNeverRegresses);
        registry.add(ListMatchesSource);
        registry.add(DegradedOnlyOnFailure);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, state: &ProviderSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &ProviderSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&ProviderSnapshot::empty()).is_ok());
    }
}
