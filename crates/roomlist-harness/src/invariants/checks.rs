//! Standard invariant checks.

use std::collections::HashSet;

use roomlist_core::{ProviderState, RawEntry};

use super::{Invariant, InvariantResult, ProviderSnapshot, Violation};

/// No identifier appears twice in the list.
pub struct UniqueIdentifiers;

impl Invariant for UniqueIdentifiers {
    fn name(&self) -> &'static str {
        "unique_identifiers"
    }

    fn check(&self, state: &ProviderSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for (index, summary) in state.list.iter().enumerate() {
            if !seen.insert(&summary.id) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{} repeated at index {index}", summary.id),
                });
            }
        }
        Ok(())
    }
}

/// Within one session the state never goes from `Loaded` back to
/// `NotLoaded`.
pub struct StateNeverRegresses;

impl Invariant for StateNeverRegresses {
    fn name(&self) -> &'static str {
        "state_never_regresses"
    }

    fn check(&self, state: &ProviderSnapshot) -> InvariantResult {
        let mut loaded = false;
        for (step, observed) in state.state_history.iter().chain([&state.state]).enumerate() {
            match observed {
                ProviderState::Loaded { .. } => loaded = true,
                ProviderState::NotLoaded if loaded => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("NotLoaded observed after Loaded (observation {step})"),
                    });
                },
                ProviderState::NotLoaded => {},
            }
        }
        Ok(())
    }
}

/// A settled, healthy list holds exactly the source's window, in order.
///
/// Skipped when the source window is unknown or the provider faulted.
pub struct ListMatchesSource;

impl Invariant for ListMatchesSource {
    fn name(&self) -> &'static str {
        "list_matches_source"
    }

    fn check(&self, state: &ProviderSnapshot) -> InvariantResult {
        let Some(window) = &state.source_window else {
            return Ok(());
        };
        if state.faulted {
            return Ok(());
        }

        let expected: Vec<_> = window.iter().map(RawEntry::id).collect();
        let actual: Vec<_> = state.list.iter().map(|summary| &summary.id).collect();
        if expected != actual {
            return Err(Violation {
                invariant: self.name(),
                message: format!("list {actual:?} differs from source window {expected:?}"),
            });
        }
        Ok(())
    }
}

/// Every degraded summary stands for a room that failed enrichment or that
/// the source does not know.
///
/// Skipped when no source is attached to the snapshot.
pub struct DegradedOnlyOnFailure;

impl Invariant for DegradedOnlyOnFailure {
    fn name(&self) -> &'static str {
        "degraded_only_on_failure"
    }

    fn check(&self, state: &ProviderSnapshot) -> InvariantResult {
        if state.source_window.is_none() {
            return Ok(());
        }

        for summary in state.list.iter().filter(|summary| summary.is_degraded) {
            let explained = state.failed_rooms.contains(&summary.id)
                || !state.known_rooms.contains(&summary.id);
            if !explained {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{} degraded without an enrichment failure", summary.id),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use roomlist_core::{RoomDetails, RoomId, RoomInfo, Summary};

    use super::*;

    fn enriched(id: &str) -> Summary {
        let main = RoomInfo { id: id.into(), ..RoomInfo::default() };
        Summary::assemble(&RawEntry::Room(id.into()), RoomDetails {
            main,
            preview: None,
            latest_event: None,
        })
    }

    fn degraded(id: &str) -> Summary {
        Summary::degraded(&RawEntry::Room(id.into()))
    }

    fn window(ids: &[&str]) -> Option<Vec<RawEntry>> {
        Some(ids.iter().map(|id| RawEntry::Room((*id).into())).collect())
    }

    #[test]
    fn duplicate_identifier_detected() {
        let snapshot = ProviderSnapshot {
            list: vec![enriched("!a"), enriched("!b"), enriched("!a")],
            ..ProviderSnapshot::empty()
        };
        assert!(UniqueIdentifiers.check(&snapshot).is_err());
    }

    #[test]
    fn regression_detected_in_history() {
        let snapshot = ProviderSnapshot {
            state_history: vec![ProviderState::Loaded { total: 1 }, ProviderState::NotLoaded],
            state: ProviderState::Loaded { total: 1 },
            ..ProviderSnapshot::empty()
        };
        assert!(StateNeverRegresses.check(&snapshot).is_err());

        let fresh = ProviderSnapshot {
            state_history: vec![ProviderState::NotLoaded, ProviderState::Loaded { total: 0 }],
            ..ProviderSnapshot::empty()
        };
        // Current NotLoaded after a Loaded history is a regression too.
        assert!(StateNeverRegresses.check(&fresh).is_err());
    }

    #[test]
    fn list_must_follow_window_order() {
        let mut snapshot = ProviderSnapshot {
            list: vec![enriched("!b"), enriched("!a")],
            source_window: window(&["!a", "!b"]),
            ..ProviderSnapshot::empty()
        };
        assert!(ListMatchesSource.check(&snapshot).is_err());

        snapshot.faulted = true;
        assert!(ListMatchesSource.check(&snapshot).is_ok());
    }

    #[test]
    fn degraded_needs_a_cause() {
        let mut snapshot = ProviderSnapshot {
            list: vec![degraded("!a")],
            source_window: window(&["!a"]),
            known_rooms: [RoomId::from("!a")].into_iter().collect(),
            ..ProviderSnapshot::empty()
        };
        assert!(DegradedOnlyOnFailure.check(&snapshot).is_err());

        snapshot.failed_rooms.insert("!a".into());
        assert!(DegradedOnlyOnFailure.check(&snapshot).is_ok());
    }
}
