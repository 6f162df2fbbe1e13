//! Fire-and-forget commands sent to the source.

use crate::{entry::RoomId, filter::SourceFilter};

/// One command for the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCommand {
    /// Replace the active filter.
    SetFilter(SourceFilter),
    /// Grow the window by one page.
    AddOnePage,
    /// Shrink the window back to a single page.
    ResetToOnePage,
    /// Keep detail subscriptions for these entries.
    SubscribeToIds(Vec<RoomId>),
}

impl SourceCommand {
    /// Short command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFilter(_) => "set_filter",
            Self::AddOnePage => "add_one_page",
            Self::ResetToOnePage => "reset_to_one_page",
            Self::SubscribeToIds(_) => "subscribe_to_ids",
        }
    }
}

/// Drop `SetFilter` commands superseded by a later one in the same run.
///
/// Order of the remaining commands is preserved. Paging and scope commands
/// are never dropped: the source counts pages, so each one matters.
pub fn coalesce_commands(commands: Vec<SourceCommand>) -> Vec<SourceCommand> {
    let last_filter = commands.iter().rposition(|c| matches!(c, SourceCommand::SetFilter(_)));

    commands
        .into_iter()
        .enumerate()
        .filter(|(i, c)| !matches!(c, SourceCommand::SetFilter(_)) || Some(*i) == last_filter)
        .map(|(_, c)| c)
        .collect()
}
