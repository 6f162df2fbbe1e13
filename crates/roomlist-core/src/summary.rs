//! Displayable room summaries.
//!
//! A [`Summary`] is the projection of one [`RawEntry`] the UI renders. It is
//! assembled from the [`RoomDetails`] the enrichment gateway returned, or
//! degraded to locally known fields when enrichment failed, so that every
//! entry in the source list always has a summary in the materialized list.

use std::collections::BTreeSet;

use crate::{
    entry::{LatestEvent, Membership, NotificationMode, RawEntry, RoomId, RoomInfo, UserProfile},
    preview::{MessagePreview, render_preview},
};

/// Delivery state of the last message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastMessageState {
    /// Local echo still being sent.
    Sending,
    /// Local echo that failed to send.
    Failed,
    /// Acknowledged by the server.
    Sent,
}

/// Pending membership request shown in place of a joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRequest {
    /// We were invited.
    Invite {
        /// Who invited us, if known.
        inviter: Option<UserProfile>,
    },
    /// We knocked and wait for approval.
    Knock,
}

/// Everything the gateway returned for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetails {
    /// Info for the entry's own room (the space for grouped entries).
    pub main: RoomInfo,
    /// Info for the preview room of a space entry. `None` for plain rooms or
    /// when the preview lookup failed.
    pub preview: Option<RoomInfo>,
    /// Latest event of the preview room.
    pub latest_event: Option<LatestEvent>,
}

/// Materialized, displayable projection of a [`RawEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Stable identifier, unique within the list.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Direct conversation.
    pub is_direct: bool,
    /// Entry is a space.
    pub is_space: bool,
    /// Room was replaced by a successor.
    pub is_tombstoned: bool,
    /// Members illustrating unnamed rooms.
    pub heroes: Vec<UserProfile>,
    /// Joined plus invited members.
    pub active_members_count: u64,
    /// Rendered last message.
    pub last_message: Option<MessagePreview>,
    /// Timestamp of the last message, milliseconds since the Unix epoch.
    pub last_message_timestamp_ms: Option<u64>,
    /// Delivery state of the last message.
    pub last_message_state: Option<LastMessageState>,
    /// Room the last message came from, when different from `id`.
    pub last_message_room_id: Option<RoomId>,
    /// Unread messages.
    pub unread_messages_count: u64,
    /// Unread mentions.
    pub unread_mentions_count: u64,
    /// Unread notifications.
    pub unread_notifications_count: u64,
    /// User-defined notification mode.
    pub notification_mode: Option<NotificationMode>,
    /// Canonical alias.
    pub canonical_alias: Option<String>,
    /// Alternative aliases.
    pub alternative_aliases: BTreeSet<String>,
    /// A call is ongoing.
    pub has_ongoing_call: bool,
    /// Invite or knock awaiting action.
    pub join_request: Option<JoinRequest>,
    /// Manually marked unread.
    pub is_marked_unread: bool,
    /// Tagged favourite.
    pub is_favourite: bool,
    /// Tagged low priority.
    pub is_low_priority: bool,
    /// Built without enrichment; only locally known fields are set.
    pub is_degraded: bool,
}

impl Summary {
    /// Assemble a summary from enrichment results.
    ///
    /// Identity, naming and tags come from the entry's own room. Activity
    /// (counters, heroes, call state, last message) comes from the preview
    /// room, which for plain rooms is the room itself.
    pub fn assemble(entry: &RawEntry, details: RoomDetails) -> Self {
        let RoomDetails { main, preview, latest_event } = details;
        let activity = preview.as_ref().unwrap_or(&main);

        let mut last_message = latest_event.as_ref().map(|event| render_preview(event, !activity.is_direct));
        if main.is_space {
            if let (Some(message), Some(preview)) = (last_message.take(), preview.as_ref()) {
                let room_name = preview.display_name.as_deref().unwrap_or(preview.id.as_str());
                last_message = Some(message.with_room_prefix(room_name));
            }
        }

        let (last_message_timestamp_ms, last_message_state) = match &latest_event {
            Some(LatestEvent::Local { timestamp_ms, is_sending, .. }) => {
                let state =
                    if *is_sending { LastMessageState::Sending } else { LastMessageState::Failed };
                (Some(*timestamp_ms), Some(state))
            },
            Some(LatestEvent::Remote { timestamp_ms, .. }) => {
                (Some(*timestamp_ms), Some(LastMessageState::Sent))
            },
            None => (None, None),
        };

        let join_request = match main.membership {
            Membership::Invited => Some(JoinRequest::Invite { inviter: main.inviter.clone() }),
            Membership::Knocked => Some(JoinRequest::Knock),
            Membership::Joined | Membership::Left | Membership::Banned => None,
        };

        Self {
            id: entry.id().clone(),
            name: main.display_name.clone().unwrap_or_else(|| entry.id().to_string()),
            avatar_url: main.avatar_url.clone(),
            is_direct: activity.is_direct,
            is_space: main.is_space,
            is_tombstoned: main.successor_room.is_some(),
            heroes: activity.heroes.clone(),
            active_members_count: activity.active_members_count,
            last_message,
            last_message_timestamp_ms,
            last_message_state,
            last_message_room_id: main.is_space.then(|| entry.preview_room().clone()),
            unread_messages_count: activity.num_unread_messages,
            unread_mentions_count: activity.num_unread_mentions,
            unread_notifications_count: activity.num_unread_notifications,
            notification_mode: activity.notification_mode,
            canonical_alias: main.canonical_alias.clone(),
            alternative_aliases: main.alternative_aliases.iter().cloned().collect(),
            has_ongoing_call: activity.has_room_call,
            join_request,
            is_marked_unread: main.is_marked_unread,
            is_favourite: main.is_favourite,
            is_low_priority: main.is_low_priority,
            is_degraded: false,
        }
    }

    /// Best-effort summary from the raw entry alone.
    ///
    /// The identifier doubles as display name.
    pub fn degraded(entry: &RawEntry) -> Self {
        let id = entry.id().clone();
        let is_space = matches!(entry, RawEntry::Space { .. });
        Self {
            name: id.to_string(),
            last_message_room_id: is_space.then(|| entry.preview_room().clone()),
            id,
            avatar_url: None,
            is_direct: false,
            is_space,
            is_tombstoned: false,
            heroes: Vec::new(),
            active_members_count: 0,
            last_message: None,
            last_message_timestamp_ms: None,
            last_message_state: None,
            unread_messages_count: 0,
            unread_mentions_count: 0,
            unread_notifications_count: 0,
            notification_mode: None,
            canonical_alias: None,
            alternative_aliases: BTreeSet::new(),
            has_ongoing_call: false,
            join_request: None,
            is_marked_unread: false,
            is_favourite: false,
            is_low_priority: false,
            is_degraded: true,
        }
    }
}
