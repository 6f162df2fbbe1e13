//! Raw entries and the descriptive fields the gateway supplies for them.
//!
//! A [`RawEntry`] is what the source puts in its list: an opaque handle that
//! only names rooms. Everything displayable comes from [`RoomInfo`] and
//! [`LatestEvent`], fetched through the enrichment gateway.

use std::fmt;

/// Stable room identifier (e.g. `!abc:example.org`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One list item as delivered by the source, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawEntry {
    /// A plain room.
    Room(RoomId),
    /// A space, previewed through one of its child rooms.
    Space {
        /// The space itself. Identity of the list item.
        space: RoomId,
        /// Child room whose activity represents the space in the list.
        preview: RoomId,
    },
}

impl RawEntry {
    /// Identifier of the list item (the space for grouped entries).
    pub fn id(&self) -> &RoomId {
        match self {
            Self::Room(id) => id,
            Self::Space { space, .. } => space,
        }
    }

    /// Room whose counters and latest event represent this entry.
    pub fn preview_room(&self) -> &RoomId {
        match self {
            Self::Room(id) => id,
            Self::Space { preview, .. } => preview,
        }
    }

    /// Short form for logs.
    pub fn debug_identifier(&self) -> String {
        match self {
            Self::Room(id) => format!("Room({id})"),
            Self::Space { space, preview } => format!("Space({space} via {preview})"),
        }
    }
}

/// Own membership state in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Membership {
    /// Joined.
    #[default]
    Joined,
    /// Invited, not yet accepted.
    Invited,
    /// Requested to join.
    Knocked,
    /// Left.
    Left,
    /// Banned.
    Banned,
}

/// Per-room notification override chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMode {
    /// Notify for every message.
    AllMessages,
    /// Notify for mentions and keywords only.
    MentionsAndKeywordsOnly,
    /// Never notify.
    Mute,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Fully qualified user ID.
    pub user_id: String,
    /// Display name, if set.
    pub display_name: Option<String>,
    /// Avatar URL, if set.
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to the user ID.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Descriptive fields for one room, as answered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomInfo {
    /// Room ID.
    pub id: RoomId,
    /// Computed display name. `None` before the engine could compute one.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Direct (one-to-one) conversation.
    pub is_direct: bool,
    /// Room is a space.
    pub is_space: bool,
    /// Own membership.
    pub membership: Membership,
    /// Who invited us, for invites.
    pub inviter: Option<UserProfile>,
    /// Members used to name and illustrate unnamed rooms.
    pub heroes: Vec<UserProfile>,
    /// Joined plus invited members.
    pub active_members_count: u64,
    /// Unread messages.
    pub num_unread_messages: u64,
    /// Unread mentions.
    pub num_unread_mentions: u64,
    /// Unread notifications.
    pub num_unread_notifications: u64,
    /// User-defined notification mode, if any.
    pub notification_mode: Option<NotificationMode>,
    /// Canonical alias.
    pub canonical_alias: Option<String>,
    /// Alternative aliases.
    pub alternative_aliases: Vec<String>,
    /// A call is ongoing.
    pub has_room_call: bool,
    /// Manually marked unread.
    pub is_marked_unread: bool,
    /// Tagged favourite.
    pub is_favourite: bool,
    /// Tagged low priority.
    pub is_low_priority: bool,
    /// Replacement room when this one is tombstoned.
    pub successor_room: Option<RoomId>,
}

/// Sender of an event, with the profile known at the time it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSender {
    /// Sender user ID.
    pub user_id: String,
    /// Display name, if known.
    pub display_name: Option<String>,
}

impl EventSender {
    /// Display name, falling back to the user ID.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Content of the latest event, reduced to what a preview needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text message.
    Text {
        /// Message body.
        body: String,
    },
    /// Server notice or bot message.
    Notice {
        /// Message body.
        body: String,
    },
    /// `/me` message.
    Emote {
        /// Message body.
        body: String,
    },
    /// Image, with optional caption.
    Image {
        /// Caption.
        caption: Option<String>,
    },
    /// Video, with optional caption.
    Video {
        /// Caption.
        caption: Option<String>,
    },
    /// Voice or audio clip.
    Audio,
    /// File attachment.
    File {
        /// File name.
        filename: String,
    },
    /// Shared location.
    Location,
    /// Poll.
    Poll {
        /// Poll question.
        question: String,
    },
    /// Redacted event.
    Redacted,
    /// State change already rendered by the engine (e.g. "Alice joined").
    State {
        /// Human-readable description.
        description: String,
    },
}

/// The latest event of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestEvent {
    /// Local echo not yet confirmed by the server.
    Local {
        /// Milliseconds since the Unix epoch.
        timestamp_ms: u64,
        /// Sender (always ourselves).
        sender: EventSender,
        /// Content.
        content: MessageContent,
        /// Still being sent; `false` means sending failed.
        is_sending: bool,
    },
    /// Event received from the server.
    Remote {
        /// Milliseconds since the Unix epoch.
        timestamp_ms: u64,
        /// Sender.
        sender: EventSender,
        /// Sent by ourselves.
        is_own: bool,
        /// Content.
        content: MessageContent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_entry_is_identified_by_space() {
        let entry = RawEntry::Space { space: "!space".into(), preview: "!child".into() };
        assert_eq!(entry.id().as_str(), "!space");
        assert_eq!(entry.preview_room().as_str(), "!child");

        let entry = RawEntry::Room("!room".into());
        assert_eq!(entry.id(), entry.preview_room());
    }

    #[test]
    fn profile_name_falls_back_to_user_id() {
        let profile =
            UserProfile { user_id: "@bob:example.org".into(), display_name: None, avatar_url: None };
        assert_eq!(profile.name(), "@bob:example.org");
    }
}
