//! Evaluation of source filters against simulated rooms.

use std::collections::BTreeMap;

use roomlist_core::{Membership, RoomCategory, RoomId, SourceFilter};

use crate::sim_source::SimRoom;

/// True if `room` passes `filter`.
///
/// `rooms` is the full catalog, needed to resolve successor rooms for
/// version deduplication.
pub fn matches(filter: &SourceFilter, room: &SimRoom, rooms: &BTreeMap<RoomId, SimRoom>) -> bool {
    let info = &room.info;
    match filter {
        SourceFilter::All(filters) => filters.iter().all(|f| matches(f, room, rooms)),
        SourceFilter::Any(filters) => filters.iter().any(|f| matches(f, room, rooms)),
        SourceFilter::None => false,
        SourceFilter::NonSpace => !info.is_space,
        SourceFilter::Space => info.is_space,
        SourceFilter::NonLeft => info.membership != Membership::Left,
        SourceFilter::Joined => info.membership == Membership::Joined,
        SourceFilter::Invite => info.membership == Membership::Invited,
        SourceFilter::Unread => info.num_unread_messages > 0 || info.is_marked_unread,
        SourceFilter::Favourite => info.is_favourite,
        SourceFilter::LowPriority => info.is_low_priority,
        SourceFilter::NonLowPriority => !info.is_low_priority,
        SourceFilter::Category(RoomCategory::People) => info.is_direct,
        SourceFilter::Category(RoomCategory::Group) => !info.is_direct,
        SourceFilter::DeduplicateVersions => !info
            .successor_room
            .as_ref()
            .and_then(|successor| rooms.get(successor))
            .is_some_and(|successor| successor.info.membership == Membership::Joined),
        SourceFilter::FuzzyMatchRoomName(pattern) => fuzzy_match(room.name(), pattern),
        SourceFilter::NormalizedMatchRoomName(pattern) => {
            normalize(room.name()).contains(&normalize(pattern))
        },
        SourceFilter::Identifiers(ids) => ids.contains(&info.id),
    }
}

/// Lowercase with common Latin diacritics folded away.
pub fn normalize(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).map(fold_diacritic).collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Every pattern character appears in `text`, in order.
pub fn fuzzy_match(text: &str, pattern: &str) -> bool {
    let text = normalize(text);
    let mut haystack = text.chars();
    normalize(pattern).chars().filter(|c| !c.is_whitespace()).all(|c| haystack.any(|h| h == c))
}
