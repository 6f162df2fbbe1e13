//! Filter specifications and their translation to source predicates.
//!
//! The UI picks a [`FilterSpec`]; [`compose_filter`] turns it into the
//! [`SourceFilter`] tree the source evaluates. Every spec except
//! [`FilterSpec::ExcludeAll`] is combined with the structural base filter,
//! which hides left rooms and non-invited spaces and collapses upgraded room
//! versions. The base is not user-controlled.

use std::collections::BTreeSet;

use crate::entry::RoomId;

/// User-selectable quick filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoomFilter {
    /// Rooms with unread activity.
    Unreads,
    /// Direct conversations.
    People,
    /// Group rooms.
    Rooms,
    /// Favourites.
    Favourites,
    /// Low priority rooms.
    LowPriority,
    /// Pending invites.
    Invites,
}

/// The active filter. Exactly one is installed at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// Show nothing.
    ExcludeAll,
    /// Match room names against a query.
    SearchQuery(String),
    /// Intersection of the selected quick filters. Empty shows everything.
    ComposedFilters(BTreeSet<RoomFilter>),
    /// Quick filters restricted to a set of rooms.
    ScopedToIds {
        /// Rooms to keep.
        ids: Vec<RoomId>,
        /// Quick filters applied on top.
        filters: BTreeSet<RoomFilter>,
    },
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::ComposedFilters(BTreeSet::new())
    }
}

/// How search queries match room names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMatching {
    /// Case and diacritic insensitive substring match.
    #[default]
    Normalized,
    /// Fuzzy subsequence match.
    Fuzzy,
}

/// Filter-related settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterConfig {
    /// Matching strategy for [`FilterSpec::SearchQuery`].
    pub search_matching: SearchMatching,
    /// Hide low priority rooms unless the low priority filter is selected.
    pub low_priority_filter_enabled: bool,
}

/// Room category predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomCategory {
    /// Direct conversations.
    People,
    /// Group rooms.
    Group,
}

/// Predicate tree understood by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    /// Every child matches.
    All(Vec<SourceFilter>),
    /// At least one child matches.
    Any(Vec<SourceFilter>),
    /// Matches nothing.
    None,
    /// Not a space.
    NonSpace,
    /// Is a space.
    Space,
    /// Membership is not `left`.
    NonLeft,
    /// Membership is `joined`.
    Joined,
    /// Membership is `invited`.
    Invite,
    /// Has unread messages or is marked unread.
    Unread,
    /// Tagged favourite.
    Favourite,
    /// Tagged low priority.
    LowPriority,
    /// Not tagged low priority.
    NonLowPriority,
    /// Room category.
    Category(RoomCategory),
    /// Hide rooms superseded by a joined successor.
    DeduplicateVersions,
    /// Fuzzy name match.
    FuzzyMatchRoomName(String),
    /// Normalized substring name match.
    NormalizedMatchRoomName(String),
    /// Room is one of these.
    Identifiers(Vec<RoomId>),
}

impl RoomFilter {
    /// Source predicate for this quick filter.
    ///
    /// Filters over joined rooms are restricted to `joined` so invites only
    /// appear under [`RoomFilter::Invites`].
    pub fn to_source(self) -> SourceFilter {
        let kind = match self {
            Self::Invites => return SourceFilter::Invite,
            Self::Unreads => SourceFilter::Unread,
            Self::People => SourceFilter::Category(RoomCategory::People),
            Self::Rooms => SourceFilter::Category(RoomCategory::Group),
            Self::Favourites => SourceFilter::Favourite,
            Self::LowPriority => SourceFilter::LowPriority,
        };
        SourceFilter::All(vec![kind, SourceFilter::Joined])
    }
}

/// Structural predicates active under every user filter.
pub fn base_filters() -> Vec<SourceFilter> {
    vec![
        SourceFilter::Any(vec![
            SourceFilter::All(vec![SourceFilter::NonSpace, SourceFilter::NonLeft]),
            SourceFilter::All(vec![SourceFilter::Space, SourceFilter::Invite]),
        ]),
        SourceFilter::DeduplicateVersions,
    ]
}

/// Translate a filter spec into the source predicate that replaces the
/// current one.
pub fn compose_filter(spec: &FilterSpec, config: &FilterConfig) -> SourceFilter {
    match spec {
        FilterSpec::ExcludeAll => SourceFilter::None,
        FilterSpec::SearchQuery(query) => {
            let matcher = match config.search_matching {
                SearchMatching::Fuzzy => SourceFilter::FuzzyMatchRoomName(query.clone()),
                SearchMatching::Normalized => SourceFilter::NormalizedMatchRoomName(query.clone()),
            };
            let mut filters = vec![matcher];
            filters.extend(base_filters());
            SourceFilter::All(filters)
        },
        FilterSpec::ComposedFilters(filters) => composed(filters, None, config),
        FilterSpec::ScopedToIds { ids, filters } => composed(filters, Some(ids.as_slice()), config),
    }
}

fn composed(
    selected: &BTreeSet<RoomFilter>,
    ids: Option<&[RoomId]>,
    config: &FilterConfig,
) -> SourceFilter {
    let mut filters: Vec<_> = selected.iter().map(|f| f.to_source()).collect();
    filters.extend(base_filters());

    if config.low_priority_filter_enabled && !selected.contains(&RoomFilter::LowPriority) {
        filters.push(SourceFilter::NonLowPriority);
    }
    if let Some(ids) = ids {
        filters.push(SourceFilter::Identifiers(ids.to_vec()));
    }

    SourceFilter::All(filters)
}
