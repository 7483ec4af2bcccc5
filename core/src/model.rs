//! Domain entities and id newtypes.
//!
//! Users are owned by the identity service; within the spreads domain a user
//! is only ever an opaque [`UserId`]. Cards and layouts are read-only
//! catalogs seeded by migration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a user in the identity service.
    UserId
);
uuid_id!(
    /// Identifier of a spread.
    SpreadId
);
uuid_id!(
    /// Identifier of an interpretation.
    InterpretationId
);
uuid_id!(
    /// Identifier of a card in the catalog.
    CardId
);
uuid_id!(
    /// Identifier of a layout in the catalog.
    LayoutId
);
uuid_id!(
    /// Identifier of a published broker event.
    EventId
);

/// Whether a card belongs to the major or minor arcana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arcana {
    /// One of the 22 named trumps.
    Major,
    /// One of the 56 suit cards.
    Minor,
}

impl Arcana {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }

    /// Parse the database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            _ => None,
        }
    }
}

/// A card in the static 78-card catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Catalog id.
    pub id: CardId,
    /// Card name, e.g. "The Fool" or "Three of Cups".
    pub name: String,
    /// Major or minor arcana.
    pub arcana: Arcana,
}

/// A named layout fixing how many cards a spread contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Catalog id.
    pub id: LayoutId,
    /// Layout name, e.g. "celtic-cross".
    pub name: String,
    /// Number of cards a spread under this layout holds. Always positive.
    pub cards_count: i32,
}

/// A single drawn card within a spread.
///
/// Positions are 1-based and contiguous within a spread; the reversed flag
/// is assigned once at draw time and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadCard {
    /// The catalog card this position holds.
    pub card_id: CardId,
    /// Card name, denormalized for display.
    pub card_name: String,
    /// Position within the spread, `1..=cards_count`.
    pub position: i32,
    /// Whether the card was drawn reversed.
    pub reversed: bool,
}

/// A tarot reading instance: a question plus N drawn cards under a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    /// Spread id.
    pub id: SpreadId,
    /// Optional question the spread was drawn for.
    pub question: Option<String>,
    /// Owning author. Lives in the identity service.
    pub author_id: UserId,
    /// Layout the spread was drawn under.
    pub layout_id: LayoutId,
    /// Creation time, immutable once set.
    pub created_at: DateTime<Utc>,
    /// The drawn cards, ordered by position.
    pub cards: Vec<SpreadCard>,
}

/// A single author's written reading of a spread.
///
/// At most one interpretation exists per (author, spread) pair; the body is
/// the only mutable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Interpretation id.
    pub id: InterpretationId,
    /// The spread being interpreted.
    pub spread_id: SpreadId,
    /// Owning author.
    pub author_id: UserId,
    /// Interpretation text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One page of an offset-paged listing, with total-count metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Zero-based page number that was requested.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
    /// Total number of items across all pages.
    pub total: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn arcana_roundtrip() {
        for arcana in [Arcana::Major, Arcana::Minor] {
            assert_eq!(Arcana::parse(arcana.as_str()), Some(arcana));
        }
        assert_eq!(Arcana::parse("court"), None);
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(SpreadId::new(), SpreadId::new());
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
