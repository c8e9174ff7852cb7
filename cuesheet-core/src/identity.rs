//! Identity types for cuesheet entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
/// Serialized as RFC 3339, which sorts lexically in time order.
pub type Timestamp = DateTime<Utc>;

/// Common behavior of the strongly-typed entity identifiers.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Wrap an existing UUID.
    fn from_uuid(uuid: Uuid) -> Self;

    /// Borrow the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a new timestamp-sortable (UUIDv7) identifier.
    fn now_v7() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    /// The all-zero identifier. Used as a placeholder only.
    fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create from a raw UUID.
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl EntityIdType for $name {
            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|_| IdParseError {
                    kind: $label,
                    value: s.to_string(),
                })
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a clip.
    ClipId,
    "clip"
);
define_entity_id!(
    /// Identifier of a track.
    TrackId,
    "track"
);
define_entity_id!(
    /// Identifier of the campaign that owns tracks and clips.
    CampaignId,
    "campaign"
);
define_entity_id!(
    /// Identifier of the user a clip executes on behalf of.
    UserId,
    "user"
);

/// Error when parsing an identifier that is not UUID-shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} id: {}", self.kind, self.value)
    }
}

impl std::error::Error for IdParseError {}
