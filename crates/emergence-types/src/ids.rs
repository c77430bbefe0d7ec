//! Type-safe identifier wrappers around [`Uuid`].
//!
//! The observer serializes every entity identifier as a bare UUID string.
//! Wrapping them keeps an agent ID from being passed where a location ID
//! is expected when building queries or grouping decisions.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            ///
            /// The client never mints identifiers for the simulation; this
            /// exists for fixtures and test doubles.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of an agent in the simulation.
    AgentId
}

define_id! {
    /// Identifier of a location node in the world graph.
    LocationId
}

define_id! {
    /// Identifier of a route edge in the world graph.
    RouteId
}

define_id! {
    /// Identifier of an event in the observer's event log.
    ///
    /// This is the identity used to deduplicate notifications.
    EventId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_serializes_as_bare_uuid_string() {
        let id = AgentId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
    }

    #[test]
    fn id_parses_from_str() {
        let raw = "01945c2a-3b4f-7def-8a12-bc34567890ab";
        let parsed = raw.parse::<LocationId>();
        assert_eq!(parsed.map(|id| id.to_string()).ok().as_deref(), Some(raw));
    }

    #[test]
    fn id_rejects_garbage() {
        assert!("not-a-uuid".parse::<EventId>().is_err());
        let decoded: Result<EventId, _> = serde_json::from_str("\"nope\"");
        assert!(decoded.is_err());
    }
}
