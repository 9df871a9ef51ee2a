//! Identity types for rendered output.
//!
//! All identifiers are UUID-based. Identity (not value equality) is
//! what keeps in-place replacement surgical: a dynamic region keeps its
//! [`RegionId`] across re-renders, so the surface can swap exactly one
//! subtree without disturbing neighbouring cells.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Identifier for one output cell in a view's destination.
    ///
    /// A cell is either an accumulated run of plain text or a single
    /// resolved artifact. Cells are append-ordered; the id exists so a
    /// later surface command can address one cell in place.
    CellId
}

uuid_id! {
    /// Identifier for a dynamic region.
    ///
    /// A region is a rendered subtree that is replaced in place when a
    /// bound reactive state changes. The id is the *stable per-region
    /// identity* that replacement is keyed by, never the rendered
    /// value.
    RegionId
}

uuid_id! {
    /// Identifier for a streaming container.
    ///
    /// Produced when a dynamic callable is resolved; later emissions
    /// from the same producer append live children addressed by this id.
    StreamId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(RegionId::new(), RegionId::new());
        assert_ne!(CellId::new(), CellId::new());
        assert_ne!(StreamId::new(), StreamId::new());
    }

    #[test]
    fn ids_round_trip_through_serde() {
        let id = RegionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: RegionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
