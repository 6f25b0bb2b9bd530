//! Dense integer ids for the workspace tables.
//!
//! A vertex or edge id is nothing more than a row number: stage passes
//! renumber both tables from zero whenever they compact, so every lookup is
//! a direct `Vec` index and ids are NOT stable across stages.  The newtypes
//! exist so a vertex table can never be indexed with an edge id by
//! accident.  `INVALID` (all bits set) marks bindings that have not been
//! assigned yet; post-stage cleanup removes any edge still carrying it
//! before the tables are handed on.

use std::fmt;

macro_rules! dense_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// An id naming no row.  `Default` yields this so an unbound
            /// reference is visibly unbound rather than row zero.
            pub const INVALID: Self = Self(u32::MAX);

            /// Id of the row at table position `i`.  Table sizes stay far
            /// below `u32::MAX`, so the narrowing cast cannot truncate in
            /// practice.
            #[inline]
            pub fn from_index(i: usize) -> Self {
                Self(i as u32)
            }

            /// The table row this id names.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// False only for the [`INVALID`](Self::INVALID) sentinel.
            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($tag, "{}"), self.0)
                } else {
                    f.write_str(concat!($tag, "-"))
                }
            }
        }
    };
}

dense_id!(
    /// Row number in the workspace vertex table.
    VertexId,
    "v"
);

dense_id!(
    /// Row number in the workspace edge table.
    EdgeId,
    "e"
);
