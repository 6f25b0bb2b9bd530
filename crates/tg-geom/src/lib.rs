//! `tg-geom` — the in-process geometry engine.
//!
//! The pipeline was specified against an external spatial store; this crate
//! supplies the same capability set in-process over `geo` + `rstar`:
//!
//! | Module        | Capability                                              |
//! |---------------|---------------------------------------------------------|
//! | [`geodesic`]  | haversine distance/length, meter↔degree conversion      |
//! | [`index`]     | R-tree point and segment indexes with metric queries    |
//! | [`noding`]    | planar noding: split linestrings at every crossing      |
//! | [`snap`]      | endpoint snapping, closest point on segment             |
//! | [`simplify`]  | topology-preserving simplification                      |
//! | [`merge`]     | oriented concatenation of edge chains (line-merge)      |
//! | [`profile`]   | elevation statistics over aligned z arrays              |
//! | [`coverage`]  | uncovered-length measurement against an edge set        |
//! | [`error`]     | `GeomError`, `GeomResult<T>`                            |
//!
//! All coordinates are WGS84 (x = longitude, y = latitude); all metric
//! results are meters from f64 haversine.

pub mod coverage;
pub mod error;
pub mod geodesic;
pub mod index;
pub mod merge;
pub mod noding;
pub mod profile;
pub mod simplify;
pub mod snap;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{GeomError, GeomResult};
pub use geodesic::{degrees_to_meters, haversine_m, line_length_km, line_length_m, meters_to_degrees};
pub use index::{PointIndex, SegmentIndex};
pub use merge::line_merge;
pub use noding::{node_linestrings, NodedPiece};
pub use profile::ElevationStats;
