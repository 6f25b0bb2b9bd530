//! `tg-core` — foundational types for the trailgraph pipeline.
//!
//! This crate is a dependency of every other `tg-*` crate.  It intentionally
//! has no `tg-*` dependencies and minimal external ones (`geo` for the
//! working geometry type, `serde` for configuration, `thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                             |
//! |-------------|------------------------------------------------------|
//! | [`ids`]     | `VertexId`, `EdgeId`                                 |
//! | [`bbox`]    | `BBox` — WGS84 axis-aligned envelope                 |
//! | [`trail`]   | `Trail` — the input record (2D geometry + elevations)|
//! | [`config`]  | `Config` and all nested configuration sections       |
//! | [`error`]   | `CoreError`, `CoreResult`                            |

pub mod bbox;
pub mod config;
pub mod error;
pub mod ids;
pub mod trail;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bbox::BBox;
pub use config::{Config, CostConfig, RegionConfig, RoutePattern, RouteShape, Tolerances};
pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, VertexId};
pub use trail::Trail;
