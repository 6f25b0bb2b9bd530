//! `tg-route` — route generation over the cleaned trail graph.
//!
//! Consumes the workspace produced by `tg-net` and emits scored route
//! recommendations per configured pattern.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`graph`]   | `RouteGraph` — CSR adjacency over final edges             |
//! | [`ksp`]     | Dijkstra + Yen's k-shortest simple paths                  |
//! | [`circuit`] | elementary circuit enumeration with length pruning        |
//! | [`cost`]    | the banded preference cost model (pure functions)         |
//! | [`shape`]   | shape classification and route naming                     |
//! | [`search`]  | per-pattern orchestration with adaptive relaxation        |
//! | [`error`]   | `RouteError`, `RouteResult<T>`                            |

pub mod circuit;
pub mod cost;
pub mod error;
pub mod graph;
pub mod ksp;
pub mod search;
pub mod shape;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{RouteError, RouteResult};
pub use graph::RouteGraph;
pub use search::{generate_routes, RouteRecommendation, SearchStats};
