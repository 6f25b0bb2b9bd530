//! `tg-net` — staging workspace and the network construction pipeline.
//!
//! Converts a messy trail linestring corpus into a clean routing graph:
//! planar noding, vertex clustering under a fixpoint, degree-2 chain
//! collapse, and coverage verification.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`workspace`] | `Workspace` — tables, staging dir, lifecycle            |
//! | [`model`]     | `Edge`, `Vertex`, `TrailSegment`, `VertexClass`         |
//! | [`ingest`]    | stage 1 — trail ingest and normalization                |
//! | [`bridge`]    | stage 2 — trail-level bridging                          |
//! | [`noding`]    | stage 3 — planar noding                                 |
//! | [`vertices`]  | stage 4 — vertex construction & endpoint binding        |
//! | [`reconcile`] | stage 5 — snap / connector spanning / KNN merge         |
//! | [`simplify`]  | stage 6 — simplification & deduplication                |
//! | [`collapse`]  | stage 7 — degree-2 chain collapse (atomic fixpoint)     |
//! | [`coverage`]  | stage 8 — coverage verification                         |
//! | [`pipeline`]  | orchestration + `PipelineReport`                        |
//! | [`error`]     | `NetError`, `NetResult<T>`                              |

pub mod bridge;
pub mod collapse;
pub mod coverage;
pub mod error;
pub mod ingest;
pub mod model;
pub mod noding;
pub mod pipeline;
pub mod reconcile;
pub mod simplify;
pub mod vertices;
pub mod workspace;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{NetError, NetResult};
pub use model::{Edge, TrailSegment, Vertex, VertexClass};
pub use pipeline::{run_network_pipeline, PipelineReport, RunOptions};
pub use workspace::Workspace;
