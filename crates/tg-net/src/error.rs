//! Network-pipeline error type.

use thiserror::Error;

/// Errors produced by the network construction pipeline.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("no trails matched the region/bbox/source filters")]
    NoInputData,

    #[error("geometry invariant violated: {0}")]
    GeometryInvariant(String),

    #[error("geometry engine error: {0}")]
    Geometry(#[from] tg_geom::GeomError),

    #[error("trail {trail_uuid} has {uncovered_m:.2} m uncovered by the final edge set")]
    CoverageGap { trail_uuid: String, uncovered_m: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetResult<T> = Result<T, NetError>;
