//! Geometry-engine error type.

use thiserror::Error;

/// Errors produced by `tg-geom`.
#[derive(Debug, Error)]
pub enum GeomError {
    #[error("empty geometry where at least two points are required")]
    EmptyGeometry,

    #[error("cannot line-merge chain: {0}")]
    ChainMerge(String),
}

pub type GeomResult<T> = Result<T, GeomError>;
