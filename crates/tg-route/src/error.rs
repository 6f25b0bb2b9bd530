//! Route-search error type.

use thiserror::Error;

/// Errors produced by route generation.  An exhausted search is a warning,
/// not an error — partial results are returned.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route geometry error: {0}")]
    Geometry(#[from] tg_geom::GeomError),
}

pub type RouteResult<T> = Result<T, RouteError>;
