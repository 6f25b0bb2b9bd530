//! Core error type.
//!
//! Sub-crates define their own error enums and either convert `CoreError`
//! via `#[from]` or keep it as one variant.  Configuration problems are
//! always fatal at CLI entry, so they surface here rather than in any
//! stage-level error.

use thiserror::Error;

/// The top-level error type for `tg-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("invalid bbox '{0}': expected \"minLng,minLat,maxLng,maxLat\"")]
    InvalidBbox(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `tg-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
