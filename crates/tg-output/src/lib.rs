//! `tg-output` — trail storage and export backends.
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`store`]   | master trail store (SQLite): install, load with filters   |
//! | [`sqlite`]  | embedded-database export, schema version 14               |
//! | [`geojson`] | layered GeoJSON export with per-layer visibility          |
//! | [`error`]   | `OutputError`, `OutputResult<T>`                          |
//!
//! The store and the sqlite exporter share the `trails` table layout, so a
//! produced database can serve as the source for a later run.

pub mod error;
pub mod geojson;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{OutputError, OutputResult};
pub use geojson::write_geojson;
pub use sqlite::{write_sqlite, SCHEMA_VERSION};
pub use store::TrailStore;
