//! The master trail store: an embedded SQLite database holding the raw
//! trail corpus the pipeline ingests from.
//!
//! The `trails` table layout matches the export format, so a database
//! produced by one run can serve as the source corpus for the next.
//! Geometry is stored as cached GeoJSON with per-coordinate elevation as
//! the third ordinate.

use std::path::Path;

use geo::{Coord, LineString};
use rusqlite::Connection;

use tg_core::{BBox, Trail};

use crate::OutputResult;

/// Master trail store handle.
pub struct TrailStore {
    conn: Connection,
}

impl TrailStore {
    /// Open an existing store.
    pub fn open(path: &Path) -> OutputResult<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    /// Create (or migrate) the store schema.  `install` on an existing
    /// store is harmless — all DDL is `IF NOT EXISTS`.
    pub fn install(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self::open(path)?;
        store.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS trails (
                 trail_uuid     TEXT PRIMARY KEY,
                 name           TEXT NOT NULL,
                 region         TEXT NOT NULL,
                 source         TEXT NOT NULL DEFAULT '',
                 trail_type     TEXT NOT NULL DEFAULT '',
                 surface        TEXT NOT NULL DEFAULT '',
                 difficulty     TEXT NOT NULL DEFAULT '',
                 length_km      REAL NOT NULL DEFAULT 0,
                 elevation_gain REAL NOT NULL DEFAULT 0,
                 elevation_loss REAL NOT NULL DEFAULT 0,
                 max_elevation  REAL NOT NULL DEFAULT 0,
                 min_elevation  REAL NOT NULL DEFAULT 0,
                 avg_elevation  REAL NOT NULL DEFAULT 0,
                 min_lng        REAL NOT NULL DEFAULT 0,
                 min_lat        REAL NOT NULL DEFAULT 0,
                 max_lng        REAL NOT NULL DEFAULT 0,
                 max_lat        REAL NOT NULL DEFAULT 0,
                 geojson        TEXT
             );
             CREATE INDEX IF NOT EXISTS idx_trails_region ON trails (region);
             CREATE INDEX IF NOT EXISTS idx_trails_source ON trails (region, source);",
        )?;
        log::info!("trail store schema installed at {}", path.display());
        Ok(store)
    }

    /// Insert (or replace) trails.  Returns the number written.
    pub fn insert_trails(&mut self, trails: &[Trail]) -> OutputResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO trails \
                 (trail_uuid, name, region, source, trail_type, surface, difficulty, \
                  length_km, elevation_gain, elevation_loss, max_elevation, min_elevation, \
                  avg_elevation, min_lng, min_lat, max_lng, max_lat, geojson) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            )?;
            for t in trails {
                stmt.execute(rusqlite::params![
                    t.uuid,
                    t.name,
                    t.region,
                    t.source,
                    t.trail_type,
                    t.surface,
                    t.difficulty,
                    t.length_km,
                    t.elevation_gain,
                    t.elevation_loss,
                    t.max_elevation,
                    t.min_elevation,
                    t.avg_elevation,
                    t.bbox.min_lng,
                    t.bbox.min_lat,
                    t.bbox.max_lng,
                    t.bbox.max_lat,
                    geometry_geojson(&t.geom, &t.elevations).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(trails.len())
    }

    /// Load trails for a region, optionally restricted to one source tag.
    /// The bbox filter is applied on the stored envelope; the precise
    /// geometry-level filtering happens at ingest.
    pub fn load_trails(
        &self,
        region: &str,
        source: Option<&str>,
        bbox: Option<&BBox>,
    ) -> OutputResult<Vec<Trail>> {
        let mut sql = String::from(
            "SELECT trail_uuid, name, region, source, trail_type, surface, difficulty, \
             length_km, elevation_gain, elevation_loss, max_elevation, min_elevation, \
             avg_elevation, min_lng, min_lat, max_lng, max_lat, geojson \
             FROM trails WHERE region = ?1",
        );
        if source.is_some() {
            sql.push_str(" AND source = ?2");
        }
        sql.push_str(" ORDER BY trail_uuid");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match source {
            Some(s) => stmt.query_map(rusqlite::params![region, s], row_to_trail)?,
            None => stmt.query_map(rusqlite::params![region], row_to_trail)?,
        };

        let mut trails = Vec::new();
        for row in rows {
            let Some(trail) = row? else { continue };
            if let Some(bbox) = bbox {
                if !bbox.intersects(&trail.bbox) {
                    continue;
                }
            }
            trails.push(trail);
        }
        log::info!("loaded {} trails for region '{}'", trails.len(), region);
        Ok(trails)
    }
}

/// Map a `trails` row to the working form.  Rows whose geometry is missing
/// or unparseable yield `None` and are skipped by the loader.
fn row_to_trail(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<Trail>> {
    let geojson: Option<String> = row.get(17)?;
    let Some((geom, elevations)) = geojson.as_deref().and_then(parse_geometry_geojson) else {
        return Ok(None);
    };
    Ok(Some(Trail {
        uuid: row.get(0)?,
        name: row.get(1)?,
        region: row.get(2)?,
        source: row.get(3)?,
        trail_type: row.get(4)?,
        surface: row.get(5)?,
        difficulty: row.get(6)?,
        length_km: row.get(7)?,
        elevation_gain: row.get(8)?,
        elevation_loss: row.get(9)?,
        max_elevation: row.get(10)?,
        min_elevation: row.get(11)?,
        avg_elevation: row.get(12)?,
        bbox: BBox::new(row.get(13)?, row.get(14)?, row.get(15)?, row.get(16)?),
        geom,
        elevations,
        connector: false,
    }))
}

// ── Geometry JSON (shared with the exporters) ─────────────────────────────────

/// GeoJSON `LineString` geometry; elevation becomes the third ordinate
/// when an aligned z array is supplied, else coordinates stay 2D.
pub(crate) fn geometry_geojson(line: &LineString<f64>, elevations: &[f64]) -> serde_json::Value {
    let coords: Vec<serde_json::Value> = line
        .0
        .iter()
        .enumerate()
        .map(|(i, c)| match elevations.get(i) {
            Some(z) => serde_json::json!([c.x, c.y, z]),
            None => serde_json::json!([c.x, c.y]),
        })
        .collect();
    serde_json::json!({ "type": "LineString", "coordinates": coords })
}

/// Parse a stored geometry back into the working form.
pub(crate) fn parse_geometry_geojson(raw: &str) -> Option<(LineString<f64>, Vec<f64>)> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if value.get("type")?.as_str()? != "LineString" {
        return None;
    }
    let coords = value.get("coordinates")?.as_array()?;
    let mut line = Vec::with_capacity(coords.len());
    let mut elevations = Vec::with_capacity(coords.len());
    for c in coords {
        let c = c.as_array()?;
        let x = c.first()?.as_f64()?;
        let y = c.get(1)?.as_f64()?;
        let z = c.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0);
        line.push(Coord { x, y });
        elevations.push(z);
    }
    if line.len() < 2 {
        return None;
    }
    Some((LineString::new(line), elevations))
}
