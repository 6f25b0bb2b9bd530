//! Embedded-database export (schema version 14).
//!
//! Writes the cleaned graph and route recommendations into a single SQLite
//! file: `trails`, `routing_nodes`, `routing_edges`,
//! `route_recommendations`, `region_metadata`, `schema_version`.
//! Every geometry column is cached GeoJSON.
//!
//! An edge referencing a trail uuid missing from the trail table gets a
//! placeholder trail row (with a warning) — the export never fails on a
//! schema mismatch.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use tg_net::Workspace;
use tg_route::RouteRecommendation;

use crate::store::geometry_geojson;
use crate::OutputResult;

/// Exported schema version.
pub const SCHEMA_VERSION: i64 = 14;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStats {
    pub trails: usize,
    pub placeholder_trails: usize,
    pub nodes: usize,
    pub edges: usize,
    pub routes: usize,
}

/// Write the workspace (and routes) to `path`.  With `trails_only`, only
/// the trail table and metadata are exported.
pub fn write_sqlite(
    path: &Path,
    ws: &Workspace,
    routes: &[RouteRecommendation],
    trails_only: bool,
) -> OutputResult<ExportStats> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let conn = Connection::open(path)?;
    let mut stats = ExportStats::default();

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous  = NORMAL;
         CREATE TABLE schema_version (version INTEGER NOT NULL);
         CREATE TABLE trails (
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
         CREATE TABLE routing_nodes (
             id        INTEGER PRIMARY KEY,
             lat       REAL NOT NULL,
             lng       REAL NOT NULL,
             elevation REAL NOT NULL DEFAULT 0,
             node_type TEXT NOT NULL,
             degree    INTEGER NOT NULL
         );
         CREATE TABLE routing_edges (
             id             INTEGER PRIMARY KEY,
             source         INTEGER NOT NULL,
             target         INTEGER NOT NULL,
             trail_uuid     TEXT,
             trail_name     TEXT,
             length_km      REAL NOT NULL,
             elevation_gain REAL NOT NULL DEFAULT 0,
             elevation_loss REAL NOT NULL DEFAULT 0,
             geojson        TEXT NOT NULL
         );
         CREATE TABLE route_recommendations (
             route_uuid                 TEXT PRIMARY KEY,
             region                     TEXT NOT NULL,
             input_length_km            REAL NOT NULL,
             input_elevation_gain       REAL NOT NULL,
             recommended_length_km      REAL NOT NULL,
             recommended_elevation_gain REAL NOT NULL,
             route_shape                TEXT NOT NULL,
             trail_count                INTEGER NOT NULL,
             route_score                REAL NOT NULL,
             route_path                 TEXT NOT NULL,
             route_edges                TEXT NOT NULL,
             route_name                 TEXT NOT NULL,
             created_at                 TEXT NOT NULL DEFAULT (datetime('now'))
         );
         CREATE TABLE region_metadata (
             region      TEXT PRIMARY KEY,
             trail_count INTEGER NOT NULL,
             node_count  INTEGER NOT NULL,
             edge_count  INTEGER NOT NULL,
             route_count INTEGER NOT NULL,
             created_at  TEXT NOT NULL DEFAULT (datetime('now'))
         );",
    )?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])?;

    // ── Trails ────────────────────────────────────────────────────────────
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR REPLACE INTO trails \
             (trail_uuid, name, region, source, trail_type, surface, difficulty, \
              length_km, elevation_gain, elevation_loss, max_elevation, min_elevation, \
              avg_elevation, min_lng, min_lat, max_lng, max_lat, geojson) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )?;
        for t in &ws.trails {
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
            stats.trails += 1;
        }

        // Placeholder rows for trail uuids referenced by edges but absent
        // from the trail table.
        if !trails_only {
            let known: BTreeSet<&str> = ws.trails.iter().map(|t| t.uuid.as_str()).collect();
            let referenced: BTreeSet<(&str, &str)> = ws
                .edges
                .iter()
                .filter_map(|e| {
                    e.trail_uuid
                        .as_deref()
                        .map(|u| (u, e.trail_name.as_deref().unwrap_or("Unknown Trail")))
                })
                .collect();
            for (uuid, name) in referenced {
                if known.contains(uuid) {
                    continue;
                }
                log::warn!("edge references missing trail {uuid}; inserting placeholder");
                stmt.execute(rusqlite::params![
                    uuid,
                    name,
                    ws.region,
                    "placeholder",
                    "",
                    "",
                    "",
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    Option::<String>::None,
                ])?;
                stats.placeholder_trails += 1;
            }
        }
    }
    tx.commit()?;

    if trails_only {
        write_region_metadata(&conn, ws, &stats)?;
        log::info!("exported {} trails (trails-only) to {}", stats.trails, path.display());
        return Ok(stats);
    }

    // ── Nodes ─────────────────────────────────────────────────────────────
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO routing_nodes (id, lat, lng, elevation, node_type, degree) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for v in &ws.vertices {
            stmt.execute(rusqlite::params![
                v.id.0 as i64,
                v.coord.y,
                v.coord.x,
                v.elevation,
                v.class().as_str(),
                v.cnt as i64,
            ])?;
            stats.nodes += 1;
        }
    }
    tx.commit()?;

    // ── Edges ─────────────────────────────────────────────────────────────
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO routing_edges \
             (id, source, target, trail_uuid, trail_name, length_km, \
              elevation_gain, elevation_loss, geojson) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for e in &ws.edges {
            stmt.execute(rusqlite::params![
                e.id.0 as i64,
                e.source.0 as i64,
                e.target.0 as i64,
                e.trail_uuid,
                e.trail_name,
                e.length_km,
                e.elevation_gain,
                e.elevation_loss,
                geometry_geojson(&e.geom, &[]).to_string(),
            ])?;
            stats.edges += 1;
        }
    }
    tx.commit()?;

    // ── Routes ────────────────────────────────────────────────────────────
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO route_recommendations \
             (route_uuid, region, input_length_km, input_elevation_gain, \
              recommended_length_km, recommended_elevation_gain, route_shape, \
              trail_count, route_score, route_path, route_edges, route_name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for r in routes {
            let path_json = serde_json::to_string(
                &r.vertex_ids.iter().map(|v| v.0).collect::<Vec<_>>(),
            )?;
            let edges_json =
                serde_json::to_string(&r.edge_ids.iter().map(|e| e.0).collect::<Vec<_>>())?;
            stmt.execute(rusqlite::params![
                r.uuid,
                r.region,
                r.input_distance_km,
                r.input_elevation_gain,
                r.distance_km,
                r.elevation_gain,
                r.shape.as_str(),
                r.trail_count as i64,
                r.score,
                path_json,
                edges_json,
                r.name,
            ])?;
            stats.routes += 1;
        }
    }
    tx.commit()?;

    write_region_metadata(&conn, ws, &stats)?;
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;

    log::info!(
        "exported {} trails, {} nodes, {} edges, {} routes to {}",
        stats.trails,
        stats.nodes,
        stats.edges,
        stats.routes,
        path.display()
    );
    Ok(stats)
}

fn write_region_metadata(conn: &Connection, ws: &Workspace, stats: &ExportStats) -> OutputResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO region_metadata \
         (region, trail_count, node_count, edge_count, route_count) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            ws.region,
            stats.trails as i64,
            stats.nodes as i64,
            stats.edges as i64,
            stats.routes as i64,
        ],
    )?;
    Ok(())
}
