//! Stage 1 — trail ingest and normalization.
//!
//! The master store already applied region and source filters in SQL; this
//! stage enforces the bbox intersection, drops invalid or zero-length
//! geometries, normalizes the elevation array to the coordinate count, and
//! recomputes derived lengths so downstream stages can trust them.

use serde::Serialize;

use tg_core::{BBox, Trail};
use tg_geom::{line_length_km, ElevationStats};

use crate::{NetError, NetResult, Workspace};

/// Ingest-stage filters resolved from the CLI.
#[derive(Debug, Clone, Default)]
pub struct IngestFilter {
    /// Only trails whose bbox intersects this envelope are kept.
    pub bbox: Option<BBox>,
    /// `--skip-geometry-validation`: keep trails that fail the geometry
    /// gate instead of dropping them (they are still excluded from noding
    /// crash paths by the zero-length check).
    pub skip_geometry_validation: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub offered: usize,
    pub loaded: usize,
    pub dropped_invalid_geometry: usize,
    pub dropped_zero_length: usize,
    pub dropped_outside_bbox: usize,
}

/// Copy matching trails into the workspace.
///
/// Fails with [`NetError::NoInputData`] when nothing survives the filters.
pub fn ingest(ws: &mut Workspace, trails: Vec<Trail>, filter: &IngestFilter) -> NetResult<IngestStats> {
    let mut stats = IngestStats { offered: trails.len(), ..Default::default() };

    for mut trail in trails {
        if let Some(bbox) = &filter.bbox {
            if !bbox.intersects(&trail.bbox) {
                stats.dropped_outside_bbox += 1;
                continue;
            }
        }

        if !trail.has_valid_geometry() {
            if !filter.skip_geometry_validation {
                stats.dropped_invalid_geometry += 1;
                log::debug!("dropping trail {} (invalid geometry)", trail.uuid);
                continue;
            }
        }

        // Normalize the z array: aligned with the coordinates, zero-filled
        // when the source had no elevation.
        let n = trail.geom.0.len();
        if trail.elevations.len() != n {
            trail.elevations = vec![0.0; n];
        }

        trail.length_km = line_length_km(&trail.geom);
        if trail.length_km <= 0.0 {
            stats.dropped_zero_length += 1;
            log::debug!("dropping trail {} (zero length)", trail.uuid);
            continue;
        }

        // Refresh derived elevation stats and bbox from the geometry we will
        // actually node.
        let ele = ElevationStats::of(&trail.elevations);
        trail.elevation_gain = ele.gain;
        trail.elevation_loss = ele.loss;
        trail.max_elevation = ele.max;
        trail.min_elevation = ele.min;
        trail.avg_elevation = ele.avg;
        if let Some(bbox) = BBox::of_linestring(&trail.geom) {
            trail.bbox = bbox;
        }

        ws.trails.push(trail);
        stats.loaded += 1;
    }

    if stats.loaded == 0 {
        return Err(NetError::NoInputData);
    }
    log::info!(
        "ingested {} trails ({} offered, {} dropped)",
        stats.loaded,
        stats.offered,
        stats.offered - stats.loaded
    );
    Ok(stats)
}
