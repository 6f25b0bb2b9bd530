//! Stage 8 — coverage verification.
//!
//! Confirms the union of final edges still covers every ingested trail: the
//! pipeline may move geometry (snapping, simplification) but must never
//! lose it.  Violations are warnings by default and fatal in strict mode.

use serde::Serialize;

use tg_geom::coverage::uncovered_length_m;

use crate::{NetError, NetResult, Workspace};

#[derive(Debug, Clone, Serialize)]
pub struct CoverageWarning {
    pub trail_uuid: String,
    pub uncovered_m: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageStats {
    pub trails_checked: usize,
    pub warnings: Vec<CoverageWarning>,
}

/// Verify that every trail is covered by the final edge set within
/// tolerance.  The reporting threshold is `max(0.5 m, 0.1 ×
/// edge_snap_tolerance)`.
pub fn verify_coverage(
    ws: &Workspace,
    edge_snap_tolerance_m: f64,
    strict: bool,
) -> NetResult<CoverageStats> {
    let threshold_m = (0.1 * edge_snap_tolerance_m).max(0.5);
    // Samples may sit a simplification-tolerance away from the edges; the
    // test tolerance is the snap tolerance, the threshold only gates the
    // *accumulated* uncovered length.
    let index = ws.edge_segment_index();

    let mut stats = CoverageStats::default();
    for trail in &ws.trails {
        stats.trails_checked += 1;
        let uncovered = uncovered_length_m(&trail.geom, &index, edge_snap_tolerance_m);
        if uncovered > threshold_m {
            log::warn!(
                "coverage gap: trail {} has {:.2} m uncovered (threshold {:.2} m)",
                trail.uuid,
                uncovered,
                threshold_m
            );
            stats.warnings.push(CoverageWarning {
                trail_uuid: trail.uuid.clone(),
                uncovered_m: uncovered,
            });
        }
    }

    if strict {
        if let Some(worst) = stats
            .warnings
            .iter()
            .max_by(|a, b| a.uncovered_m.partial_cmp(&b.uncovered_m).unwrap_or(std::cmp::Ordering::Equal))
        {
            return Err(NetError::CoverageGap {
                trail_uuid: worst.trail_uuid.clone(),
                uncovered_m: worst.uncovered_m,
            });
        }
    }
    Ok(stats)
}
