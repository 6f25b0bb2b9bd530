//! Stage 2 — trail-level bridging.
//!
//! Short straight connector trails are inserted between trail endpoints
//! that lie within the bridging tolerance but are not already joined by a
//! direct segment.  The subsequent planar noding then stitches the
//! otherwise-disconnected networks.  Exactly one bridge per endpoint pair.

use geo::Coord;
use rustc_hash::FxHashSet;
use serde::Serialize;
use uuid::Uuid;

use tg_core::Trail;
use tg_geom::{haversine_m, line_length_km, PointIndex};

use crate::{NetResult, Workspace};

#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeStats {
    pub endpoint_pairs_considered: usize,
    pub bridges_inserted: usize,
}

/// Coordinate quantized to ~0.1 mm for exact-pair bookkeeping.
fn quantize(c: Coord<f64>) -> (i64, i64) {
    ((c.x * 1e9).round() as i64, (c.y * 1e9).round() as i64)
}

fn pair_key(a: Coord<f64>, b: Coord<f64>) -> ((i64, i64), (i64, i64)) {
    let (qa, qb) = (quantize(a), quantize(b));
    if qa <= qb { (qa, qb) } else { (qb, qa) }
}

/// Insert synthetic connector trails closing sub-tolerance endpoint gaps.
/// No-op when bridging is disabled in configuration.
pub fn bridge_trails(ws: &mut Workspace, tolerance_m: f64, enabled: bool) -> NetResult<BridgeStats> {
    let mut stats = BridgeStats::default();
    if !enabled || ws.trails.is_empty() {
        return Ok(stats);
    }

    // Endpoint catalogue: (trail index, coord, elevation).
    struct Endpoint {
        trail: usize,
        coord: Coord<f64>,
        elevation: f64,
    }
    let mut endpoints: Vec<Endpoint> = Vec::with_capacity(ws.trails.len() * 2);
    for (ti, t) in ws.trails.iter().enumerate() {
        let Some((start, end)) = t.endpoints() else { continue };
        let (ze_start, ze_end) = t.endpoint_elevations();
        endpoints.push(Endpoint { trail: ti, coord: start, elevation: ze_start });
        endpoints.push(Endpoint { trail: ti, coord: end, elevation: ze_end });
    }

    // Segments that already join a coordinate pair directly — a bridge there
    // would duplicate existing geometry.
    let mut direct: FxHashSet<((i64, i64), (i64, i64))> = FxHashSet::default();
    for t in &ws.trails {
        for seg in t.geom.lines() {
            direct.insert(pair_key(seg.start, seg.end));
        }
    }

    let index = PointIndex::build(
        endpoints.iter().enumerate().map(|(i, e)| (i as u32, e.coord)),
    );

    let mut bridged: FxHashSet<((i64, i64), (i64, i64))> = FxHashSet::default();
    let region = ws.region.clone();
    let mut new_trails: Vec<Trail> = Vec::new();

    for (i, a) in endpoints.iter().enumerate() {
        for j in index.within(a.coord, tolerance_m) {
            let j = j as usize;
            if j <= i {
                continue;
            }
            let b = &endpoints[j];
            if a.trail == b.trail {
                continue;
            }
            stats.endpoint_pairs_considered += 1;

            let gap_m = haversine_m(a.coord, b.coord);
            if gap_m <= 0.0 {
                continue; // coincident endpoints need no bridge
            }

            let key = pair_key(a.coord, b.coord);
            if direct.contains(&key) || !bridged.insert(key) {
                continue;
            }

            let mut bridge = Trail::connector(
                format!("connector-{}", Uuid::new_v4()),
                &region,
                a.coord,
                b.coord,
                a.elevation,
                b.elevation,
            );
            bridge.length_km = line_length_km(&bridge.geom);
            log::debug!(
                "bridging {:.2} m gap between trail {} and trail {}",
                gap_m,
                ws.trails[a.trail].uuid,
                ws.trails[b.trail].uuid
            );
            new_trails.push(bridge);
        }
    }

    stats.bridges_inserted = new_trails.len();
    ws.trails.extend(new_trails);
    if stats.bridges_inserted > 0 {
        log::info!("inserted {} bridging connector trail(s)", stats.bridges_inserted);
    }
    Ok(stats)
}
