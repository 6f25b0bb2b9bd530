//! Stage 6 — edge simplification and deduplication.
//!
//! Simplification is topology-preserving and keeps endpoints, so vertex
//! bindings survive.  Deduplication keeps the shortest of multiple edges
//! between one vertex pair — but only when they are the same trail or
//! geometrically near-coincident; genuinely parallel trails between the
//! same two junctions remain distinct edges.

use geo::LineString;
use rustc_hash::FxHashMap;
use serde::Serialize;

use tg_geom::{haversine_m, simplify::simplify_preserve, snap::nearest_point_on_segment};

use crate::{NetResult, Workspace};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimplifyStats {
    pub simplified: usize,
    pub duplicates_removed: usize,
    pub short_connectors_removed: usize,
    pub sublength_removed: usize,
}

/// Run simplification, deduplication, and short-edge cleanup.
pub fn simplify_edges(
    ws: &mut Workspace,
    simplification_tolerance_deg: f64,
    min_points_for_simplification: usize,
    min_trail_length_m: f64,
    short_connector_max_length_m: f64,
    edge_snap_tolerance_m: f64,
) -> NetResult<SimplifyStats> {
    let mut stats = SimplifyStats::default();

    // ── Simplify ──────────────────────────────────────────────────────────
    for e in &mut ws.edges {
        if e.geom.0.len() > min_points_for_simplification {
            let simplified =
                simplify_preserve(&e.geom, simplification_tolerance_deg, min_points_for_simplification);
            if simplified.0.len() < e.geom.0.len() {
                e.geom = simplified;
                e.recompute_length();
                stats.simplified += 1;
            }
        }
    }

    // ── Deduplicate by unordered vertex pair ──────────────────────────────
    let mut groups: FxHashMap<(u32, u32), Vec<usize>> = FxHashMap::default();
    for (i, e) in ws.edges.iter().enumerate() {
        let key = (e.source.0.min(e.target.0), e.source.0.max(e.target.0));
        groups.entry(key).or_default().push(i);
    }

    let mut drop = vec![false; ws.edges.len()];
    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        // Shortest first; later members are dropped when they duplicate an
        // already-kept edge.
        let mut ordered = members.clone();
        ordered.sort_by(|a, b| {
            ws.edges[*a]
                .length_km
                .partial_cmp(&ws.edges[*b].length_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut kept: Vec<usize> = Vec::new();
        for &i in &ordered {
            let duplicate = kept.iter().any(|&k| {
                let a = &ws.edges[i];
                let b = &ws.edges[k];
                a.trail_uuid.is_some() && a.trail_uuid == b.trail_uuid
                    || near_coincident(&a.geom, &b.geom, edge_snap_tolerance_m)
            });
            if duplicate {
                drop[i] = true;
                stats.duplicates_removed += 1;
            } else {
                kept.push(i);
            }
        }
    }

    // ── Sub-length edges ──────────────────────────────────────────────────
    // Connector edges are exempt: they exist precisely to span short gaps.
    for (i, e) in ws.edges.iter().enumerate() {
        if !drop[i] && !e.connector && e.length_m() < min_trail_length_m {
            drop[i] = true;
            stats.sublength_removed += 1;
        }
    }

    let mut idx = 0;
    ws.edges.retain(|_| {
        let kept = !drop[idx];
        idx += 1;
        kept
    });
    crate::workspace::renumber_edges(&mut ws.edges);
    ws.recompute_degrees();

    // ── Dangling short connectors ─────────────────────────────────────────
    // A connector stub ending at a degree-1 vertex connects nothing.
    let dangling: Vec<bool> = ws
        .edges
        .iter()
        .map(|e| {
            e.connector
                && e.length_m() < short_connector_max_length_m
                && (ws.vertices[e.source.index()].cnt <= 1
                    || ws.vertices[e.target.index()].cnt <= 1)
        })
        .collect();
    stats.short_connectors_removed = dangling.iter().filter(|d| **d).count();
    if stats.short_connectors_removed > 0 {
        let mut idx = 0;
        ws.edges.retain(|_| {
            let kept = !dangling[idx];
            idx += 1;
            kept
        });
        crate::workspace::renumber_edges(&mut ws.edges);
        ws.recompute_degrees();
    }

    ws.remove_degenerate_edges();
    ws.recompute_degrees();
    ws.remove_orphan_vertices();
    ws.recompute_degrees();

    log::info!(
        "simplification: {} simplified, {} duplicates removed, {} sub-length removed",
        stats.simplified,
        stats.duplicates_removed,
        stats.sublength_removed
    );
    Ok(stats)
}

/// Symmetric near-coincidence: every coordinate of each line lies within
/// `tolerance_m` of the other line.
fn near_coincident(a: &LineString<f64>, b: &LineString<f64>, tolerance_m: f64) -> bool {
    one_sided(a, b, tolerance_m) && one_sided(b, a, tolerance_m)
}

fn one_sided(a: &LineString<f64>, b: &LineString<f64>, tolerance_m: f64) -> bool {
    a.coords().all(|c| {
        b.lines().any(|seg| {
            let p = nearest_point_on_segment(&seg, *c);
            haversine_m(*c, p) <= tolerance_m
        })
    })
}
