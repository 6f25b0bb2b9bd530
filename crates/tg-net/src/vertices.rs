//! Stage 4 — vertex construction and endpoint binding.
//!
//! The unique vertex set is synthesized from the multiset of edge endpoints
//! plus every original trail endpoint (so an isolated terminus survives even
//! when its trail produced no edges).  Noding guarantees crossing
//! coordinates are bit-identical across lines, so collapsing by exact
//! coordinate equality is sound.  Each edge is then bound to its nearest
//! vertices, gated on the snap tolerance.

use geo::Coord;
use rustc_hash::FxHashMap;
use serde::Serialize;

use tg_core::VertexId;

use crate::model::Vertex;
use crate::{NetResult, Workspace};

#[derive(Debug, Clone, Default, Serialize)]
pub struct BindStats {
    pub vertices: usize,
    pub bound_edges: usize,
    pub rejected_edges: usize,
    pub dropped_degenerate: usize,
}

/// Exact-equality key for a coordinate (bit pattern, not epsilon).
#[inline]
fn coord_key(c: Coord<f64>) -> (u64, u64) {
    (c.x.to_bits(), c.y.to_bits())
}

/// Get-or-create the vertex at `c`, OR-ing in the terminus flag.
fn intern(
    c: Coord<f64>,
    elevation: f64,
    terminus: bool,
    vertices: &mut Vec<Vertex>,
    by_coord: &mut FxHashMap<(u64, u64), VertexId>,
) -> VertexId {
    match by_coord.entry(coord_key(c)) {
        std::collections::hash_map::Entry::Occupied(slot) => {
            let id = *slot.get();
            if terminus {
                vertices[id.index()].terminus = true;
            }
            id
        }
        std::collections::hash_map::Entry::Vacant(slot) => {
            let id = VertexId::from_index(vertices.len());
            vertices.push(Vertex { id, coord: c, elevation, cnt: 0, terminus });
            slot.insert(id);
            id
        }
    }
}

/// Build the vertex table and assign `source`/`target` to every edge.
///
/// Edges whose endpoints both lie within `snap_tolerance_m` of a vertex are
/// bound; the rest are deleted and counted as rejected.
pub fn build_vertices(ws: &mut Workspace, snap_tolerance_m: f64) -> NetResult<BindStats> {
    let mut stats = BindStats::default();

    // ── Synthesize the unique vertex set ──────────────────────────────────
    let mut by_coord: FxHashMap<(u64, u64), VertexId> = FxHashMap::default();
    let mut vertices: Vec<Vertex> = Vec::new();

    for e in &ws.edges {
        let (start, end) = e.endpoints();
        intern(start, e.start_elevation, false, &mut vertices, &mut by_coord);
        intern(end, e.end_elevation, false, &mut vertices, &mut by_coord);
    }
    // Original trail endpoints: preserved termini.
    for t in &ws.trails {
        if let Some((start, end)) = t.endpoints() {
            let (z_start, z_end) = t.endpoint_elevations();
            intern(start, z_start, true, &mut vertices, &mut by_coord);
            intern(end, z_end, true, &mut vertices, &mut by_coord);
        }
    }

    ws.vertices = vertices;
    stats.vertices = ws.vertices.len();

    // ── Bind edges by nearest vertex within tolerance ─────────────────────
    let index = ws.vertex_index();
    let mut kept = Vec::with_capacity(ws.edges.len());
    for mut e in std::mem::take(&mut ws.edges) {
        let (start, end) = e.endpoints();
        let near_start = index.nearest(start);
        let near_end = index.nearest(end);
        match (near_start, near_end) {
            (Some((s, ds)), Some((t, dt))) if ds <= snap_tolerance_m && dt <= snap_tolerance_m => {
                e.source = VertexId(s);
                e.target = VertexId(t);
                kept.push(e);
            }
            _ => {
                stats.rejected_edges += 1;
                log::warn!(
                    "edge endpoint failed the {snap_tolerance_m} m snap gate; edge rejected"
                );
            }
        }
    }
    ws.edges = kept;

    stats.dropped_degenerate = ws.remove_degenerate_edges();
    ws.recompute_degrees();
    stats.bound_edges = ws.edges.len();

    log::info!(
        "vertex construction: {} vertices, {} edges bound, {} rejected",
        stats.vertices,
        stats.bound_edges,
        stats.rejected_edges
    );
    Ok(stats)
}
