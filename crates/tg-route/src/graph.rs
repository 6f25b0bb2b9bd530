//! CSR adjacency over the final edge set.
//!
//! # Data layout
//!
//! Every undirected workspace edge becomes two directed **arcs**.  Given a
//! vertex `v`, its outgoing arcs occupy the slice:
//!
//! ```text
//! arc_to[ vertex_out_start[v.index()] .. vertex_out_start[v.index() + 1] ]
//! ```
//!
//! Arc arrays are sorted by source vertex (then target, then edge id) so
//! iteration order — and therefore every search result — is deterministic.
//!
//! Costs are integer **millimeters** so the Dijkstra heap has a total
//! order without float workarounds.

use geo::Coord;

use tg_core::{EdgeId, VertexId};
use tg_geom::PointIndex;
use tg_net::Workspace;

/// Convert km to the integer millimeter cost domain.
#[inline]
pub fn km_to_mm(km: f64) -> u64 {
    (km * 1e6).round() as u64
}

/// Directed-arc view of the routing graph.
pub struct RouteGraph {
    pub vertex_coord: Vec<Coord<f64>>,
    pub vertex_degree: Vec<u32>,

    /// CSR row pointer, length `vertex_count + 1`.
    pub vertex_out_start: Vec<u32>,

    // Arc data, indexed by arc id (position in sorted order).
    pub arc_from: Vec<VertexId>,
    pub arc_to: Vec<VertexId>,
    /// Underlying workspace edge of each arc.
    pub arc_edge: Vec<EdgeId>,
    pub arc_length_mm: Vec<u64>,
    /// Directional elevation gain in meters (the reverse arc carries the
    /// edge's loss).
    pub arc_gain_m: Vec<f64>,

    spatial_idx: PointIndex,
}

impl RouteGraph {
    /// Build the arc view from a finished workspace.
    pub fn build(ws: &Workspace) -> Self {
        struct RawArc {
            from: VertexId,
            to: VertexId,
            edge: EdgeId,
            length_mm: u64,
            gain_m: f64,
        }

        let mut raw: Vec<RawArc> = Vec::with_capacity(ws.edges.len() * 2);
        for e in &ws.edges {
            if !e.source.is_valid() || !e.target.is_valid() {
                continue;
            }
            let mm = km_to_mm(e.length_km);
            raw.push(RawArc {
                from: e.source,
                to: e.target,
                edge: e.id,
                length_mm: mm,
                gain_m: e.elevation_gain,
            });
            raw.push(RawArc {
                from: e.target,
                to: e.source,
                edge: e.id,
                length_mm: mm,
                gain_m: e.elevation_loss,
            });
        }
        raw.sort_by_key(|a| (a.from, a.to, a.edge));

        let vertex_count = ws.vertices.len();
        let mut vertex_out_start = vec![0u32; vertex_count + 1];
        for a in &raw {
            vertex_out_start[a.from.index() + 1] += 1;
        }
        for i in 1..=vertex_count {
            vertex_out_start[i] += vertex_out_start[i - 1];
        }

        let spatial_idx = PointIndex::build(ws.vertices.iter().map(|v| (v.id.0, v.coord)));

        RouteGraph {
            vertex_coord: ws.vertices.iter().map(|v| v.coord).collect(),
            vertex_degree: ws.vertices.iter().map(|v| v.cnt).collect(),
            vertex_out_start,
            arc_from: raw.iter().map(|a| a.from).collect(),
            arc_to: raw.iter().map(|a| a.to).collect(),
            arc_edge: raw.iter().map(|a| a.edge).collect(),
            arc_length_mm: raw.iter().map(|a| a.length_mm).collect(),
            arc_gain_m: raw.iter().map(|a| a.gain_m).collect(),
            spatial_idx,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_coord.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arc_to.len()
    }

    /// Arc ids of all outgoing arcs from `v` — a contiguous index range.
    #[inline]
    pub fn out_arcs(&self, v: VertexId) -> impl Iterator<Item = u32> + '_ {
        let start = self.vertex_out_start[v.index()];
        let end = self.vertex_out_start[v.index() + 1];
        start..end
    }

    /// Nearest vertex to `coord` within `max_dist_m` (for trailhead
    /// snapping).
    pub fn snap_vertex(&self, coord: Coord<f64>, max_dist_m: f64) -> Option<VertexId> {
        match self.spatial_idx.nearest(coord) {
            Some((id, d)) if d <= max_dist_m => Some(VertexId(id)),
            _ => None,
        }
    }

    /// Vertex sequence of an arc path starting at `from`.
    pub fn path_vertices(&self, from: VertexId, arcs: &[u32]) -> Vec<VertexId> {
        let mut out = Vec::with_capacity(arcs.len() + 1);
        out.push(from);
        for &a in arcs {
            out.push(self.arc_to[a as usize]);
        }
        out
    }

    /// Total length (mm) of an arc path.
    pub fn path_length_mm(&self, arcs: &[u32]) -> u64 {
        arcs.iter().map(|&a| self.arc_length_mm[a as usize]).sum()
    }

    /// Total directional elevation gain (m) of an arc path.
    pub fn path_gain_m(&self, arcs: &[u32]) -> f64 {
        arcs.iter().map(|&a| self.arc_gain_m[a as usize]).sum()
    }
}
