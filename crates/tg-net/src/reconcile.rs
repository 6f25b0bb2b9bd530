//! Stage 5 — gap bridging, snapping, and vertex reconciliation.
//!
//! Seven passes, each idempotent given its input:
//!
//! 1. gap midpoint bridging (trail-bridging tolerance, when enabled)
//! 2. post-noding endpoint snap onto bound vertices
//! 3. connector edge spanning (snap tolerance, once per vertex pair)
//! 4. early collapse of sub-length connector edges
//! 5. KNN vertex merge (union-find, minimum-id representative)
//! 6. edge re-snap against the merged vertex set
//! 7. degree recompute
//!
//! Passes 5–7 repeat until no merge happens.  After every pass degenerate
//! edges and orphan vertices are removed, so the tables stay consistent
//! even if a later pass fails.

use geo::{Coord, LineString};
use rustc_hash::FxHashSet;
use serde::Serialize;

use tg_core::{EdgeId, VertexId};
use tg_geom::{haversine_m, snap::snap_endpoints};

use crate::model::Edge;
use crate::{NetResult, Workspace};

/// Safety bound on the merge/re-bind fixpoint.
const MAX_MERGE_PASSES: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileStats {
    pub gap_bridges_inserted: usize,
    pub connectors_inserted: usize,
    pub snapped_endpoints: usize,
    pub short_connectors_collapsed: usize,
    pub merged_vertices: usize,
    pub merge_passes: usize,
}

/// Run the full reconciliation subsystem.
pub fn reconcile(
    ws: &mut Workspace,
    edge_snap_tolerance_m: f64,
    trail_bridging_tolerance_m: f64,
    short_connector_max_length_m: f64,
    bridging_enabled: bool,
) -> NetResult<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    // One connector per vertex pair across both spanning passes.
    let mut spanned: FxHashSet<((i64, i64), (i64, i64))> = FxHashSet::default();

    // ── 1. Gap midpoint bridging ──────────────────────────────────────────
    if bridging_enabled {
        stats.gap_bridges_inserted =
            span_connectors(ws, trail_bridging_tolerance_m, &mut spanned);
    }

    // ── 2. Post-noding snap ───────────────────────────────────────────────
    stats.snapped_endpoints = snap_edges_to_vertices(ws);

    // ── 3. Connector edge spanning ────────────────────────────────────────
    stats.connectors_inserted = span_connectors(ws, edge_snap_tolerance_m, &mut spanned);

    // ── 4. Early collapse of sub-length connectors ────────────────────────
    stats.short_connectors_collapsed =
        collapse_short_connectors(ws, short_connector_max_length_m);
    if stats.short_connectors_collapsed > 0 {
        // Contraction moved bindings; pull geometries onto the surviving
        // representatives before the merge fixpoint decides it has nothing
        // to do.
        snap_edges_to_vertices(ws);
        ws.remove_degenerate_edges();
        ws.recompute_degrees();
    }

    // ── 5–7. KNN merge / re-snap / degree recompute, to fixpoint ──────────
    for pass in 0..MAX_MERGE_PASSES {
        let merged = knn_merge_vertices(ws, edge_snap_tolerance_m);
        stats.merge_passes = pass + 1;
        if merged == 0 {
            break;
        }
        stats.merged_vertices += merged;
        snap_edges_to_vertices(ws);
        ws.remove_degenerate_edges();
        ws.recompute_degrees();
    }

    ws.remove_degenerate_edges();
    ws.recompute_degrees();
    ws.remove_orphan_vertices();
    ws.recompute_degrees();

    log::info!(
        "reconciliation: {} gap bridges, {} connectors, {} vertices merged in {} pass(es)",
        stats.gap_bridges_inserted,
        stats.connectors_inserted,
        stats.merged_vertices,
        stats.merge_passes
    );
    Ok(stats)
}

// ── Connector spanning ────────────────────────────────────────────────────────

#[inline]
fn quantize(c: Coord<f64>) -> (i64, i64) {
    ((c.x * 1e9).round() as i64, (c.y * 1e9).round() as i64)
}

fn coord_pair_key(a: Coord<f64>, b: Coord<f64>) -> ((i64, i64), (i64, i64)) {
    let (qa, qb) = (quantize(a), quantize(b));
    if qa <= qb { (qa, qb) } else { (qb, qa) }
}

/// Insert an explicit connector edge for every vertex pair within
/// `radius_m` that is not already adjacent.  Returns the number inserted.
fn span_connectors(
    ws: &mut Workspace,
    radius_m: f64,
    spanned: &mut FxHashSet<((i64, i64), (i64, i64))>,
) -> usize {
    let index = ws.vertex_index();

    let mut adjacent: FxHashSet<(u32, u32)> = FxHashSet::default();
    for e in &ws.edges {
        let (a, b) = (e.source.0.min(e.target.0), e.source.0.max(e.target.0));
        adjacent.insert((a, b));
    }

    let mut inserted = 0;
    let mut new_edges: Vec<Edge> = Vec::new();
    for v in &ws.vertices {
        for other in index.within(v.coord, radius_m) {
            if other <= v.id.0 {
                continue;
            }
            let w = &ws.vertices[other as usize];
            let gap_m = haversine_m(v.coord, w.coord);
            if gap_m <= 0.0 {
                continue;
            }
            if adjacent.contains(&(v.id.0, other)) {
                continue;
            }
            let key = coord_pair_key(v.coord, w.coord);
            if !spanned.insert(key) {
                continue;
            }
            new_edges.push(connector_edge(v.id, w.id, v.coord, w.coord, v.elevation, w.elevation, gap_m));
            adjacent.insert((v.id.0, other));
            inserted += 1;
        }
    }

    for mut e in new_edges {
        e.id = EdgeId(ws.edges.len() as u32);
        ws.edges.push(e);
    }
    if inserted > 0 {
        ws.recompute_degrees();
    }
    inserted
}

fn connector_edge(
    source: VertexId,
    target: VertexId,
    a: Coord<f64>,
    b: Coord<f64>,
    ele_a: f64,
    ele_b: f64,
    gap_m: f64,
) -> Edge {
    let rise = ele_b - ele_a;
    Edge {
        id: EdgeId::INVALID,
        geom: LineString::new(vec![a, b]),
        length_km: gap_m / 1000.0,
        elevation_gain: rise.max(0.0),
        elevation_loss: (-rise).max(0.0),
        start_elevation: ele_a,
        end_elevation: ele_b,
        source,
        target,
        trail_uuid: None,
        trail_name: None,
        connector: true,
        composition: Vec::new(),
    }
}

// ── Endpoint snap ─────────────────────────────────────────────────────────────

/// Force every edge geometry to start/end exactly on its bound vertices.
/// Returns the number of endpoints that actually moved.
fn snap_edges_to_vertices(ws: &mut Workspace) -> usize {
    let mut moved = 0;
    for e in &mut ws.edges {
        if !e.source.is_valid() || !e.target.is_valid() {
            continue;
        }
        let sv = ws.vertices[e.source.index()].coord;
        let tv = ws.vertices[e.target.index()].coord;
        let (start, end) = e.endpoints();
        if start != sv || end != tv {
            moved += usize::from(start != sv) + usize::from(end != tv);
            snap_endpoints(&mut e.geom, sv, tv);
            e.recompute_length();
        }
    }
    moved
}

// ── Short connector collapse ──────────────────────────────────────────────────

/// Contract connector edges shorter than `max_length_m`: their two vertices
/// become one (minimum id wins) and the edge disappears.
fn collapse_short_connectors(ws: &mut Workspace, max_length_m: f64) -> usize {
    let mut uf = UnionFind::new(ws.vertices.len());
    let mut collapsed = 0;
    for e in &ws.edges {
        if e.connector
            && e.length_m() < max_length_m
            && e.source.is_valid()
            && e.target.is_valid()
            && uf.union(e.source.0, e.target.0)
        {
            collapsed += 1;
        }
    }
    if collapsed > 0 {
        apply_union(ws, &mut uf);
    }
    collapsed
}

// ── KNN merge ─────────────────────────────────────────────────────────────────

/// Union every vertex with all vertices within `radius_m`; the minimum id
/// in each cluster becomes the representative.  Returns merged count.
fn knn_merge_vertices(ws: &mut Workspace, radius_m: f64) -> usize {
    let index = ws.vertex_index();
    let mut uf = UnionFind::new(ws.vertices.len());
    let mut merged = 0;
    for v in &ws.vertices {
        for other in index.within(v.coord, radius_m) {
            if other != v.id.0 && uf.union(v.id.0, other) {
                merged += 1;
            }
        }
    }
    if merged > 0 {
        apply_union(ws, &mut uf);
    }
    merged
}

/// Materialize a union-find over vertex ids: rewrite bindings to
/// representatives, propagate the terminus flag, and compact the table.
fn apply_union(ws: &mut Workspace, uf: &mut UnionFind) {
    // Terminus is contagious within a cluster.
    for i in 0..ws.vertices.len() {
        let root = uf.find(i as u32) as usize;
        if ws.vertices[i].terminus {
            ws.vertices[root].terminus = true;
        }
    }
    for e in &mut ws.edges {
        if e.source.is_valid() {
            e.source = VertexId(uf.find(e.source.0));
        }
        if e.target.is_valid() {
            e.target = VertexId(uf.find(e.target.0));
        }
    }
    let keep: Vec<bool> =
        (0..ws.vertices.len()).map(|i| uf.find(i as u32) as usize == i).collect();
    crate::workspace::compact_vertices(&mut ws.vertices, &mut ws.edges, &keep);
}

// ── Union-find ────────────────────────────────────────────────────────────────

/// Disjoint sets over dense vertex ids.  Union keeps the **minimum** id as
/// root, matching the merge rule "choose the minimum-id as representative".
pub(crate) struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect() }
    }

    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression.
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`; the smaller root id wins.  Returns
    /// false when they were already one set.
    pub fn union(&mut self, a: u32, b: u32) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        true
    }
}
