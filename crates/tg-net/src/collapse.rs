//! Stage 7 — degree-2 chain collapse.
//!
//! Every maximal chain of edges linked through pass-through vertices is
//! merged into a single edge: geometry concatenated in walk order, length
//! and elevation summed (orientation-aware), composition recording each
//! constituent trail's share of the merged length.
//!
//! The whole fixpoint runs against a **staged copy** of the edge and vertex
//! tables and commits by swap, so a failure mid-loop leaves the workspace
//! exactly as it was — no partial collapse is ever observable.
//!
//! A chain whose two ends are the same vertex (a cycle hanging off one
//! junction, or an isolated ring) keeps one canonical intermediate vertex
//! (minimum id) and becomes two edges, preserving the loop without
//! introducing a self-loop edge.

use serde::Serialize;

use tg_core::{EdgeId, VertexId};
use tg_geom::line_merge;

use crate::model::{Edge, TrailSegment, Vertex};
use crate::workspace::{compact_vertices, recompute_degrees, renumber_edges};
use crate::{NetError, NetResult, Workspace};

/// Fixpoint bound; real networks converge in 2–3 passes.
const MAX_ITERATIONS: usize = 8;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollapseStats {
    pub iterations: usize,
    pub chains_merged: usize,
    pub edges_before: usize,
    pub edges_after: usize,
    pub self_loops_removed: usize,
}

/// Run the collapse fixpoint.  With `strict`, a chain that cannot be
/// line-merged aborts the stage (workspace untouched); otherwise the chain
/// is left uncollapsed with a warning.
pub fn collapse_chains(ws: &mut Workspace, strict: bool) -> NetResult<CollapseStats> {
    let mut stats = CollapseStats { edges_before: ws.edges.len(), ..Default::default() };

    // Staged copies — the workspace is untouched until the final swap.
    let mut edges = ws.edges.clone();
    let mut vertices = ws.vertices.clone();

    for iteration in 0..MAX_ITERATIONS {
        stats.iterations = iteration + 1;
        let merges = collapse_pass(&mut edges, &mut vertices, strict)?;
        if merges == 0 {
            break;
        }
        stats.chains_merged += merges;
    }

    // Post-collapse cleanup on the staged tables: self-loops produced by
    // the walk, then degree refresh.
    let before = edges.len();
    edges.retain(|e| !e.is_degenerate());
    stats.self_loops_removed = before - edges.len();
    renumber_edges(&mut edges);
    recompute_degrees(&mut vertices, &edges);

    stats.edges_after = edges.len();

    // Commit.
    ws.edges = edges;
    ws.vertices = vertices;
    ws.remove_orphan_vertices();
    ws.recompute_degrees();

    log::info!(
        "degree-2 collapse: {} chains merged over {} iteration(s), {} → {} edges",
        stats.chains_merged,
        stats.iterations,
        stats.edges_before,
        stats.edges_after
    );
    Ok(stats)
}

// ── One fixpoint iteration ────────────────────────────────────────────────────

/// A walked chain: edges with their traversal orientation, and the boundary
/// vertices.
struct Chain {
    /// `(edge index, forward)` — forward means traversed source→target.
    members: Vec<(usize, bool)>,
    start: VertexId,
    end: VertexId,
}

fn collapse_pass(
    edges: &mut Vec<Edge>,
    vertices: &mut Vec<Vertex>,
    strict: bool,
) -> NetResult<usize> {
    // Full incidence lists (every edge, regardless of length — walking
    // through a vertex with an extra sub-meter stub would corrupt the
    // merged geometry).
    let mut incidence: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    for (i, e) in edges.iter().enumerate() {
        incidence[e.source.index()].push(i);
        incidence[e.target.index()].push(i);
    }
    let pass_through = |v: VertexId| incidence[v.index()].len() == 2;

    let mut visited = vec![false; edges.len()];
    let mut chains: Vec<Chain> = Vec::new();

    // Walks rooted at decision vertices.
    for v in 0..vertices.len() {
        let root = VertexId(v as u32);
        if pass_through(root) {
            continue;
        }
        for &first in &incidence[v] {
            if visited[first] {
                continue;
            }
            chains.push(walk_chain(edges, &incidence, &mut visited, root, first));
        }
    }

    // Isolated rings: unvisited edges whose endpoints are all pass-through.
    for start_edge in 0..edges.len() {
        if visited[start_edge] {
            continue;
        }
        // Root the ring at its minimum vertex id for canonical output.
        let root = ring_min_vertex(edges, &incidence, start_edge);
        let first = incidence[root.index()]
            .iter()
            .copied()
            .find(|i| !visited[*i])
            .unwrap_or(start_edge);
        chains.push(walk_chain(edges, &incidence, &mut visited, root, first));
    }

    // ── Merge qualifying chains ───────────────────────────────────────────
    let mut merges = 0;
    let mut drop = vec![false; edges.len()];
    let mut new_edges: Vec<Edge> = Vec::new();

    for chain in chains {
        if chain.members.len() < 2 {
            continue;
        }
        if chain.start == chain.end {
            // Cycle: keep one canonical intermediate (minimum id) and emit
            // two edges.  A 2-member cycle is already in that form.
            if chain.members.len() < 3 {
                continue;
            }
            let (split_at, _) = chain_interior_min(edges, &chain);
            let (left, right) = split_chain(&chain, split_at);
            for part in [left, right] {
                if part.members.len() < 2 {
                    continue;
                }
                match merge_chain(edges, vertices, &part) {
                    Ok(edge) => {
                        mark_merged(&part, &mut drop);
                        new_edges.push(edge);
                        merges += 1;
                    }
                    Err(e) if strict => return Err(e),
                    Err(e) => log::warn!("skipping unmergeable chain: {e}"),
                }
            }
        } else {
            match merge_chain(edges, vertices, &chain) {
                Ok(edge) => {
                    mark_merged(&chain, &mut drop);
                    new_edges.push(edge);
                    merges += 1;
                }
                Err(e) if strict => return Err(e),
                Err(e) => log::warn!("skipping unmergeable chain: {e}"),
            }
        }
    }

    if merges == 0 {
        return Ok(0);
    }

    let mut idx = 0;
    edges.retain(|_| {
        let kept = !drop[idx];
        idx += 1;
        kept
    });
    edges.extend(new_edges);
    renumber_edges(edges);
    recompute_degrees(vertices, edges);

    // Interior vertices of merged chains are now edge-less; drop them (the
    // terminus flag was cleared when the chain consumed them).
    let mut incident = vec![false; vertices.len()];
    for e in edges.iter() {
        incident[e.source.index()] = true;
        incident[e.target.index()] = true;
    }
    let keep: Vec<bool> =
        vertices.iter().enumerate().map(|(i, v)| incident[i] || v.terminus).collect();
    compact_vertices(vertices, edges, &keep);
    recompute_degrees(vertices, edges);

    Ok(merges)
}

// ── Chain walking ─────────────────────────────────────────────────────────────

fn other_end(e: &Edge, v: VertexId) -> VertexId {
    if e.source == v {
        e.target
    } else {
        e.source
    }
}

/// Walk from `root` through `first`, following pass-through vertices until
/// a decision vertex, the root itself (cycle), or an already-visited edge.
fn walk_chain(
    edges: &[Edge],
    incidence: &[Vec<usize>],
    visited: &mut [bool],
    root: VertexId,
    first: usize,
) -> Chain {
    let mut members = Vec::new();
    let mut cur_edge = first;
    let mut cur_v = root;

    loop {
        visited[cur_edge] = true;
        let e = &edges[cur_edge];
        members.push((cur_edge, e.source == cur_v));
        cur_v = other_end(e, cur_v);

        if cur_v == root || incidence[cur_v.index()].len() != 2 {
            break;
        }
        let next = incidence[cur_v.index()]
            .iter()
            .copied()
            .find(|&i| i != cur_edge && !visited[i]);
        match next {
            Some(i) => cur_edge = i,
            None => break, // revisit — loop broken here
        }
    }

    Chain { members, start: root, end: cur_v }
}

/// Minimum vertex id on an isolated ring containing `start_edge`.
fn ring_min_vertex(edges: &[Edge], incidence: &[Vec<usize>], start_edge: usize) -> VertexId {
    let mut min_v = edges[start_edge].source.min(edges[start_edge].target);
    let mut cur_edge = start_edge;
    let mut cur_v = edges[start_edge].target;
    let start_v = edges[start_edge].source;
    let mut steps = 0;
    while cur_v != start_v && steps < edges.len() {
        min_v = min_v.min(cur_v);
        let Some(&next) = incidence[cur_v.index()].iter().find(|&&i| i != cur_edge) else {
            break;
        };
        cur_edge = next;
        cur_v = other_end(&edges[cur_edge], cur_v);
        steps += 1;
    }
    min_v
}

/// Index (into `chain.members`) and id of the minimum interior vertex.
fn chain_interior_min(edges: &[Edge], chain: &Chain) -> (usize, VertexId) {
    let mut best = (1, VertexId::INVALID);
    let mut cur_v = chain.start;
    for (pos, (idx, forward)) in chain.members.iter().enumerate() {
        let e = &edges[*idx];
        cur_v = if *forward { e.target } else { e.source };
        if pos + 1 < chain.members.len() && cur_v < best.1 {
            best = (pos + 1, cur_v);
        }
    }
    best
}

/// Split a cyclic chain before member `at`, yielding two open sub-chains
/// that meet at the interior vertex.
fn split_chain(chain: &Chain, at: usize) -> (Chain, Chain) {
    let join = VertexId::INVALID; // resolved below from the member split
    let left = Chain {
        members: chain.members[..at].to_vec(),
        start: chain.start,
        end: join,
    };
    let right = Chain {
        members: chain.members[at..].to_vec(),
        start: join,
        end: chain.end,
    };
    (left, right)
}

// ── Chain merging ─────────────────────────────────────────────────────────────

/// Mark every chain member for deletion.
fn mark_merged(chain: &Chain, drop: &mut [bool]) {
    for (idx, _) in &chain.members {
        drop[*idx] = true;
    }
}

/// Merge one open chain into a single edge.
fn merge_chain(edges: &[Edge], vertices: &mut [Vertex], chain: &Chain) -> NetResult<Edge> {
    // Oriented geometries, in walk order.
    let oriented: Vec<geo::LineString<f64>> = chain
        .members
        .iter()
        .map(|(idx, forward)| {
            let mut g = edges[*idx].geom.clone();
            if !*forward {
                g.0.reverse();
            }
            g
        })
        .collect();

    let geom = line_merge(&oriented)
        .map_err(|e| NetError::GeometryInvariant(format!("degree-2 chain merge failed: {e}")))?;

    let total_km: f64 = chain.members.iter().map(|(i, _)| edges[*i].length_km).sum();

    let mut gain = 0.0;
    let mut loss = 0.0;
    let mut composition: Vec<TrailSegment> = Vec::new();
    for (idx, forward) in &chain.members {
        let e = &edges[*idx];
        if *forward {
            gain += e.elevation_gain;
            loss += e.elevation_loss;
        } else {
            gain += e.elevation_loss;
            loss += e.elevation_gain;
        }
        let share = if total_km > 0.0 { e.length_km / total_km } else { 0.0 };
        for seg in &e.composition {
            match composition.last_mut() {
                Some(last) if last.trail_uuid == seg.trail_uuid => {
                    last.weight += seg.weight * share;
                }
                _ => composition.push(TrailSegment {
                    trail_uuid: seg.trail_uuid.clone(),
                    trail_name: seg.trail_name.clone(),
                    weight: seg.weight * share,
                }),
            }
        }
    }

    // Boundary vertices from the walk; interior joints lose terminus status.
    let (start, end) = resolve_bounds(edges, chain);
    for (i, (idx, forward)) in chain.members.iter().enumerate() {
        if i + 1 == chain.members.len() {
            break;
        }
        let e = &edges[*idx];
        let joint = if *forward { e.target } else { e.source };
        vertices[joint.index()].terminus = false;
    }

    let first = &edges[chain.members[0].0];
    let last = &edges[chain.members[chain.members.len() - 1].0];
    let start_elevation =
        if chain.members[0].1 { first.start_elevation } else { first.end_elevation };
    let end_elevation = if chain.members[chain.members.len() - 1].1 {
        last.end_elevation
    } else {
        last.start_elevation
    };

    // A merged chain spanning multiple trails keeps the dominant trail's
    // identity for display; the composition holds the full story.
    let dominant = composition
        .iter()
        .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap_or(std::cmp::Ordering::Equal));

    Ok(Edge {
        id: EdgeId::INVALID,
        length_km: total_km,
        elevation_gain: gain,
        elevation_loss: loss,
        start_elevation,
        end_elevation,
        source: start,
        target: end,
        trail_uuid: dominant.map(|d| d.trail_uuid.clone()),
        trail_name: dominant.map(|d| d.trail_name.clone()),
        connector: chain.members.iter().all(|(i, _)| edges[*i].connector),
        composition,
        geom,
    })
}

/// Actual boundary vertices of a chain (split sub-chains carry an INVALID
/// placeholder at the joint).
fn resolve_bounds(edges: &[Edge], chain: &Chain) -> (VertexId, VertexId) {
    let (first_idx, first_fwd) = chain.members[0];
    let (last_idx, last_fwd) = chain.members[chain.members.len() - 1];
    let start = if chain.start.is_valid() {
        chain.start
    } else if first_fwd {
        edges[first_idx].source
    } else {
        edges[first_idx].target
    };
    let end = if chain.end.is_valid() {
        chain.end
    } else if last_fwd {
        edges[last_idx].target
    } else {
        edges[last_idx].source
    };
    (start, end)
}
