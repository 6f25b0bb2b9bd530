//! Dijkstra and Yen's k-shortest simple paths over the arc graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use tg_core::VertexId;

use crate::graph::RouteGraph;

/// A simple path: arcs in traversal order plus its total length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub arcs: Vec<u32>,
    pub length_mm: u64,
}

// ── Dijkstra ──────────────────────────────────────────────────────────────────

/// Shortest-path distances (mm) from `from` to every vertex.  Unreachable
/// vertices hold `u64::MAX`.
pub fn shortest_distances(g: &RouteGraph, from: VertexId) -> Vec<u64> {
    let n = g.vertex_count();
    let mut dist = vec![u64::MAX; n];
    dist[from.index()] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, VertexId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, v))) = heap.pop() {
        if cost > dist[v.index()] {
            continue; // stale entry
        }
        for arc in g.out_arcs(v) {
            let to = g.arc_to[arc as usize];
            let next = cost.saturating_add(g.arc_length_mm[arc as usize]);
            if next < dist[to.index()] {
                dist[to.index()] = next;
                heap.push(Reverse((next, to)));
            }
        }
    }
    dist
}

/// Shortest path `from → to`, honouring banned arcs and vertices.
///
/// Ties break on vertex id, then on arc id, so results are deterministic.
pub fn shortest_path(
    g: &RouteGraph,
    from: VertexId,
    to: VertexId,
    banned_arcs: &FxHashSet<u32>,
    banned_vertices: &[bool],
) -> Option<Path> {
    if from == to {
        return Some(Path { arcs: Vec::new(), length_mm: 0 });
    }
    let n = g.vertex_count();
    let mut dist = vec![u64::MAX; n];
    let mut prev_arc = vec![u32::MAX; n];
    dist[from.index()] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, VertexId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, v))) = heap.pop() {
        if v == to {
            break;
        }
        if cost > dist[v.index()] {
            continue;
        }
        for arc in g.out_arcs(v) {
            if banned_arcs.contains(&arc) {
                continue;
            }
            let next_v = g.arc_to[arc as usize];
            if banned_vertices[next_v.index()] {
                continue;
            }
            let next = cost.saturating_add(g.arc_length_mm[arc as usize]);
            if next < dist[next_v.index()]
                || (next == dist[next_v.index()] && arc < prev_arc[next_v.index()])
            {
                dist[next_v.index()] = next;
                prev_arc[next_v.index()] = arc;
                heap.push(Reverse((next, next_v)));
            }
        }
    }

    if dist[to.index()] == u64::MAX {
        return None;
    }

    // Reconstruct by walking prev arcs back to `from`.
    let mut arcs = Vec::new();
    let mut cur = to;
    while cur != from {
        let a = prev_arc[cur.index()];
        arcs.push(a);
        cur = g.arc_from[a as usize];
    }
    arcs.reverse();
    Some(Path { arcs, length_mm: dist[to.index()] })
}

// ── Yen's k-shortest simple paths ─────────────────────────────────────────────

/// Enumerate up to `k` shortest **simple** paths `from → to`, ascending by
/// length (Yen's algorithm over the Dijkstra above).
pub fn k_shortest_paths(g: &RouteGraph, from: VertexId, to: VertexId, k: usize) -> Vec<Path> {
    let n = g.vertex_count();
    let no_bans: FxHashSet<u32> = FxHashSet::default();
    let all_free = vec![false; n];

    let Some(first) = shortest_path(g, from, to, &no_bans, &all_free) else {
        return Vec::new();
    };

    let mut accepted: Vec<Path> = vec![first];
    let mut candidates: Vec<Path> = Vec::new();

    while accepted.len() < k {
        let prev = accepted.last().expect("accepted is never empty").clone();
        let prev_vertices = g.path_vertices(from, &prev.arcs);

        for spur_idx in 0..prev.arcs.len() {
            let spur_vertex = prev_vertices[spur_idx];
            let root_arcs = &prev.arcs[..spur_idx];

            // Ban the next arc of every accepted path sharing this root.
            let mut banned_arcs: FxHashSet<u32> = FxHashSet::default();
            for p in &accepted {
                if p.arcs.len() > spur_idx && p.arcs[..spur_idx] == *root_arcs {
                    banned_arcs.insert(p.arcs[spur_idx]);
                }
            }
            // Ban root vertices so spur paths stay simple.
            let mut banned_vertices = vec![false; n];
            for v in &prev_vertices[..spur_idx] {
                banned_vertices[v.index()] = true;
            }

            let Some(spur) = shortest_path(g, spur_vertex, to, &banned_arcs, &banned_vertices)
            else {
                continue;
            };

            let mut arcs = root_arcs.to_vec();
            arcs.extend_from_slice(&spur.arcs);
            let length_mm = g.path_length_mm(&arcs);
            let candidate = Path { arcs, length_mm };

            if !accepted.contains(&candidate) && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by_key(|p| (p.length_mm, p.arcs.clone()));
        accepted.push(candidates.remove(0));
    }

    accepted
}
