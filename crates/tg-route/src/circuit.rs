//! Elementary circuit enumeration with length pruning.
//!
//! Hawick-James-style canonicalization: every circuit is rooted at its
//! minimum vertex id — the DFS never descends into vertices below the
//! root, so each circuit is discovered from exactly one root.  Each
//! circuit would still be found once per direction; the direction with the
//! smaller second vertex (or smaller first edge, for two-arc circuits) is
//! kept.
//!
//! The DFS prunes on cumulative length, so the pattern's tolerance band
//! bounds the search instead of the graph size.

use rustc_hash::FxHashSet;

use tg_core::VertexId;

use crate::graph::RouteGraph;
use crate::ksp::Path;

/// Enumerate simple circuits through `root` with total length inside
/// `[min_mm, max_mm]`, up to `max_results`.
///
/// A circuit never repeats a vertex (other than the root) nor an
/// underlying undirected edge.
pub fn find_circuits(
    g: &RouteGraph,
    root: VertexId,
    min_mm: u64,
    max_mm: u64,
    max_results: usize,
) -> Vec<Path> {
    let mut results: Vec<Path> = Vec::new();
    let mut stack: Vec<u32> = Vec::new();
    let mut used_edges: FxHashSet<u32> = FxHashSet::default();
    let mut on_path = vec![false; g.vertex_count()];
    on_path[root.index()] = true;

    dfs(g, root, root, 0, min_mm, max_mm, max_results, &mut stack, &mut used_edges, &mut on_path, &mut results);
    results
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    g: &RouteGraph,
    root: VertexId,
    cur: VertexId,
    length_mm: u64,
    min_mm: u64,
    max_mm: u64,
    max_results: usize,
    stack: &mut Vec<u32>,
    used_edges: &mut FxHashSet<u32>,
    on_path: &mut [bool],
    results: &mut Vec<Path>,
) {
    if results.len() >= max_results {
        return;
    }
    for arc in g.out_arcs(cur) {
        if results.len() >= max_results {
            return;
        }
        let edge = g.arc_edge[arc as usize].0;
        if used_edges.contains(&edge) {
            continue;
        }
        let to = g.arc_to[arc as usize];
        let new_len = length_mm + g.arc_length_mm[arc as usize];
        if new_len > max_mm {
            continue;
        }

        if to == root {
            // Closing the circuit needs at least two arcs (a single arc
            // back would be a self-loop, which the graph does not contain).
            if !stack.is_empty() && new_len >= min_mm {
                stack.push(arc);
                if is_canonical_direction(g, stack) {
                    results.push(Path { arcs: stack.clone(), length_mm: new_len });
                }
                stack.pop();
            }
            continue;
        }

        // Canonical root: never descend below it; simple: never revisit.
        if to < root || on_path[to.index()] {
            continue;
        }

        stack.push(arc);
        used_edges.insert(edge);
        on_path[to.index()] = true;

        dfs(g, root, to, new_len, min_mm, max_mm, max_results, stack, used_edges, on_path, results);

        on_path[to.index()] = false;
        used_edges.remove(&edge);
        stack.pop();
    }
}

/// Keep one of the two traversal directions of each circuit: the one whose
/// second vertex is smaller (first edge id breaks the tie for two-arc
/// circuits through parallel edges).
fn is_canonical_direction(g: &RouteGraph, arcs: &[u32]) -> bool {
    let second = g.arc_to[arcs[0] as usize];
    let second_to_last = g.arc_from[arcs[arcs.len() - 1] as usize];
    if second != second_to_last {
        return second < second_to_last;
    }
    g.arc_edge[arcs[0] as usize] <= g.arc_edge[arcs[arcs.len() - 1] as usize]
}
