//! Per-pattern route search with adaptive tolerance relaxation.
//!
//! For every configured pattern the search enumerates candidates of the
//! requested shape (circuits for loops, k-shortest paths for point-to-point,
//! half-distance paths doubled back for out-and-back), scores them with the
//! preference cost, removes near-duplicates, and keeps the cheapest.
//! Patterns yielding too few routes are retried with the tolerance widened
//! by 10 percentage points, up to the configured ceiling; the tolerance a
//! route was found at is recorded on it.

use geo::LineString;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use uuid::Uuid;

use tg_core::config::{RoutePattern, RouteShape};
use tg_core::{Config, EdgeId, VertexId};
use tg_geom::line_merge;
use tg_net::Workspace;

use crate::cost::{total_cost, RouteFacts};
use crate::graph::{km_to_mm, RouteGraph};
use crate::ksp::{k_shortest_paths, shortest_distances};
use crate::shape::{classify, route_name};
use crate::{circuit, RouteResult};

/// Cap on start candidates per pattern when trailheads are disabled.
const MAX_START_CANDIDATES: usize = 32;
/// Cap on circuits enumerated per start vertex.
const MAX_CIRCUITS_PER_START: usize = 16;
/// Cap on distinct targets tried per start for path shapes.
const MAX_TARGETS_PER_START: usize = 8;

// ── Output types ──────────────────────────────────────────────────────────────

/// One scored route recommendation.
#[derive(Debug, Clone)]
pub struct RouteRecommendation {
    pub uuid: String,
    pub region: String,
    pub pattern_name: String,
    pub input_distance_km: f64,
    pub input_elevation_gain: f64,
    pub distance_km: f64,
    pub elevation_gain: f64,
    pub shape: RouteShape,
    pub edge_ids: Vec<EdgeId>,
    pub vertex_ids: Vec<VertexId>,
    /// Preference cost — lower is better.
    pub score: f64,
    pub name: String,
    pub geom: LineString<f64>,
    /// The tolerance this route was actually found at (records adaptive
    /// relaxation).
    pub tolerance_percent_used: f64,
    pub trail_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternStats {
    pub pattern_name: String,
    pub routes_found: usize,
    pub tolerance_percent_used: f64,
    /// Fewer routes than requested even after full relaxation.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub patterns: Vec<PatternStats>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Generate scored routes for every configured pattern.
pub fn generate_routes(
    ws: &Workspace,
    config: &Config,
) -> RouteResult<(Vec<RouteRecommendation>, SearchStats)> {
    let graph = RouteGraph::build(ws);
    if graph.vertex_count() == 0 || graph.arc_count() == 0 {
        log::warn!("route search skipped: empty graph");
        return Ok((Vec::new(), SearchStats::default()));
    }

    // Patterns are independent given the immutable graph; results collect
    // in pattern order, so output stays deterministic.
    let per_pattern: Vec<(Vec<RouteRecommendation>, PatternStats)> = config
        .patterns
        .par_iter()
        .map(|pattern| search_with_relaxation(&graph, ws, config, pattern))
        .collect();

    let mut routes = Vec::new();
    let mut stats = SearchStats::default();
    for (mut found, pstats) in per_pattern {
        if pstats.exhausted {
            log::warn!(
                "pattern '{}': only {} route(s) after relaxing tolerance to {:.0}%",
                pstats.pattern_name,
                pstats.routes_found,
                pstats.tolerance_percent_used
            );
        }
        routes.append(&mut found);
        stats.patterns.push(pstats);
    }
    Ok((routes, stats))
}

// ── Relaxation loop ───────────────────────────────────────────────────────────

fn search_with_relaxation(
    g: &RouteGraph,
    ws: &Workspace,
    config: &Config,
    pattern: &RoutePattern,
) -> (Vec<RouteRecommendation>, PatternStats) {
    let routing = &config.routing;
    let mut tolerance = pattern.tolerance_percent;

    let mut routes = search_pattern(g, ws, config, pattern, tolerance);
    while routes.len() < routing.min_routes_per_pattern
        && tolerance < routing.max_tolerance_percent
    {
        tolerance = (tolerance + 10.0).min(routing.max_tolerance_percent);
        log::debug!(
            "pattern '{}': relaxing tolerance to {tolerance:.0}%",
            pattern.pattern_name
        );
        routes = search_pattern(g, ws, config, pattern, tolerance);
    }

    let stats = PatternStats {
        pattern_name: pattern.pattern_name.clone(),
        routes_found: routes.len(),
        tolerance_percent_used: tolerance,
        exhausted: routes.len() < routing.min_routes_per_pattern,
    };
    (routes, stats)
}

// ── One search pass at a fixed tolerance ──────────────────────────────────────

fn search_pattern(
    g: &RouteGraph,
    ws: &Workspace,
    config: &Config,
    pattern: &RoutePattern,
    tolerance_pct: f64,
) -> Vec<RouteRecommendation> {
    let tol = tolerance_pct / 100.0;
    let starts = start_candidates(g, config);

    let mut candidates: Vec<RouteRecommendation> = Vec::new();
    match pattern.route_shape {
        RouteShape::Loop => {
            let min_mm = km_to_mm(pattern.target_distance_km * (1.0 - tol));
            let max_mm = km_to_mm(pattern.target_distance_km * (1.0 + tol));
            for &start in &starts {
                for cycle in
                    circuit::find_circuits(g, start, min_mm, max_mm, MAX_CIRCUITS_PER_START)
                {
                    if let Some(rec) = recommendation_from_arcs(
                        g, ws, config, pattern, tolerance_pct, start, &cycle.arcs, false,
                    ) {
                        candidates.push(rec);
                    }
                }
            }
        }
        RouteShape::PointToPoint => {
            path_candidates(
                g,
                ws,
                config,
                pattern,
                tolerance_pct,
                &starts,
                pattern.target_distance_km,
                tol,
                false,
                &mut candidates,
            );
        }
        RouteShape::OutAndBack => {
            // Half-distance paths, retraced.
            path_candidates(
                g,
                ws,
                config,
                pattern,
                tolerance_pct,
                &starts,
                pattern.target_distance_km / 2.0,
                tol,
                true,
                &mut candidates,
            );
        }
    }

    rank_and_dedupe(candidates, config)
}

#[allow(clippy::too_many_arguments)]
fn path_candidates(
    g: &RouteGraph,
    ws: &Workspace,
    config: &Config,
    pattern: &RoutePattern,
    tolerance_pct: f64,
    starts: &[VertexId],
    leg_target_km: f64,
    tol: f64,
    out_and_back: bool,
    candidates: &mut Vec<RouteRecommendation>,
) {
    let min_mm = km_to_mm(leg_target_km * (1.0 - tol));
    let max_mm = km_to_mm(leg_target_km * (1.0 + tol));

    for &start in starts {
        let dist = shortest_distances(g, start);
        let mut targets: Vec<VertexId> = (0..g.vertex_count())
            .map(VertexId::from_index)
            .filter(|v| *v != start && dist[v.index()] >= min_mm && dist[v.index()] <= max_mm)
            .collect();
        targets.truncate(MAX_TARGETS_PER_START);

        for target in targets {
            for path in k_shortest_paths(g, start, target, config.routing.k_shortest_paths) {
                if path.length_mm < min_mm || path.length_mm > max_mm {
                    continue;
                }
                if let Some(rec) = recommendation_from_arcs(
                    g,
                    ws,
                    config,
                    pattern,
                    tolerance_pct,
                    start,
                    &path.arcs,
                    out_and_back,
                ) {
                    candidates.push(rec);
                }
            }
        }
    }
}

/// Preferred route starts: snapped trailheads when enabled, else decision
/// vertices (endpoints and junctions), ascending by id.
fn start_candidates(g: &RouteGraph, config: &Config) -> Vec<VertexId> {
    if config.trailheads.enabled && !config.trailheads.coordinates.is_empty() {
        let mut snapped: Vec<VertexId> = config
            .trailheads
            .coordinates
            .iter()
            .filter_map(|c| {
                g.snap_vertex(
                    geo::Coord { x: c.lng, y: c.lat },
                    config.trailheads.max_snap_distance_m,
                )
            })
            .collect();
        snapped.sort_unstable();
        snapped.dedup();
        if !snapped.is_empty() {
            return snapped;
        }
        log::warn!("no trailhead snapped to a vertex; falling back to decision vertices");
    }

    let mut starts: Vec<VertexId> = (0..g.vertex_count())
        .map(VertexId::from_index)
        .filter(|v| g.vertex_degree[v.index()] != 2)
        .collect();
    if starts.is_empty() {
        // Pure ring networks have no decision vertices.
        starts = (0..g.vertex_count()).map(VertexId::from_index).collect();
    }
    starts.truncate(MAX_START_CANDIDATES);
    starts
}

// ── Candidate → recommendation ────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn recommendation_from_arcs(
    g: &RouteGraph,
    ws: &Workspace,
    config: &Config,
    pattern: &RoutePattern,
    tolerance_pct: f64,
    start: VertexId,
    arcs: &[u32],
    out_and_back: bool,
) -> Option<RouteRecommendation> {
    if arcs.is_empty() {
        return None;
    }

    let mut vertex_ids = g.path_vertices(start, arcs);
    let mut edge_ids: Vec<EdgeId> = arcs.iter().map(|&a| g.arc_edge[a as usize]).collect();
    let mut distance_km = g.path_length_mm(arcs) as f64 / 1e6;
    let mut gain_m = g.path_gain_m(arcs);

    // Oriented member geometries, in traversal order.
    let mut oriented: Vec<LineString<f64>> = arcs
        .iter()
        .map(|&a| oriented_geom(g, ws, a))
        .collect();

    if out_and_back {
        // Retrace: reversed arcs in reverse order.
        let back_vertices: Vec<VertexId> = vertex_ids.iter().rev().skip(1).copied().collect();
        vertex_ids.extend(back_vertices);
        let back_edges: Vec<EdgeId> = edge_ids.iter().rev().copied().collect();
        edge_ids.extend(back_edges);
        distance_km *= 2.0;
        // The return leg climbs what the outbound lost.
        gain_m += arcs
            .iter()
            .map(|&a| {
                let e = &ws.edges[g.arc_edge[a as usize].index()];
                e.elevation_gain + e.elevation_loss - g.arc_gain_m[a as usize]
            })
            .sum::<f64>();
        let back_geoms: Vec<LineString<f64>> = oriented
            .iter()
            .rev()
            .map(|l| LineString::new(l.0.iter().rev().copied().collect()))
            .collect();
        oriented.extend(back_geoms);
    }

    let geom = match line_merge(&oriented) {
        Ok(g) => g,
        Err(e) => {
            log::debug!("dropping route candidate: {e}");
            return None;
        }
    };

    let shape = classify(&vertex_ids, &edge_ids);
    let facts = RouteFacts { distance_km, elevation_gain_m: gain_m, shape };
    let score = total_cost(&config.cost, pattern, &facts);
    if score > config.routing.min_route_score {
        return None;
    }

    // Constituent trail names in traversal order, for naming and counting.
    let mut names: Vec<String> = Vec::new();
    let mut uuids: FxHashSet<String> = FxHashSet::default();
    for id in &edge_ids {
        let e = &ws.edges[id.index()];
        if e.composition.is_empty() {
            if let (Some(u), Some(n)) = (&e.trail_uuid, &e.trail_name) {
                uuids.insert(u.clone());
                names.push(n.clone());
            }
            continue;
        }
        for seg in &e.composition {
            uuids.insert(seg.trail_uuid.clone());
            names.push(seg.trail_name.clone());
        }
    }

    Some(RouteRecommendation {
        uuid: Uuid::new_v4().to_string(),
        region: ws.region.clone(),
        pattern_name: pattern.pattern_name.clone(),
        input_distance_km: pattern.target_distance_km,
        input_elevation_gain: pattern.target_elevation_gain,
        distance_km,
        elevation_gain: gain_m,
        shape,
        name: route_name(&names, shape),
        edge_ids,
        vertex_ids,
        score,
        geom,
        tolerance_percent_used: tolerance_pct,
        trail_count: uuids.len(),
    })
}

/// Geometry of an arc's edge, oriented along the arc's direction.
fn oriented_geom(g: &RouteGraph, ws: &Workspace, arc: u32) -> LineString<f64> {
    let e = &ws.edges[g.arc_edge[arc as usize].index()];
    let forward = g.arc_from[arc as usize] == e.source;
    if forward {
        e.geom.clone()
    } else {
        LineString::new(e.geom.0.iter().rev().copied().collect())
    }
}

// ── Ranking & dedup ───────────────────────────────────────────────────────────

/// Sort ascending by cost, drop near-duplicates by edge overlap, keep at
/// most `max_routes_per_bin` routes per distance/elevation bin, and cap the
/// total at `max_routes_per_pattern`.
fn rank_and_dedupe(
    mut candidates: Vec<RouteRecommendation>,
    config: &Config,
) -> Vec<RouteRecommendation> {
    candidates.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.edge_ids.cmp(&b.edge_ids))
    });

    let mut kept: Vec<RouteRecommendation> = Vec::new();
    let mut bin_counts: FxHashMap<(i64, i64), usize> = FxHashMap::default();
    for candidate in candidates {
        if kept.len() >= config.routing.max_routes_per_pattern {
            break;
        }
        let duplicate = kept
            .iter()
            .any(|k| edge_overlap_ratio(&k.edge_ids, &candidate.edge_ids)
                > config.routing.max_edge_overlap_ratio);
        if duplicate {
            continue;
        }
        let count = bin_counts.entry(result_bin(&candidate)).or_insert(0);
        if *count >= config.routing.max_routes_per_bin {
            continue; // this bin is already saturated with cheaper routes
        }
        *count += 1;
        kept.push(candidate);
    }
    kept
}

/// Result bin of a route: half-kilometer distance buckets crossed with
/// 100 m elevation-gain buckets, so a bin holds routes a user would read
/// as interchangeable.
fn result_bin(r: &RouteRecommendation) -> (i64, i64) {
    ((r.distance_km * 2.0).floor() as i64, (r.elevation_gain / 100.0).floor() as i64)
}

/// Shared distinct edges over the smaller route's distinct edge count.
fn edge_overlap_ratio(a: &[EdgeId], b: &[EdgeId]) -> f64 {
    let sa: FxHashSet<EdgeId> = a.iter().copied().collect();
    let sb: FxHashSet<EdgeId> = b.iter().copied().collect();
    let shared = sa.intersection(&sb).count();
    let denom = sa.len().min(sb.len());
    if denom == 0 {
        return 1.0;
    }
    shared as f64 / denom as f64
}
