//! Stage 3 — planar noding.
//!
//! Every trail linestring is split at every crossing with any other trail
//! and at its own self-intersections; the resulting non-crossing pieces
//! become the initial edge table.  Pieces inherit the originating trail's
//! identity; metric attributes are recomputed per piece (in parallel — the
//! pieces are independent — then kept in deterministic trail order).

use rayon::prelude::*;
use serde::Serialize;

use tg_core::EdgeId;
use tg_geom::{line_length_km, node_linestrings, ElevationStats, NodedPiece};

use crate::model::{Edge, TrailSegment};
use crate::{NetResult, Workspace};

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodingStats {
    pub input_trails: usize,
    pub output_edges: usize,
    pub dropped_pieces: usize,
}

/// Node the trail corpus and populate the edge table.
pub fn node_trails(ws: &mut Workspace, intersection_tolerance_m: f64) -> NetResult<NodingStats> {
    let mut stats = NodingStats { input_trails: ws.trails.len(), ..Default::default() };

    let inputs: Vec<_> = ws
        .trails
        .iter()
        .map(|t| (t.geom.clone(), t.elevations.clone()))
        .collect();

    let noded = node_linestrings(&inputs, intersection_tolerance_m);
    let total_pieces: usize = noded.iter().map(|p| p.len()).sum();

    // Piece → edge conversion is independent per (trail, piece); rayon keeps
    // the nested order, so edge ids remain deterministic.
    let edges: Vec<Edge> = noded
        .into_par_iter()
        .zip(ws.trails.par_iter())
        .flat_map(|(pieces, trail)| {
            pieces
                .into_par_iter()
                .filter_map(|piece| piece_to_edge(piece, trail))
                .collect::<Vec<_>>()
        })
        .collect();

    stats.dropped_pieces = total_pieces - edges.len();
    ws.edges = edges;
    for (i, e) in ws.edges.iter_mut().enumerate() {
        e.id = EdgeId(i as u32);
    }
    stats.output_edges = ws.edges.len();

    log::info!(
        "noding: {} trails → {} non-crossing edges",
        stats.input_trails,
        stats.output_edges
    );
    Ok(stats)
}

fn piece_to_edge(piece: NodedPiece, trail: &tg_core::Trail) -> Option<Edge> {
    let geom = piece.line_string();
    if geom.0.len() < 2 || !geom.0.iter().any(|c| *c != geom.0[0]) {
        return None;
    }
    let length_km = line_length_km(&geom);
    if length_km <= 0.0 {
        return None;
    }
    let ele = ElevationStats::of(&piece.elevations);
    let start_elevation = piece.elevations.first().copied().unwrap_or(0.0);
    let end_elevation = piece.elevations.last().copied().unwrap_or(0.0);

    Some(Edge {
        id: EdgeId::INVALID,
        geom,
        length_km,
        elevation_gain: ele.gain,
        elevation_loss: ele.loss,
        start_elevation,
        end_elevation,
        source: Default::default(),
        target: Default::default(),
        trail_uuid: Some(trail.uuid.clone()),
        trail_name: Some(trail.name.clone()),
        connector: trail.connector,
        composition: vec![TrailSegment {
            trail_uuid: trail.uuid.clone(),
            trail_name: trail.name.clone(),
            weight: 1.0,
        }],
    })
}
