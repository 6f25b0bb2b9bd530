//! Topology-preserving simplification.
//!
//! Visvalingam-Whyatt with topology preservation (`geo`'s
//! `SimplifyVwPreserve`) — unlike plain Douglas-Peucker it cannot create
//! self-intersections, which matters because simplification runs *after*
//! planar noding and must not reintroduce crossings.

use geo::{LineString, SimplifyVwPreserve};

/// Simplify `line` with `epsilon_deg` (degrees²-scale areal tolerance for
/// VW), but only when it has more than `min_points` coordinates.  The first
/// and last coordinate are always preserved, so vertex bindings survive.
pub fn simplify_preserve(
    line: &LineString<f64>,
    epsilon_deg: f64,
    min_points: usize,
) -> LineString<f64> {
    if line.0.len() <= min_points {
        return line.clone();
    }
    // VW epsilon is an area; squaring the linear tolerance keeps the two
    // knobs on comparable scales.
    let simplified = line.simplify_vw_preserve(&(epsilon_deg * epsilon_deg));
    if simplified.0.len() < 2 {
        return line.clone();
    }
    simplified
}
