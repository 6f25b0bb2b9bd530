//! Point-on-segment projection and endpoint snapping.

use geo::{Coord, Line, LineString};

/// Parameter `t ∈ [0, 1]` of the point on `seg` closest to `p`, computed in
/// degree space with the longitude axis scaled by cos(lat) so the projection
/// is metrically faithful at small scales.
pub fn project_on_segment(seg: &Line<f64>, p: Coord<f64>) -> f64 {
    let lat_scale = (seg.start.y.to_radians().cos()).max(1e-6);
    let dx = (seg.end.x - seg.start.x) * lat_scale;
    let dy = seg.end.y - seg.start.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return 0.0;
    }
    let px = (p.x - seg.start.x) * lat_scale;
    let py = p.y - seg.start.y;
    ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
}

/// The point on `seg` closest to `p`.
pub fn nearest_point_on_segment(seg: &Line<f64>, p: Coord<f64>) -> Coord<f64> {
    let t = project_on_segment(seg, p);
    point_at(seg, t)
}

/// Linear interpolation along a segment.
#[inline]
pub fn point_at(seg: &Line<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: seg.start.x + t * (seg.end.x - seg.start.x),
        y: seg.start.y + t * (seg.end.y - seg.start.y),
    }
}

/// Replace the first and last coordinate of `line` so the geometry ends
/// exactly on its bound vertices.  No-op for coordinates already equal.
pub fn snap_endpoints(line: &mut LineString<f64>, start: Coord<f64>, end: Coord<f64>) {
    if let Some(first) = line.0.first_mut() {
        *first = start;
    }
    if let Some(last) = line.0.last_mut() {
        *last = end;
    }
    dedup_consecutive(line);
}

/// Remove consecutive duplicate coordinates (snapping can collapse the
/// first interior point onto the new endpoint).
pub fn dedup_consecutive(line: &mut LineString<f64>) {
    line.0.dedup();
}
