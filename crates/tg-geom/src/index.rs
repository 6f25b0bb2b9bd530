//! R-tree indexes with metric query helpers.
//!
//! Two flavours: [`PointIndex`] over tagged coordinates (vertex lookup,
//! KNN merge) and [`SegmentIndex`] over tagged line segments (noding
//! candidates, coverage tests).
//!
//! Nearest-neighbour ranking happens in raw degree space — squared
//! lat/lng distance.  That under-weights longitude by cos(lat), which is
//! irrelevant for the tolerance gates (every hit is re-verified with
//! haversine) and only matters for ranking when two candidates are nearly
//! equidistant, where either answer is acceptable.

use geo::{Coord, Line};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geodesic::{haversine_m, meters_to_degrees};
use crate::snap::nearest_point_on_segment;

// ── Point index ───────────────────────────────────────────────────────────────

#[derive(Clone)]
struct PointEntry {
    point: [f64; 2],
    id: u32,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Bulk-loaded R-tree over `(id, coord)` pairs.
pub struct PointIndex {
    rtree: RTree<PointEntry>,
}

impl PointIndex {
    /// Bulk-load from `(id, coord)` pairs — O(n log n), much faster than
    /// repeated insertion.
    pub fn build(points: impl IntoIterator<Item = (u32, Coord<f64>)>) -> Self {
        let entries: Vec<PointEntry> = points
            .into_iter()
            .map(|(id, c)| PointEntry { point: [c.x, c.y], id })
            .collect();
        Self { rtree: RTree::bulk_load(entries) }
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Nearest entry to `c` with its haversine distance in meters.
    pub fn nearest(&self, c: Coord<f64>) -> Option<(u32, f64)> {
        self.rtree
            .nearest_neighbor(&[c.x, c.y])
            .map(|e| (e.id, haversine_m(c, Coord { x: e.point[0], y: e.point[1] })))
    }

    /// All entry ids within `radius_m` of `c` (haversine-verified),
    /// ascending by id for determinism.
    pub fn within(&self, c: Coord<f64>, radius_m: f64) -> Vec<u32> {
        let r_deg = meters_to_degrees(radius_m) * 1.5; // margin for lat skew
        let env = AABB::from_corners([c.x - r_deg, c.y - r_deg], [c.x + r_deg, c.y + r_deg]);
        let mut hits: Vec<u32> = self
            .rtree
            .locate_in_envelope_intersecting(&env)
            .filter(|e| haversine_m(c, Coord { x: e.point[0], y: e.point[1] }) <= radius_m)
            .map(|e| e.id)
            .collect();
        hits.sort_unstable();
        hits
    }
}

// ── Segment index ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct SegEntry {
    seg: Line<f64>,
    id: u32,
}

impl RTreeObject for SegEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.seg.start.x.min(self.seg.end.x), self.seg.start.y.min(self.seg.end.y)],
            [self.seg.start.x.max(self.seg.end.x), self.seg.start.y.max(self.seg.end.y)],
        )
    }
}

/// Bulk-loaded R-tree over `(id, segment)` pairs.  The id tags the owning
/// edge or trail; one owner contributes many segments.
pub struct SegmentIndex {
    rtree: RTree<SegEntry>,
}

impl SegmentIndex {
    pub fn build(segments: impl IntoIterator<Item = (u32, Line<f64>)>) -> Self {
        let entries: Vec<SegEntry> =
            segments.into_iter().map(|(id, seg)| SegEntry { seg, id }).collect();
        Self { rtree: RTree::bulk_load(entries) }
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Haversine distance from `c` to the nearest indexed segment within
    /// `radius_m`, with the owner id.  `None` when nothing is that close.
    pub fn nearest_within(&self, c: Coord<f64>, radius_m: f64) -> Option<(u32, f64)> {
        let r_deg = meters_to_degrees(radius_m) * 1.5;
        let env = AABB::from_corners([c.x - r_deg, c.y - r_deg], [c.x + r_deg, c.y + r_deg]);

        let mut best: Option<(u32, f64)> = None;
        for e in self.rtree.locate_in_envelope_intersecting(&env) {
            let p = nearest_point_on_segment(&e.seg, c);
            let d = haversine_m(c, p);
            if d <= radius_m && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((e.id, d));
            }
        }
        best
    }

    /// Owner ids of all segments whose envelope comes within `radius_m` of
    /// `c`, ascending and deduplicated.
    pub fn candidates_near(&self, c: Coord<f64>, radius_m: f64) -> Vec<u32> {
        let r_deg = meters_to_degrees(radius_m) * 1.5;
        let env = AABB::from_corners([c.x - r_deg, c.y - r_deg], [c.x + r_deg, c.y + r_deg]);
        let mut ids: Vec<u32> =
            self.rtree.locate_in_envelope_intersecting(&env).map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Owner ids of all segments whose envelope intersects `seg`'s envelope
    /// expanded by `radius_m`, ascending and deduplicated.
    pub fn candidates_overlapping(&self, seg: &Line<f64>, radius_m: f64) -> Vec<u32> {
        let r_deg = meters_to_degrees(radius_m) * 1.5;
        let env = AABB::from_corners(
            [seg.start.x.min(seg.end.x) - r_deg, seg.start.y.min(seg.end.y) - r_deg],
            [seg.start.x.max(seg.end.x) + r_deg, seg.start.y.max(seg.end.y) + r_deg],
        );
        let mut ids: Vec<u32> =
            self.rtree.locate_in_envelope_intersecting(&env).map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
