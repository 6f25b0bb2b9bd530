//! Unit tests for tg-geom.
//!
//! Geometry fixtures use coordinates near the origin (1e-5 deg ≈ 1.11 m)
//! or the Boulder area, so metric expectations are easy to state.

#[cfg(test)]
mod helpers {
    use geo::{coord, Coord, LineString};

    pub fn line(points: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(points.iter().map(|(x, y)| coord! { x: *x, y: *y }).collect())
    }

    pub fn flat(points: &[(f64, f64)]) -> (LineString<f64>, Vec<f64>) {
        let l = line(points);
        let z = vec![0.0; l.0.len()];
        (l, z)
    }

    pub fn endpoints(coords: &[Coord<f64>]) -> (Coord<f64>, Coord<f64>) {
        (coords[0], *coords.last().unwrap())
    }
}

// ── Geodesic ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geodesic {
    use geo::coord;

    use crate::geodesic::*;

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 1.0 });
        // Mean-radius haversine: ~111.19 km.
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn line_length_sums_segments() {
        let l = super::helpers::line(&[(0.0, 0.0), (0.0, 0.001), (0.001, 0.001)]);
        let m = line_length_m(&l);
        let expect = haversine_m(l.0[0], l.0[1]) + haversine_m(l.0[1], l.0[2]);
        assert!((m - expect).abs() < 1e-9);
        assert!((line_length_km(&l) - m / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn meter_degree_round_trip() {
        let deg = meters_to_degrees(2.0);
        assert!((degrees_to_meters(deg) - 2.0).abs() < 1e-9);
    }
}

// ── Noding ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod noding {
    use super::helpers::flat;
    use crate::noding::node_linestrings;

    #[test]
    fn crossing_pair_splits_both() {
        let a = flat(&[(-105.30, 40.00), (-105.28, 40.00)]);
        let b = flat(&[(-105.29, 39.99), (-105.29, 40.01)]);
        let out = node_linestrings(&[a, b], 2.0);

        assert_eq!(out[0].len(), 2, "A splits at the crossing");
        assert_eq!(out[1].len(), 2, "B splits at the crossing");

        // The cut coordinate is bit-identical across all four pieces.
        let cut = *out[0][0].coords.last().unwrap();
        assert_eq!(out[0][1].coords[0], cut);
        assert_eq!(*out[1][0].coords.last().unwrap(), cut);
        assert_eq!(out[1][1].coords[0], cut);
        assert!((cut.x - -105.29).abs() < 1e-9);
        assert!((cut.y - 40.00).abs() < 1e-9);
    }

    #[test]
    fn t_intersection_splits_the_stem_only() {
        // B's endpoint lands interior to A.
        let a = flat(&[(0.0, 0.0), (0.0, 0.001)]);
        let b = flat(&[(0.0, 0.0005), (0.0005, 0.0005)]);
        let out = node_linestrings(&[a, b], 2.0);
        assert_eq!(out[0].len(), 2, "A splits at the touch point");
        assert_eq!(out[1].len(), 1, "B is untouched");
    }

    #[test]
    fn touch_at_existing_interior_vertex_still_splits() {
        // A has an explicit coordinate at the junction; B terminates there.
        let a = flat(&[(0.0, 0.0), (0.0, 0.0005), (0.0, 0.001)]);
        let b = flat(&[(0.0, 0.0005), (0.0005, 0.0005)]);
        let out = node_linestrings(&[a, b], 2.0);
        assert_eq!(out[0].len(), 2, "A splits at its interior vertex");
        assert_eq!(out[0][0].coords.last(), out[0][1].coords.first());
    }

    #[test]
    fn self_intersection_is_noded() {
        // A figure that crosses itself once.
        let a = flat(&[(0.0, 0.0), (0.001, 0.001), (0.001, 0.0), (0.0, 0.001)]);
        let out = node_linestrings(std::slice::from_ref(&a), 2.0);
        // One self-crossing → the line is cut twice (once per passing).
        assert_eq!(out[0].len(), 3);
    }

    #[test]
    fn disjoint_lines_pass_through() {
        let a = flat(&[(0.0, 0.0), (0.0, 0.001)]);
        let b = flat(&[(0.01, 0.0), (0.01, 0.001)]);
        let out = node_linestrings(&[a.clone(), b], 2.0);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][0].coords, a.0 .0);
    }

    #[test]
    fn elevation_interpolated_at_cut() {
        let a = (super::helpers::line(&[(0.0, 0.0), (0.0, 0.001)]), vec![100.0, 200.0]);
        let b = flat(&[(-0.0005, 0.0005), (0.0005, 0.0005)]);
        let out = node_linestrings(&[a, b], 2.0);
        assert_eq!(out[0].len(), 2);
        let z_cut = *out[0][0].elevations.last().unwrap();
        assert!((z_cut - 150.0).abs() < 1.0, "z at midpoint cut ≈ 150, got {z_cut}");
    }

    #[test]
    fn collinear_overlap_cuts_at_boundaries() {
        // B re-traces the middle of A.
        let a = flat(&[(0.0, 0.0), (0.0, 0.003)]);
        let b = flat(&[(0.0, 0.001), (0.0, 0.002)]);
        let out = node_linestrings(&[a, b], 2.0);
        assert_eq!(out[0].len(), 3, "A cut at both overlap boundaries");
        assert_eq!(out[1].len(), 1, "B is exactly the overlap");
    }

    #[test]
    fn concatenated_pieces_reproduce_the_input() {
        let a = flat(&[(-105.30, 40.00), (-105.28, 40.00)]);
        let b = flat(&[(-105.29, 39.99), (-105.29, 40.01)]);
        let out = node_linestrings(&[a.clone(), b], 2.0);

        let mut rebuilt = out[0][0].coords.clone();
        for piece in &out[0][1..] {
            rebuilt.extend_from_slice(&piece.coords[1..]);
        }
        assert_eq!(rebuilt.first(), a.0 .0.first());
        assert_eq!(rebuilt.last(), a.0 .0.last());
    }
}

// ── Snap & projection ─────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use geo::{coord, Line};

    use super::helpers::line;
    use crate::snap::*;

    #[test]
    fn projection_parameter() {
        let seg = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.001 });
        let t = project_on_segment(&seg, coord! { x: 0.0001, y: 0.0005 });
        assert!((t - 0.5).abs() < 1e-9);
        // Beyond the end clamps.
        assert_eq!(project_on_segment(&seg, coord! { x: 0.0, y: 0.002 }), 1.0);
    }

    #[test]
    fn snap_replaces_endpoints_and_dedups() {
        let mut l = line(&[(0.0, 0.0), (0.0, 0.0005), (0.0, 0.001)]);
        snap_endpoints(
            &mut l,
            coord! { x: 0.0, y: 0.0005 }, // collapses onto the interior point
            coord! { x: 0.0, y: 0.0011 },
        );
        assert_eq!(l.0.len(), 2);
        assert_eq!(l.0[0], coord! { x: 0.0, y: 0.0005 });
        assert_eq!(l.0[1], coord! { x: 0.0, y: 0.0011 });
    }
}

// ── Line merge ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod merge {
    use super::helpers::{endpoints, line};
    use crate::{line_merge, GeomError};

    #[test]
    fn forward_chain() {
        let merged = line_merge(&[
            line(&[(0.0, 0.0), (0.0, 1.0)]),
            line(&[(0.0, 1.0), (1.0, 1.0)]),
            line(&[(1.0, 1.0), (1.0, 2.0)]),
        ])
        .unwrap();
        assert_eq!(merged.0.len(), 4);
        let (s, e) = endpoints(&merged.0);
        assert_eq!((s.x, s.y), (0.0, 0.0));
        assert_eq!((e.x, e.y), (1.0, 2.0));
    }

    #[test]
    fn members_reversed_as_needed() {
        let merged = line_merge(&[
            line(&[(0.0, 1.0), (0.0, 0.0)]), // seed flipped
            line(&[(0.0, 1.0), (1.0, 1.0)]),
            line(&[(1.0, 2.0), (1.0, 1.0)]), // member reversed
        ])
        .unwrap();
        let (s, e) = endpoints(&merged.0);
        assert_eq!((s.x, s.y), (0.0, 0.0));
        assert_eq!((e.x, e.y), (1.0, 2.0));
    }

    #[test]
    fn discontiguous_chain_fails() {
        let err = line_merge(&[
            line(&[(0.0, 0.0), (0.0, 1.0)]),
            line(&[(5.0, 5.0), (6.0, 6.0)]),
        ])
        .unwrap_err();
        assert!(matches!(err, GeomError::ChainMerge(_)));
    }

    #[test]
    fn empty_chain_fails() {
        assert!(matches!(line_merge(&[]), Err(GeomError::EmptyGeometry)));
    }
}

// ── Simplify ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod simplify {
    use super::helpers::line;
    use crate::simplify::simplify_preserve;

    #[test]
    fn short_lines_untouched() {
        let l = line(&[(0.0, 0.0), (0.0005, 0.00001), (0.001, 0.0)]);
        let s = simplify_preserve(&l, 1e-5, 10);
        assert_eq!(s.0, l.0);
    }

    #[test]
    fn noisy_line_loses_points_but_keeps_endpoints() {
        // A nearly straight line with meter-scale jitter on 20 points.
        let pts: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let y = i as f64 * 1e-4;
                let x = if i % 2 == 0 { 0.0 } else { 1e-6 };
                (x, y)
            })
            .collect();
        let l = line(&pts);
        let s = simplify_preserve(&l, 1e-4, 10);
        assert!(s.0.len() < l.0.len(), "jitter removed");
        assert_eq!(s.0.first(), l.0.first());
        assert_eq!(s.0.last(), l.0.last());
    }
}

// ── Indexes & coverage ────────────────────────────────────────────────────────

#[cfg(test)]
mod index_and_coverage {
    use geo::coord;

    use super::helpers::line;
    use crate::coverage::uncovered_length_m;
    use crate::geodesic::line_length_m;
    use crate::{PointIndex, SegmentIndex};

    #[test]
    fn point_index_nearest_and_within() {
        let idx = PointIndex::build(vec![
            (0, coord! { x: 0.0, y: 0.0 }),
            (1, coord! { x: 0.0, y: 0.00001 }), // ≈ 1.1 m north
            (2, coord! { x: 0.01, y: 0.0 }),
        ]);
        let (id, d) = idx.nearest(coord! { x: 0.0, y: 0.000001 }).unwrap();
        assert_eq!(id, 0);
        assert!(d < 0.2);

        let hits = idx.within(coord! { x: 0.0, y: 0.0 }, 2.0);
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn segment_index_nearest_within() {
        let l = line(&[(0.0, 0.0), (0.0, 0.001)]);
        let idx = SegmentIndex::build(l.lines().map(|s| (7u32, s)));
        // 1e-5 deg ≈ 1.1 m east of the line's midpoint.
        let hit = idx.nearest_within(coord! { x: 0.00001, y: 0.0005 }, 2.0);
        let (id, d) = hit.unwrap();
        assert_eq!(id, 7);
        assert!((d - 1.11).abs() < 0.1, "distance ≈ 1.11 m, got {d}");
        assert!(idx.nearest_within(coord! { x: 0.001, y: 0.0005 }, 2.0).is_none());
    }

    #[test]
    fn fully_covered_trail_has_zero_uncovered() {
        let trail = line(&[(0.0, 0.0), (0.0, 0.001)]);
        let idx = SegmentIndex::build(trail.lines().map(|s| (0u32, s)));
        assert_eq!(uncovered_length_m(&trail, &idx, 1.0), 0.0);
    }

    #[test]
    fn distant_trail_fully_uncovered() {
        let trail = line(&[(0.0, 0.0), (0.0, 0.001)]);
        let far = line(&[(0.1, 0.0), (0.1, 0.001)]);
        let idx = SegmentIndex::build(far.lines().map(|s| (0u32, s)));
        let uncov = uncovered_length_m(&trail, &idx, 1.0);
        let total = line_length_m(&trail);
        assert!((uncov - total).abs() < 0.01);
    }

    #[test]
    fn partially_covered_trail() {
        // Edges cover only the southern half of the trail.
        let trail = line(&[(0.0, 0.0), (0.0, 0.002)]);
        let south = line(&[(0.0, 0.0), (0.0, 0.001)]);
        let idx = SegmentIndex::build(south.lines().map(|s| (0u32, s)));
        let uncov = uncovered_length_m(&trail, &idx, 0.5);
        let total = line_length_m(&trail);
        assert!(uncov > total * 0.4 && uncov < total * 0.6, "≈ half uncovered, got {uncov}");
    }
}

// ── Elevation profile ─────────────────────────────────────────────────────────

#[cfg(test)]
mod profile {
    use crate::ElevationStats;

    #[test]
    fn gain_loss_split() {
        let s = ElevationStats::of(&[100.0, 150.0, 120.0, 180.0]);
        assert_eq!(s.gain, 110.0);
        assert_eq!(s.loss, 30.0);
        assert_eq!(s.max, 180.0);
        assert_eq!(s.min, 100.0);
        assert!((s.avg - 137.5).abs() < 1e-9);
    }

    #[test]
    fn empty_profile_is_zero() {
        let s = ElevationStats::of(&[]);
        assert_eq!(s.gain, 0.0);
        assert_eq!(s.loss, 0.0);
    }
}
