//! Planar noding: split every linestring at every crossing.
//!
//! The input is the full trail corpus; the output replaces each linestring
//! with the ordered pieces produced by cutting it wherever it crosses
//! another line (or itself, for non-simple geometries).  Guarantees:
//!
//! - every piece has ≥ 2 distinct coordinates;
//! - pieces of one input, concatenated, reproduce the input exactly;
//! - a crossing point appears **bit-identically** in every line passing
//!   through it (the intersection is computed once per segment pair and the
//!   same coordinate is inserted on both sides), so vertex synthesis can
//!   collapse endpoints by exact equality;
//! - elevations are carried through by linear interpolation at each cut.
//!
//! Cuts happen at exact geometric intersections; the configured tolerance
//! only widens the candidate envelope.  Sub-tolerance *gaps* (near misses)
//! are not noding's job — bridging and vertex reconciliation close them.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString};
use rustc_hash::FxHashMap;

use crate::geodesic::haversine_m;
use crate::index::SegmentIndex;
use crate::snap::project_on_segment;

/// Cut points closer than this to a segment endpoint are treated as landing
/// on the endpoint itself (1 mm).
const ENDPOINT_EPS_M: f64 = 1e-3;

/// One noded piece of an input linestring, with aligned elevations.
#[derive(Debug, Clone)]
pub struct NodedPiece {
    pub coords: Vec<Coord<f64>>,
    pub elevations: Vec<f64>,
}

impl NodedPiece {
    pub fn line_string(&self) -> LineString<f64> {
        LineString::new(self.coords.clone())
    }
}

/// A pending cut on one segment of one input line.
#[derive(Debug, Clone, Copy)]
struct Cut {
    /// Parameter along the segment, 0 = segment start.
    t: f64,
    point: Coord<f64>,
}

/// Split every input at every crossing with any other input or with itself.
///
/// `inputs` pairs each 2D linestring with an elevation array of equal
/// length (all-zero when the source had no 3D data).  `tolerance_m` widens
/// the candidate search envelope only.
///
/// Output: one `Vec<NodedPiece>` per input, in input order.
pub fn node_linestrings(
    inputs: &[(LineString<f64>, Vec<f64>)],
    tolerance_m: f64,
) -> Vec<Vec<NodedPiece>> {
    // ── Collect every segment of every line ───────────────────────────────
    struct SegRef {
        line: usize,
        seg: usize,
        geom: Line<f64>,
    }

    let mut segments: Vec<SegRef> = Vec::new();
    for (li, (line, _)) in inputs.iter().enumerate() {
        for (si, seg) in line.lines().enumerate() {
            if seg.start == seg.end {
                continue; // zero-length segment contributes no crossings
            }
            segments.push(SegRef { line: li, seg: si, geom: seg });
        }
    }

    let index =
        SegmentIndex::build(segments.iter().enumerate().map(|(i, s)| (i as u32, s.geom)));

    // ── Find all cuts, one intersection computation per segment pair ──────
    let mut cuts: FxHashMap<(usize, usize), Vec<Cut>> = FxHashMap::default();
    let radius_m = tolerance_m.max(ENDPOINT_EPS_M);

    for (i, a) in segments.iter().enumerate() {
        for j in index.candidates_overlapping(&a.geom, radius_m) {
            let j = j as usize;
            if j <= i {
                continue; // each unordered pair handled once
            }
            let b = &segments[j];
            if a.line == b.line && !self_pair_eligible(&inputs[a.line].0, a.seg, b.seg) {
                continue;
            }

            match line_intersection(a.geom, b.geom) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    record_cut(&mut cuts, inputs, a.line, a.seg, &a.geom, intersection);
                    record_cut(&mut cuts, inputs, b.line, b.seg, &b.geom, intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    // Coincident stretch: cut both lines at the overlap
                    // boundaries so the shared portion becomes duplicate
                    // edges (deduplication keeps one later).
                    for p in [intersection.start, intersection.end] {
                        record_cut(&mut cuts, inputs, a.line, a.seg, &a.geom, p);
                        record_cut(&mut cuts, inputs, b.line, b.seg, &b.geom, p);
                    }
                }
                None => {}
            }
        }
    }

    // ── Rebuild each input from its cuts ──────────────────────────────────
    inputs
        .iter()
        .enumerate()
        .map(|(li, (line, elevations))| rebuild(li, line, elevations, &mut cuts))
        .collect()
}

/// Whether two segments of the same line may interact: only non-adjacent
/// pairs (adjacent segments always share a vertex), and for a closed ring
/// the first/last pair is adjacent too.
fn self_pair_eligible(line: &LineString<f64>, a: usize, b: usize) -> bool {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if hi - lo <= 1 {
        return false;
    }
    let n_segs = line.0.len().saturating_sub(1);
    let closed = line.0.first() == line.0.last();
    !(closed && lo == 0 && hi == n_segs - 1)
}

/// Record a cut of `point` on segment `(line, seg)` when the point is
/// interior to the segment, or lands on an *interior vertex* of the whole
/// line (a crossing through an existing coordinate still splits the line).
fn record_cut(
    cuts: &mut FxHashMap<(usize, usize), Vec<Cut>>,
    inputs: &[(LineString<f64>, Vec<f64>)],
    line: usize,
    seg: usize,
    geom: &Line<f64>,
    point: Coord<f64>,
) {
    let d_start = haversine_m(point, geom.start);
    let d_end = haversine_m(point, geom.end);

    if d_start > ENDPOINT_EPS_M && d_end > ENDPOINT_EPS_M {
        // Interior of the segment: a genuine new cut coordinate.
        let t = project_on_segment(geom, point);
        cuts.entry((line, seg)).or_default().push(Cut { t, point });
        return;
    }

    // On a segment endpoint.  That vertex splits the line only when it is
    // interior to the whole linestring (think a T-junction landing exactly
    // on an existing coordinate).
    let n_coords = inputs[line].0 .0.len();
    let vertex_idx = if d_start <= d_end { seg } else { seg + 1 };
    if vertex_idx == 0 || vertex_idx == n_coords - 1 {
        return; // line terminus; vertex synthesis already sees it
    }
    let vertex = inputs[line].0 .0[vertex_idx];
    let t = if vertex_idx == seg { 0.0 } else { 1.0 };
    cuts.entry((line, seg)).or_default().push(Cut { t, point: vertex });
}

/// Split one line at its recorded cuts, interpolating elevations.
fn rebuild(
    line_idx: usize,
    line: &LineString<f64>,
    elevations: &[f64],
    cuts: &mut FxHashMap<(usize, usize), Vec<Cut>>,
) -> Vec<NodedPiece> {
    let coords = &line.0;
    if coords.len() < 2 {
        return Vec::new();
    }
    let z = |i: usize| elevations.get(i).copied().unwrap_or(0.0);

    let mut pieces: Vec<NodedPiece> = Vec::new();
    let mut cur_c: Vec<Coord<f64>> = vec![coords[0]];
    let mut cur_z: Vec<f64> = vec![z(0)];

    for si in 0..coords.len() - 1 {
        let (za, zb) = (z(si), z(si + 1));

        if let Some(mut seg_cuts) = cuts.remove(&(line_idx, si)) {
            seg_cuts.sort_by(|a, b| {
                a.t.partial_cmp(&b.t)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.point.x.partial_cmp(&b.point.x).unwrap_or(std::cmp::Ordering::Equal))
                    .then_with(|| a.point.y.partial_cmp(&b.point.y).unwrap_or(std::cmp::Ordering::Equal))
            });
            seg_cuts.dedup_by(|a, b| a.point == b.point);

            for cut in seg_cuts {
                let last = *cur_c.last().expect("current piece never empty");
                let zc = za + cut.t * (zb - za);
                if cut.point == last {
                    // Cut at the piece's current end (interior-vertex cut at
                    // t = 0): break here without inserting a new coordinate.
                    if cur_c.len() >= 2 {
                        close_piece(&mut pieces, &mut cur_c, &mut cur_z);
                        cur_c.push(cut.point);
                        cur_z.push(zc);
                    }
                    continue;
                }
                cur_c.push(cut.point);
                cur_z.push(zc);
                close_piece(&mut pieces, &mut cur_c, &mut cur_z);
                cur_c.push(cut.point);
                cur_z.push(zc);
            }
        }

        let end = coords[si + 1];
        if *cur_c.last().expect("current piece never empty") != end {
            cur_c.push(end);
            cur_z.push(zb);
        }
    }

    if cur_c.len() >= 2 {
        close_piece(&mut pieces, &mut cur_c, &mut cur_z);
    }

    // Drop pieces without two distinct coordinates.
    pieces.retain(|p| p.coords.iter().any(|c| *c != p.coords[0]));
    pieces
}

fn close_piece(pieces: &mut Vec<NodedPiece>, cur_c: &mut Vec<Coord<f64>>, cur_z: &mut Vec<f64>) {
    if cur_c.len() >= 2 {
        pieces.push(NodedPiece { coords: std::mem::take(cur_c), elevations: std::mem::take(cur_z) });
    } else {
        cur_c.clear();
        cur_z.clear();
    }
}
