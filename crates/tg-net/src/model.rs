//! Edge and vertex tables of the staging workspace.
//!
//! Both tables are dense `Vec`s indexed by their typed id; every compaction
//! renumbers from zero.  Incidence is recomputed from the edge table rather
//! than maintained incrementally — each mutation pass ends with a
//! [`recompute`](crate::Workspace::recompute_degrees) so `cnt` can never
//! drift from the actual edge set.

use geo::{Coord, LineString};

use tg_core::{EdgeId, VertexId};

/// Incident edges shorter than this do not count towards vertex degree.
pub const DEGREE_MIN_EDGE_LENGTH_M: f64 = 1.0;

// ── Vertex ────────────────────────────────────────────────────────────────────

/// Vertex classification derived from degree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexClass {
    /// Degree 1 — a trail end.
    Endpoint,
    /// Degree 2 — passes traffic through; collapse target.
    Connector,
    /// Degree ≥ 3 — a junction.
    Intersection,
}

impl VertexClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VertexClass::Endpoint => "endpoint",
            VertexClass::Connector => "connector",
            VertexClass::Intersection => "intersection",
        }
    }
}

/// A point shared by one or more edges.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub coord: Coord<f64>,
    pub elevation: f64,
    /// Incident edges longer than [`DEGREE_MIN_EDGE_LENGTH_M`].
    pub cnt: u32,
    /// Original trail terminus — survives cleanup even at degree 0.
    pub terminus: bool,
}

impl Vertex {
    pub fn class(&self) -> VertexClass {
        match self.cnt {
            0 | 1 => VertexClass::Endpoint,
            2 => VertexClass::Connector,
            _ => VertexClass::Intersection,
        }
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// One constituent trail of a (possibly merged) edge, with its share of the
/// edge's length.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrailSegment {
    pub trail_uuid: String,
    pub trail_name: String,
    /// Fraction of the edge length contributed, in (0, 1].
    pub weight: f64,
}

/// A non-crossing linestring segment; the atomic unit of routing.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub geom: LineString<f64>,
    pub length_km: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    /// Elevation at the first/last coordinate, for vertex attribution.
    pub start_elevation: f64,
    pub end_elevation: f64,
    pub source: VertexId,
    pub target: VertexId,
    /// Originating trail; `None` for synthetic connector edges.
    pub trail_uuid: Option<String>,
    pub trail_name: Option<String>,
    /// True for connector edges inserted by gap bridging / spanning.
    pub connector: bool,
    /// Constituent trails of a merged chain, ordered along the geometry.
    pub composition: Vec<TrailSegment>,
}

impl Edge {
    /// First and last coordinate of the geometry.
    pub fn endpoints(&self) -> (Coord<f64>, Coord<f64>) {
        (self.geom.0[0], *self.geom.0.last().expect("edge geometry is never empty"))
    }

    pub fn length_m(&self) -> f64 {
        self.length_km * 1000.0
    }

    /// Degenerate: fewer than two distinct coordinates, zero length, or a
    /// self-loop after binding.
    pub fn is_degenerate(&self) -> bool {
        if self.geom.0.len() < 2 {
            return true;
        }
        if !self.geom.0.iter().any(|c| *c != self.geom.0[0]) {
            return true;
        }
        if self.length_km <= 0.0 {
            return true;
        }
        self.source.is_valid() && self.source == self.target
    }

    /// Recompute geodesic length from the geometry.
    pub fn recompute_length(&mut self) {
        self.length_km = tg_geom::line_length_km(&self.geom);
    }
}
